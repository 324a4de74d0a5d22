/*!
 * Content file parsing
 *
 * A content file carries the text of many files, one block per file:
 *
 * ```text
 * --- START OF FILE src/app.py ---
 * <startwolf>
 * print("hi")
 * <endwolf>
 * --- END OF FILE src/app.py ---
 * ```
 *
 * Parsing is tolerant: unbalanced markers are logged and recovered from.
 */

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::ContentMarkers;
use crate::types::Node;
use crate::utils::normalize_rel_path;

static START_OF_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*---\s*start\s+of\s+file\s+(.+?)\s*---\s*$")
        .expect("valid start marker regex")
});

static END_OF_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*---\s*end\s+of\s+file\s+(.+?)\s*---\s*$")
        .expect("valid end marker regex")
});

/// File contents keyed by forward-slash relative path
pub type ContentBlocks = BTreeMap<String, String>;

/// Position inside the current block
#[derive(Debug)]
enum BlockState {
    /// Between blocks
    Outside,
    /// START seen, waiting for the start sentinel
    AwaitingPayload { path: String },
    /// Inside the sentinels
    Capturing { path: String, lines: Vec<String> },
    /// End sentinel seen, waiting for END
    AwaitingEnd { path: String, lines: Vec<String> },
}

/// Parser for content files
#[derive(Debug, Clone, Default)]
pub struct ContentFileParser {
    markers: ContentMarkers,
}

impl ContentFileParser {
    /// Create a new parser using the given sentinels
    pub fn new(markers: ContentMarkers) -> Self {
        Self { markers }
    }

    /// Parse content file lines into a path → content mapping
    pub fn parse<I, S>(&self, lines: I) -> ContentBlocks
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut blocks = ContentBlocks::new();
        let mut state = BlockState::Outside;

        for line in lines {
            let line = line.as_ref().trim_end_matches(&['\n', '\r'][..]);
            state = self.step(state, line, &mut blocks);
        }

        match state {
            BlockState::Outside => {}
            BlockState::AwaitingPayload { path } => {
                warn!(path = %path, "Content block has no payload before end of input");
            }
            BlockState::Capturing { path, lines } | BlockState::AwaitingEnd { path, lines } => {
                warn!(path = %path, "Content block not closed before end of input; keeping captured text");
                store(&mut blocks, path, lines);
            }
        }

        blocks
    }

    fn step(&self, state: BlockState, line: &str, blocks: &mut ContentBlocks) -> BlockState {
        if let Some(path) = capture_path(&START_OF_FILE, line) {
            match state {
                BlockState::Outside => {}
                BlockState::AwaitingPayload { path: open } => {
                    warn!(open = %open, next = %path, "New block started before END; previous block had no payload");
                }
                BlockState::Capturing { path: open, lines }
                | BlockState::AwaitingEnd { path: open, lines } => {
                    warn!(open = %open, next = %path, "New block started before END; closing previous block");
                    store(blocks, open, lines);
                }
            }
            return BlockState::AwaitingPayload { path };
        }

        if let Some(path) = capture_path(&END_OF_FILE, line) {
            match state {
                BlockState::Outside => {
                    warn!(path = %path, "END marker without an open block; ignoring");
                }
                BlockState::AwaitingPayload { path: open } => {
                    warn!(path = %open, "Content block closed without a payload");
                }
                BlockState::Capturing { path: open, lines }
                | BlockState::AwaitingEnd { path: open, lines } => {
                    if open != path {
                        warn!(open = %open, end = %path, "END marker names a different file; closing open block");
                    }
                    store(blocks, open, lines);
                }
            }
            return BlockState::Outside;
        }

        let trimmed = line.trim();
        match state {
            BlockState::AwaitingPayload { path } if trimmed == self.markers.start.trim() => {
                BlockState::Capturing {
                    path,
                    lines: Vec::new(),
                }
            }
            BlockState::Capturing { path, lines } if trimmed == self.markers.end.trim() => {
                BlockState::AwaitingEnd { path, lines }
            }
            BlockState::Capturing { path, mut lines } => {
                lines.push(line.to_string());
                BlockState::Capturing { path, lines }
            }
            other => {
                if !trimmed.is_empty() {
                    debug!(line = %trimmed, "Dropping line outside a content payload");
                }
                other
            }
        }
    }
}

fn capture_path(pattern: &Regex, line: &str) -> Option<String> {
    pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| normalize_rel_path(m.as_str()))
}

fn store(blocks: &mut ContentBlocks, path: String, lines: Vec<String>) {
    let content = lines.join("\n");
    if blocks.insert(path.clone(), content).is_some() {
        warn!(path = %path, "Duplicate content block; later block wins");
    } else {
        debug!(path = %path, "Parsed content block");
    }
}

/// Overwrite file contents in a parsed tree with blocks from a content file.
///
/// Files are matched by their path from the synthetic root. When the tree
/// has a single top-level directory, paths relative to that directory match
/// as well. External content always replaces embedded content. Returns the
/// number of files updated.
pub fn apply_content_blocks(root: &mut Node, blocks: &ContentBlocks) -> usize {
    let single_top = match root.children.as_slice() {
        [only] if only.is_directory() => Some(format!("{}/", only.name)),
        _ => None,
    };

    let mut used = std::collections::BTreeSet::new();
    let mut applied = 0;

    root.for_each_file_mut(&mut |path, node| {
        let key = blocks.get_key_value(path).or_else(|| {
            single_top
                .as_deref()
                .and_then(|prefix| path.strip_prefix(prefix))
                .and_then(|rel| blocks.get_key_value(rel))
        });

        if let Some((key, content)) = key {
            node.set_content(content.clone());
            used.insert(key.clone());
            applied += 1;
            debug!(path = %path, "Applied external content");
        }
    });

    for key in blocks.keys().filter(|k| !used.contains(*k)) {
        warn!(path = %key, "Content block has no matching file in the structure");
    }
    info!(applied, blocks = blocks.len(), "Applied content blocks");

    applied
}
