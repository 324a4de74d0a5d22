/*!
 * Structure text parsing
 *
 * Reads an indented listing (optionally drawn with tree glyphs) into a
 * [`Node`] tree. Files may be followed by more deeply indented lines, which
 * are captured as that file's content. Malformed indentation never fails;
 * entries are attached to the nearest shallower directory.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::config::{Config, IgnoreRules};
use crate::sanitizer::NameSanitizer;
use crate::types::{EntryKind, Node};

/// Box-drawing characters stripped from the leading part of a line
pub const TREE_GLYPHS: &[char] = &['│', '├', '└', '─'];

/// Trailing marker of a directory entry
pub const DIRECTORY_INDICATOR: char = '/';

/// Character whose presence suggests a file entry
pub const FILE_INDICATOR: char = '.';

/// Prefix of glob-style entries, which are never directories
pub const GLOB_MARKER: &str = "**";

/// Indentation counted for a tab in the leading part of a line
const TAB_WIDTH: usize = 4;

static CONTENTS_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Contents of (.+?):\s*$").expect("valid contents marker regex"));

/// Decides whether a label names a directory or a file
pub trait EntryClassifier {
    fn classify(&self, name: &str) -> EntryKind;
}

impl<F> EntryClassifier for F
where
    F: Fn(&str) -> EntryKind,
{
    fn classify(&self, name: &str) -> EntryKind {
        self(name)
    }
}

/// Directory when the label ends with `/`, or has no `.` and is not a glob.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl EntryClassifier for HeuristicClassifier {
    fn classify(&self, name: &str) -> EntryKind {
        let is_directory = name.ends_with(DIRECTORY_INDICATOR)
            || (!name.contains(FILE_INDICATOR) && !name.starts_with(GLOB_MARKER));
        if is_directory {
            EntryKind::Directory
        } else {
            EntryKind::File
        }
    }
}

/// Directory only when the label ends with `/`. Exact for rendered output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingSlashClassifier;

impl EntryClassifier for TrailingSlashClassifier {
    fn classify(&self, name: &str) -> EntryKind {
        if name.ends_with(DIRECTORY_INDICATOR) {
            EntryKind::Directory
        } else {
            EntryKind::File
        }
    }
}

/// A line split into its structural prefix and its text
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    /// Line without its terminator
    raw: &'a str,
    /// Spaces in the leading region once glyphs are removed
    indent: usize,
    /// Characters in the leading region, glyphs included
    columns: usize,
    /// Trimmed text after the leading region
    text: &'a str,
}

impl<'a> Line<'a> {
    fn parse(raw: &'a str) -> Self {
        let raw = raw.trim_end_matches(&['\n', '\r'][..]);
        let mut indent = 0;
        let mut columns = 0;
        let mut end = raw.len();

        for (i, c) in raw.char_indices() {
            match c {
                ' ' => indent += 1,
                '\t' => indent += TAB_WIDTH,
                c if TREE_GLYPHS.contains(&c) => {}
                _ => {
                    end = i;
                    break;
                }
            }
            columns += 1;
        }

        Self {
            raw,
            indent,
            columns,
            text: raw[end..].trim(),
        }
    }

    fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    /// The line with up to `columns` leading structural characters removed
    fn content(&self, columns: usize) -> String {
        let skip = columns.min(self.columns);
        let start = self
            .raw
            .char_indices()
            .nth(skip)
            .map_or(self.raw.len(), |(i, _)| i);
        self.raw[start..].to_string()
    }
}

/// A file whose indented content is being collected
#[derive(Debug)]
struct Capture {
    /// Child indices leading from the root to the file node
    path: Vec<usize>,
    /// Indentation of the file entry itself
    declared_indent: usize,
    /// Leading columns stripped from each content line
    base_column: Option<usize>,
    lines: Vec<String>,
}

#[derive(Debug)]
enum State {
    /// Reading entries
    Scanning,
    /// Collecting content lines for the most recent file
    CapturingContent(Capture),
    /// Dropping the indented body of an ignored entry
    SkippingIgnored { declared_indent: usize },
}

/// An open directory on the indentation stack
#[derive(Debug)]
struct Frame {
    indent: usize,
    path: Vec<usize>,
}

/// Parser for structure text
pub struct StructureParser {
    /// Ignore rules applied to every entry
    rules: IgnoreRules,
    /// Name sanitizer
    sanitizer: NameSanitizer,
    /// Directory/file classification policy
    classifier: Box<dyn EntryClassifier>,
}

impl StructureParser {
    /// Create a parser using the heuristic classification policy
    pub fn new(rules: IgnoreRules, sanitizer: NameSanitizer) -> Self {
        Self {
            rules,
            sanitizer,
            classifier: Box::new(HeuristicClassifier),
        }
    }

    /// Create a parser from the application configuration
    pub fn from_config(config: &Config) -> Self {
        let parser = Self::new(config.rules.clone(), NameSanitizer::new(config.sanitize));
        if config.strict_dirs {
            parser.with_classifier(TrailingSlashClassifier)
        } else {
            parser
        }
    }

    /// Replace the classification policy
    pub fn with_classifier<C>(mut self, classifier: C) -> Self
    where
        C: EntryClassifier + 'static,
    {
        self.classifier = Box::new(classifier);
        self
    }

    /// Parse structure lines into a tree under a synthetic root
    pub fn parse<I, S>(&self, lines: I) -> Node
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut run = ParseRun {
            parser: self,
            root: Node::root(),
            stack: Vec::new(),
            state: State::Scanning,
        };

        for line in lines {
            run.feed(line.as_ref());
        }

        run.finish()
    }
}

/// Mutable state of a single parse
struct ParseRun<'p> {
    parser: &'p StructureParser,
    root: Node,
    stack: Vec<Frame>,
    state: State,
}

impl ParseRun<'_> {
    fn feed(&mut self, raw: &str) {
        let line = Line::parse(raw);

        match std::mem::replace(&mut self.state, State::Scanning) {
            State::CapturingContent(mut capture) => {
                if line.indent > capture.declared_indent {
                    Self::capture_line(&mut capture, &line);
                    self.state = State::CapturingContent(capture);
                    return;
                }
                if line.is_blank() {
                    self.state = State::CapturingContent(capture);
                    return;
                }
                self.close(capture);
            }
            State::SkippingIgnored { declared_indent } => {
                if line.indent > declared_indent || line.is_blank() {
                    debug!(line = %line.text, "Skipping line below ignored entry");
                    self.state = State::SkippingIgnored { declared_indent };
                    return;
                }
            }
            State::Scanning => {}
        }

        if line.is_blank() {
            return;
        }

        self.entry(&line);
    }

    fn capture_line(capture: &mut Capture, line: &Line<'_>) {
        if line.is_blank() {
            // Whitespace past the content column belongs to the content
            let text = capture
                .base_column
                .map_or_else(String::new, |base| line.content(base));
            capture.lines.push(text);
            return;
        }

        // A renderer marker right after the file fixes the content column
        if capture.lines.is_empty()
            && capture.base_column.is_none()
            && CONTENTS_MARKER.is_match(line.text)
        {
            capture.base_column = Some(line.columns);
            return;
        }

        let base = *capture.base_column.get_or_insert(line.columns);
        capture.lines.push(line.content(base));
    }

    fn entry(&mut self, line: &Line<'_>) {
        let label = CONTENTS_MARKER
            .captures(line.text)
            .and_then(|caps| caps.get(1))
            .map_or(line.text, |m| m.as_str().trim());

        let kind = self.parser.classifier.classify(label);
        let name = self.parser.sanitizer.sanitize(label);

        if self.parser.rules.is_ignored(&name, kind) {
            info!(name = %name, "Skipping ignored file/directory");
            self.state = State::SkippingIgnored {
                declared_indent: line.indent,
            };
            return;
        }

        // Pop until the top of the stack is shallower than this line
        while self
            .stack
            .last()
            .is_some_and(|frame| frame.indent >= line.indent)
        {
            self.stack.pop();
        }

        let mut path = self
            .stack
            .last()
            .map(|frame| frame.path.clone())
            .unwrap_or_default();
        let parent = node_at_mut(&mut self.root, &path);
        path.push(parent.children.len());

        debug!(name = %name, kind = ?kind, indent = line.indent, "Parsed entry");

        match kind {
            EntryKind::Directory => {
                parent.add_child(Node::directory(name));
                self.stack.push(Frame {
                    indent: line.indent,
                    path,
                });
            }
            EntryKind::File => {
                parent.add_child(Node::file(name, None));
                self.state = State::CapturingContent(Capture {
                    path,
                    declared_indent: line.indent,
                    base_column: None,
                    lines: Vec::new(),
                });
            }
        }
    }

    fn close(&mut self, capture: Capture) {
        if capture.lines.is_empty() {
            return;
        }
        let node = node_at_mut(&mut self.root, &capture.path);
        node.set_content(capture.lines.join("\n"));
    }

    fn finish(mut self) -> Node {
        if let State::CapturingContent(capture) =
            std::mem::replace(&mut self.state, State::Scanning)
        {
            self.close(capture);
        }
        self.root
    }
}

fn node_at_mut<'n>(root: &'n mut Node, path: &[usize]) -> &'n mut Node {
    path.iter().fold(root, |node, &i| &mut node.children[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> StructureParser {
        StructureParser::new(IgnoreRules::default(), NameSanitizer::default())
    }

    fn names(node: &Node) -> Vec<&str> {
        node.children.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_indented_listing() {
        let root = parser().parse(["project/", "  src/", "    main.py"]);

        assert_eq!(root.name, "root");
        assert_eq!(names(&root), vec!["project"]);
        let src = root.find("project/src").unwrap();
        assert!(src.is_directory());
        let main = src.child("main.py").unwrap();
        assert_eq!(main.kind, EntryKind::File);
        assert_eq!(main.content, None);
    }

    #[test]
    fn test_tree_glyphs() {
        let lines = [
            "app/",
            "├── src/",
            "│   ├── main.rs",
            "│   └── lib.rs",
            "├── tests/",
            "│   └── it.rs",
            "└── Cargo.toml",
        ];
        let root = parser().parse(lines);
        let app = root.child("app").unwrap();

        assert_eq!(names(app), vec!["src", "tests", "Cargo.toml"]);
        assert_eq!(names(app.child("src").unwrap()), vec!["main.rs", "lib.rs"]);
        assert_eq!(names(app.child("tests").unwrap()), vec!["it.rs"]);
    }

    #[test]
    fn test_inline_content_keeps_relative_indentation() {
        let lines = [
            "pkg/",
            "  util.py",
            "    def add(a, b):",
            "        return a + b",
            "",
            "    print(add(1, 2))",
            "  README.md",
        ];
        let root = parser().parse(lines);
        let pkg = root.child("pkg").unwrap();

        assert_eq!(
            pkg.child("util.py").unwrap().content.as_deref(),
            Some("def add(a, b):\n    return a + b\nprint(add(1, 2))")
        );
        assert_eq!(pkg.child("README.md").unwrap().content, None);
    }

    #[test]
    fn test_indented_blank_lines_are_content() {
        let lines = ["notes.txt", "  first", "  ", "  second"];
        let root = parser().parse(lines);
        assert_eq!(
            root.child("notes.txt").unwrap().content.as_deref(),
            Some("first\n\nsecond")
        );
    }

    #[test]
    fn test_whitespace_only_content_lines_are_kept() {
        let lines = [
            "proj/",
            "├── a.txt",
            "│       └── Contents of a.txt:",
            "│           x",
            "│               ",
            "│           y",
        ];
        let root = parser().parse(lines);
        assert_eq!(
            root.find("proj/a.txt").unwrap().content.as_deref(),
            Some("x\n    \ny")
        );
    }

    #[test]
    fn test_content_flushed_at_end_of_input() {
        let root = parser().parse(["main.py", "    print('hi')"]);
        assert_eq!(
            root.child("main.py").unwrap().content.as_deref(),
            Some("print('hi')")
        );
    }

    #[test]
    fn test_rendered_contents_marker() {
        let lines = [
            "proj/",
            "├── app.py",
            "│       └── Contents of app.py:",
            "│           def main():",
            "│               return 1",
            "└── lib/",
            "│   └── mod.py",
        ];
        let root = parser().parse(lines);
        let proj = root.child("proj").unwrap();

        assert_eq!(names(proj), vec!["app.py", "lib"]);
        assert_eq!(
            proj.child("app.py").unwrap().content.as_deref(),
            Some("def main():\n    return 1")
        );
        assert!(proj.find("lib/mod.py").is_some());
    }

    #[test]
    fn test_contents_marker_outside_capture_names_the_entry() {
        let root = parser().parse(["Contents of setup.py:"]);
        assert_eq!(names(&root), vec!["setup.py"]);
        assert_eq!(root.children[0].kind, EntryKind::File);
    }

    #[test]
    fn test_ignored_entries_and_their_bodies_are_skipped() {
        let lines = [
            "site/",
            "  node_modules/",
            "    left-pad/",
            "      index.js",
            "  cache.pyc",
            "    binary junk",
            "  index.html",
        ];
        let root = parser().parse(lines);
        let site = root.child("site").unwrap();

        assert_eq!(names(site), vec!["index.html"]);
        assert_eq!(root.descendant_count(), 2);
    }

    #[test]
    fn test_malformed_indentation_degrades_gracefully() {
        let lines = ["a/", "      b/", "   c.txt", " d/", "e.txt"];
        let root = parser().parse(lines);

        assert_eq!(names(&root), vec!["a", "e.txt"]);
        let a = root.child("a").unwrap();
        assert_eq!(names(a), vec!["b", "c.txt", "d"]);
    }

    #[test]
    fn test_heuristic_classification() {
        let classifier = HeuristicClassifier;
        assert_eq!(classifier.classify("src/"), EntryKind::Directory);
        assert_eq!(classifier.classify("docs"), EntryKind::Directory);
        assert_eq!(classifier.classify("main.rs"), EntryKind::File);
        assert_eq!(classifier.classify("**glob"), EntryKind::File);
        assert_eq!(classifier.classify(".github/"), EntryKind::Directory);
    }

    #[test]
    fn test_custom_classifier() {
        let exact = parser().with_classifier(TrailingSlashClassifier);
        let root = exact.parse(["Makefile", "src/", "  LICENSE"]);

        assert_eq!(root.child("Makefile").unwrap().kind, EntryKind::File);
        assert!(root.find("src/LICENSE").is_some());

        let everything_is_a_file = parser().with_classifier(|_: &str| EntryKind::File);
        let root = everything_is_a_file.parse(["docs", "more"]);
        assert!(root.children.iter().all(|c| c.kind == EntryKind::File));
    }

    #[test]
    fn test_names_are_sanitized_and_duplicates_kept() {
        let root = parser().parse(["my notes?.md", "dup.txt", "dup.txt"]);
        assert_eq!(names(&root), vec!["my_notes_.md", "dup.txt", "dup.txt"]);
    }
}
