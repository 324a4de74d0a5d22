/*!
 * Name sanitization for structure entries
 *
 * Turns a raw label taken from a structure file into a name that is safe to
 * create on disk. The function is total: every input yields a non-empty name
 * no longer than the configured limit.
 */

use tracing::{debug, warn};

use crate::config::SanitizeOptions;

/// Characters that are never allowed in a name
pub const DISALLOWED_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|', '#'];

/// Bracket characters replaced as well
pub const BRACKET_CHARS: &[char] = &['(', ')', '{', '}', '[', ']'];

/// Name used when nothing usable is left of a label
pub const FALLBACK_NAME: &str = "untitled";

/// Whether a character is replaced during sanitization (whitespace aside)
pub fn is_reserved_char(c: char) -> bool {
    DISALLOWED_CHARS.contains(&c) || BRACKET_CHARS.contains(&c) || c.is_control()
}

/// A stretch of the label between separators
enum Segment {
    /// Characters kept verbatim
    Text(String),
    /// Consecutive replacement characters. `substituted` is set when at
    /// least one of them came from a disallowed character or whitespace.
    Separator { substituted: bool, literal: usize },
}

/// Sanitizes raw labels into file-system names
#[derive(Debug, Clone, Default)]
pub struct NameSanitizer {
    options: SanitizeOptions,
}

impl NameSanitizer {
    /// Create a new sanitizer
    pub fn new(options: SanitizeOptions) -> Self {
        Self { options }
    }

    /// Sanitize a raw label
    pub fn sanitize(&self, raw: &str) -> String {
        let segments = self.segment(raw);
        let mut name = self.join(&segments);

        if name.chars().all(|c| c == '.') {
            warn!(raw = %raw, "Name sanitized to default: {}", FALLBACK_NAME);
            name = FALLBACK_NAME.to_string();
        }

        if name.len() > self.options.max_len {
            let truncated = self.truncate(&name);
            warn!(
                before = %name,
                after = %truncated,
                "Name truncated to {} bytes",
                self.options.max_len
            );
            name = truncated;
        }

        if name != raw {
            debug!(raw = %raw, sanitized = %name, "Sanitized name");
        }

        name
    }

    // Substitute disallowed characters, brackets and whitespace runs,
    // remembering which separators were introduced here.
    fn segment(&self, raw: &str) -> Vec<Segment> {
        let replacement = self.options.replacement;
        let mut segments: Vec<Segment> = Vec::new();

        fn push_separator(segments: &mut Vec<Segment>, substituted: bool) {
            if let Some(Segment::Separator {
                substituted: s,
                literal,
            }) = segments.last_mut()
            {
                *s |= substituted;
                if !substituted {
                    *literal += 1;
                }
                return;
            }
            segments.push(Segment::Separator {
                substituted,
                literal: usize::from(!substituted),
            });
        }

        for c in raw.chars() {
            if c.is_whitespace() || is_reserved_char(c) {
                push_separator(&mut segments, true);
            } else if c == replacement {
                push_separator(&mut segments, false);
            } else if let Some(Segment::Text(text)) = segments.last_mut() {
                text.push(c);
            } else {
                segments.push(Segment::Text(c.to_string()));
            }
        }

        segments
    }

    // Collapse introduced separators to a single replacement
    // character and drop them at either end. Runs made only of replacement
    // characters that were already present (e.g. dunder names) are kept.
    fn join(&self, segments: &[Segment]) -> String {
        let replacement = self.options.replacement;
        let last = segments.len().saturating_sub(1);
        let mut name = String::new();

        for (i, segment) in segments.iter().enumerate() {
            match segment {
                Segment::Text(text) => name.push_str(text),
                Segment::Separator {
                    substituted: true, ..
                } => {
                    if i != 0 && i != last {
                        name.push(replacement);
                    }
                }
                Segment::Separator { literal, .. } => {
                    name.extend(std::iter::repeat(replacement).take(*literal));
                }
            }
        }

        name
    }

    // Keep the extension when it fits, otherwise cut hard
    fn truncate(&self, name: &str) -> String {
        let max_len = self.options.max_len;

        let truncated = match name.rfind('.') {
            Some(idx) if idx > 0 && name.len() - idx < max_len => {
                let (base, ext) = name.split_at(idx);
                let base = floor_to_char_boundary(base, max_len - ext.len());
                if base.is_empty() {
                    floor_to_char_boundary(name, max_len).to_string()
                } else {
                    format!("{}{}", base, ext)
                }
            }
            _ => floor_to_char_boundary(name, max_len).to_string(),
        };

        let truncated = truncated.trim_end().to_string();
        if truncated.chars().all(|c| c == '.') {
            FALLBACK_NAME.to_string()
        } else {
            truncated
        }
    }
}

/// Longest prefix of `s` that is at most `max` bytes and ends on a char boundary
fn floor_to_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
