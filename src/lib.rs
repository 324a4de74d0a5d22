/*!
 * dirtext - Bidirectional directory structure text engine
 *
 * This library renders a directory subtree as an indented ASCII-art
 * listing (optionally with file contents inlined), parses such listings
 * back into a tree, and materializes that tree onto the file system with
 * contents taken from the listing or from a keyed contents file.
 */

pub mod config;
pub mod contents;
pub mod error;
pub mod materializer;
pub mod operations;
pub mod parser;
pub mod renderer;
pub mod report;
pub mod sanitizer;
pub mod types;
pub mod utils;

#[cfg(test)]
mod tests;

// Re-export main components for easier access
pub use config::{Config, ContentMarkers, IgnoreRules, SanitizeOptions};
pub use contents::{apply_content_blocks, ContentBlocks, ContentFileParser};
pub use error::{Result, StructureError};
pub use materializer::{MaterializeFailure, MaterializeStats, TreeMaterializer};
pub use operations::StructureEngine;
pub use parser::{EntryClassifier, HeuristicClassifier, StructureParser, TrailingSlashClassifier};
pub use renderer::{RenderStats, StructureRenderer};
pub use report::{MaterializeReport, ReportFormat, Reporter};
pub use sanitizer::NameSanitizer;
pub use types::{EntryKind, Node};
pub use utils::count_files;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
