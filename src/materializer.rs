/*!
 * Materialization of structure trees onto the file system
 */

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::config::IgnoreRules;
use crate::types::Node;

/// A node that could not be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeFailure {
    /// Path that failed
    pub path: PathBuf,
    /// Error message
    pub error: String,
}

/// Outcome of a materialization pass
#[derive(Debug, Clone, Default)]
pub struct MaterializeStats {
    /// Directories created (or already present)
    pub directories_created: usize,
    /// Files written
    pub files_created: usize,
    /// Entries skipped by ignore rules
    pub skipped: usize,
    /// Per-node failures; the walk continues past each of them
    pub failures: Vec<MaterializeFailure>,
}

impl MaterializeStats {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Creates directories and files described by a [`Node`] tree
#[derive(Debug, Clone)]
pub struct TreeMaterializer {
    /// Ignore rules, re-checked for every node
    rules: IgnoreRules,
}

impl TreeMaterializer {
    /// Create a new materializer
    pub fn new(rules: IgnoreRules) -> Self {
        Self { rules }
    }

    /// Create the children of `node` below `target_root`.
    ///
    /// The node itself is not created, which is what the synthetic root
    /// of a parsed tree needs.
    pub fn materialize(&self, node: &Node, target_root: &Path) -> MaterializeStats {
        let mut stats = MaterializeStats::default();
        self.create_children(node, target_root, &mut stats);
        stats
    }

    fn create_children(&self, node: &Node, current: &Path, stats: &mut MaterializeStats) {
        for child in &node.children {
            let child_path = current.join(&child.name);

            // Trees can be built by other means than the parser
            if self.rules.is_ignored(&child.name, child.kind) {
                info!(name = %child.name, "Skipping ignored file/directory");
                stats.skipped += 1;
                continue;
            }

            if let Err(e) = validate_name(&child.name) {
                record_failure(stats, child_path, e);
                continue;
            }

            if child.is_directory() {
                match self.create_directory(&child_path) {
                    Ok(()) => {
                        stats.directories_created += 1;
                        self.create_children(child, &child_path, stats);
                    }
                    Err(e) => record_failure(stats, child_path, e),
                }
            } else {
                let content = child.content.as_deref().unwrap_or("");
                match self.create_file(&child_path, content) {
                    Ok(()) => stats.files_created += 1,
                    Err(e) => record_failure(stats, child_path, e),
                }
            }
        }
    }

    /// Create a directory; an existing directory is not an error
    fn create_directory(&self, dir_path: &Path) -> io::Result<()> {
        fs::create_dir_all(dir_path)?;
        info!(path = %dir_path.display(), "Created directory");
        Ok(())
    }

    /// Create or overwrite a file with the given content
    fn create_file(&self, file_path: &Path, content: &str) -> io::Result<()> {
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(file_path, content)?;
        info!(path = %file_path.display(), "Created file");
        Ok(())
    }
}

/// Reject names that would leave the directory they are created in
fn validate_name(name: &str) -> io::Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(&['/', '\\', '\0'][..]);
    if invalid {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid entry name {:?}", name),
        ));
    }
    Ok(())
}

fn record_failure(stats: &mut MaterializeStats, path: PathBuf, e: io::Error) {
    error!(path = %path.display(), error = %e, "Error creating entry");
    stats.failures.push(MaterializeFailure {
        path,
        error: e.to_string(),
    });
}
