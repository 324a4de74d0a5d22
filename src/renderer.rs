/*!
 * Directory rendering as ASCII-art structure text
 */

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use indicatif::ProgressBar;
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::IgnoreRules;
use crate::error::{Result, StructureError};
use crate::utils::timestamped_output_name;

/// Branch for an entry that has later siblings
pub const BRANCH: &str = "├── ";
/// Branch for the last entry of a directory
pub const LAST_BRANCH: &str = "└── ";
/// Continuation drawn for every ancestor level
pub const PIPE: &str = "│   ";
/// Extra indentation of the contents marker below a file
const MARKER_INDENT: &str = "    ";
/// Extra indentation of content lines below a file
const CONTENT_INDENT: &str = "        ";

/// Renderer statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Directories rendered, the root included
    pub directories: usize,
    /// Files rendered
    pub files: usize,
    /// Files whose content could not be read
    pub unreadable: usize,
}

/// Renders a directory tree as structure text
pub struct StructureRenderer {
    /// Ignore rules
    rules: IgnoreRules,
    /// Progress bar
    pub progress: Arc<ProgressBar>,
}

impl StructureRenderer {
    /// Create a new renderer
    pub fn new(rules: IgnoreRules, progress: Arc<ProgressBar>) -> Self {
        Self { rules, progress }
    }

    /// Render `root_directory` into `out`
    pub fn render<W: Write>(
        &self,
        root_directory: &Path,
        out: &mut W,
        include_contents: bool,
    ) -> Result<RenderStats> {
        let abs_path = resolve_root(root_directory)?;
        self.render_excluding(&abs_path, out, include_contents, None)
    }

    /// Render into a file, defaulting to a timestamped name in the current
    /// directory. Returns the path written.
    pub fn render_to_file(
        &self,
        root_directory: &Path,
        output_file: Option<&Path>,
        include_contents: bool,
    ) -> Result<(PathBuf, RenderStats)> {
        // Nothing is written unless the root can be rendered
        let abs_path = resolve_root(root_directory)?;

        let output_file = match output_file {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir()?.join(timestamped_output_name(Local::now())),
        };

        let file = File::create(&output_file)?;
        // Don't list the output file itself
        let excluded = fs::canonicalize(&output_file)?;
        let mut writer = BufWriter::new(file);

        let stats =
            self.render_excluding(&abs_path, &mut writer, include_contents, Some(&excluded))?;
        writer.flush()?;

        info!(path = %output_file.display(), "Directory structure written");
        Ok((output_file, stats))
    }

    /// Render an already resolved root directory
    fn render_excluding<W: Write>(
        &self,
        abs_path: &Path,
        out: &mut W,
        include_contents: bool,
        excluded: Option<&Path>,
    ) -> Result<RenderStats> {
        let dir_name = abs_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| abs_path.display().to_string());

        let mut stats = RenderStats::default();
        writeln!(out, "{}/", dir_name)?;

        let walk = RenderWalk {
            renderer: self,
            include_contents,
            excluded,
        };
        walk.render_directory(abs_path, 0, out, &mut stats)?;

        Ok(stats)
    }

    /// List a directory: surviving files and subdirectories, each sorted
    fn read_entries(&self, dir: &Path, excluded: Option<&Path>) -> (Vec<DirEntry>, Vec<DirEntry>) {
        let entries: Vec<DirEntry> = WalkDir::new(dir)
            .max_depth(1)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Error reading directory entry");
                    None
                }
            })
            .filter(|e| excluded.map_or(true, |path| e.path() != path))
            .collect();

        // Split into directories and files
        let (dirs, files): (Vec<_>, Vec<_>) =
            entries.into_iter().partition(|e| e.file_type().is_dir());

        let dirs = dirs
            .into_iter()
            .filter(|e| !self.rules.skip_when_rendering(&e.file_name().to_string_lossy()))
            .collect();

        let files = files
            .into_iter()
            .filter(|e| {
                let name = e.file_name().to_string_lossy();
                let ignored = self.rules.is_ignored_file(&name);
                if ignored {
                    info!(name = %name, "Skipping file with ignored extension");
                }
                !ignored
            })
            .collect();

        (dirs, files)
    }
}

/// Canonicalize the root and check that it is a directory
fn resolve_root(root_directory: &Path) -> Result<PathBuf> {
    let abs_path = fs::canonicalize(root_directory).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => crate::error!(InputNotFound, "{}", root_directory.display()),
        _ => StructureError::Io(e),
    })?;
    crate::ensure!(
        abs_path.is_dir(),
        InvalidArgument,
        "not a directory: {}",
        root_directory.display()
    );
    Ok(abs_path)
}

/// Settings shared by one rendering pass
struct RenderWalk<'r> {
    renderer: &'r StructureRenderer,
    include_contents: bool,
    excluded: Option<&'r Path>,
}

impl RenderWalk<'_> {
    /// Render the entries of a directory whose own line is already written.
    /// Siblings are collected first so the last one gets the closing branch.
    fn render_directory<W: Write>(
        &self,
        dir: &Path,
        depth: usize,
        out: &mut W,
        stats: &mut RenderStats,
    ) -> io::Result<()> {
        stats.directories += 1;

        let (dirs, files) = self.renderer.read_entries(dir, self.excluded);
        let total = files.len() + dirs.len();
        let indent = PIPE.repeat(depth);

        for (i, file) in files.iter().enumerate() {
            let branch = if i + 1 == total { LAST_BRANCH } else { BRANCH };
            let name = file.file_name().to_string_lossy();
            writeln!(out, "{}{}{}", indent, branch, name)?;
            stats.files += 1;

            self.renderer.progress.inc(1);
            self.renderer
                .progress
                .set_message(format!("Current file: {}", name));

            if self.include_contents {
                self.write_contents(file.path(), &name, depth, out, stats)?;
            }
        }

        for (j, sub) in dirs.iter().enumerate() {
            let branch = if files.len() + j + 1 == total {
                LAST_BRANCH
            } else {
                BRANCH
            };
            writeln!(
                out,
                "{}{}{}/",
                indent,
                branch,
                sub.file_name().to_string_lossy()
            )?;
            self.render_directory(sub.path(), depth + 1, out, stats)?;
        }

        Ok(())
    }

    /// Write the contents marker and the file's lines below a file entry
    fn write_contents<W: Write>(
        &self,
        path: &Path,
        name: &str,
        depth: usize,
        out: &mut W,
        stats: &mut RenderStats,
    ) -> io::Result<()> {
        let indent = PIPE.repeat(depth + 1);
        writeln!(out, "{}{}{}Contents of {}:", indent, MARKER_INDENT, LAST_BRANCH, name)?;

        match fs::read_to_string(path) {
            Ok(content) => {
                for line in content.lines() {
                    writeln!(out, "{}{}{}", indent, CONTENT_INDENT, line)?;
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Error reading file");
                stats.unreadable += 1;
                writeln!(
                    out,
                    "{}{}[Error reading content: {}]",
                    indent, CONTENT_INDENT, e
                )?;
            }
        }

        Ok(())
    }
}
