/*!
 * Top-level create, recreate and output operations
 *
 * Hard input problems (missing, empty or undecodable structure files) are
 * returned as errors before any parsing starts. Everything past that point
 * is best-effort and reported through logs and statistics.
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::config::Config;
use crate::contents::{apply_content_blocks, ContentBlocks, ContentFileParser};
use crate::error::Result;
use crate::materializer::{MaterializeStats, TreeMaterializer};
use crate::parser::StructureParser;
use crate::renderer::{RenderStats, StructureRenderer};
use crate::types::Node;

/// Read a structure file into lines
pub fn read_structure_lines(path: &Path) -> Result<Vec<String>> {
    crate::ensure!(
        path.is_file(),
        InputNotFound,
        "structure file {}",
        path.display()
    );

    let bytes = fs::read(path)?;
    let text = String::from_utf8(bytes)
        .map_err(|_| crate::error!(Decode, "structure file {}", path.display()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    crate::ensure!(
        !lines.is_empty(),
        InputEmpty,
        "structure file {}",
        path.display()
    );

    info!(path = %path.display(), lines = lines.len(), "Read structure file");
    Ok(lines)
}

/// Read and parse a content file.
///
/// A missing file is an error; a file that cannot be read or decoded
/// yields no content so the structure can still be created.
pub fn read_content_blocks(path: &Path, parser: &ContentFileParser) -> Result<ContentBlocks> {
    crate::ensure!(
        path.exists(),
        InputNotFound,
        "contents file {}",
        path.display()
    );

    let text = match fs::read(path).map(String::from_utf8) {
        Ok(Ok(text)) => text,
        Ok(Err(_)) => {
            warn!(path = %path.display(), "Contents file is not valid UTF-8; continuing without content");
            return Ok(ContentBlocks::new());
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Error reading contents file; continuing without content");
            return Ok(ContentBlocks::new());
        }
    };

    let blocks = parser.parse(text.lines());
    info!(path = %path.display(), blocks = blocks.len(), "Read contents file");
    Ok(blocks)
}

/// Runs structure operations with one configuration
pub struct StructureEngine {
    /// Engine configuration
    config: Config,
}

impl StructureEngine {
    /// Create a new engine
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse a structure file into a tree
    pub fn parse_structure_file(&self, structure_file: &Path) -> Result<Node> {
        let lines = read_structure_lines(structure_file)?;
        let root = StructureParser::from_config(&self.config).parse(&lines);
        info!(entries = root.descendant_count(), "Parsed structure");
        Ok(root)
    }

    /// Create the structure described by `structure_file` under `project_root`,
    /// using any content embedded in the structure file.
    pub fn create_structure_from_file(
        &self,
        structure_file: &Path,
        project_root: &Path,
    ) -> Result<MaterializeStats> {
        let root = self.parse_structure_file(structure_file)?;
        let stats = self.materialize(&root, project_root);
        info!(path = %structure_file.display(), "Created structure from file");
        Ok(stats)
    }

    /// Create the structure with file contents taken from `contents_file`.
    /// Content from the contents file replaces embedded content.
    pub fn recreate_structure_from_file(
        &self,
        structure_file: &Path,
        contents_file: &Path,
        project_root: &Path,
    ) -> Result<MaterializeStats> {
        let mut root = self.parse_structure_file(structure_file)?;
        let blocks = read_content_blocks(
            contents_file,
            &ContentFileParser::new(self.config.markers.clone()),
        )?;
        apply_content_blocks(&mut root, &blocks);

        let stats = self.materialize(&root, project_root);
        info!(path = %structure_file.display(), "Recreated structure from file");
        Ok(stats)
    }

    /// Materialize an already parsed tree
    pub fn materialize(&self, root: &Node, project_root: &Path) -> MaterializeStats {
        TreeMaterializer::new(self.config.rules.clone()).materialize(root, project_root)
    }

    /// Write the structure of `root_directory` to `output_file`
    /// (or a timestamped file in the current directory).
    pub fn output_directory_structure(
        &self,
        root_directory: &Path,
        output_file: Option<&Path>,
        include_contents: bool,
        progress: Arc<ProgressBar>,
    ) -> Result<(PathBuf, RenderStats)> {
        StructureRenderer::new(self.config.rules.clone(), progress).render_to_file(
            root_directory,
            output_file,
            include_contents,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StructureError;
    use tempfile::tempdir;

    #[test]
    fn test_missing_structure_file() {
        let dir = tempdir().unwrap();
        let err = read_structure_lines(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, StructureError::InputNotFound(_)));
    }

    #[test]
    fn test_empty_structure_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.txt");
        fs::write(&path, "")?;
        let err = read_structure_lines(&path).unwrap_err();
        assert!(matches!(err, StructureError::InputEmpty(_)));
        Ok(())
    }

    #[test]
    fn test_undecodable_structure_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.txt");
        fs::write(&path, [b'a', 0xff, b'\n'])?;
        let err = read_structure_lines(&path).unwrap_err();
        assert!(matches!(err, StructureError::Decode(_)));
        Ok(())
    }

    #[test]
    fn test_byte_order_mark_is_dropped() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bom.txt");
        fs::write(&path, "\u{feff}src/\n  main.rs\n")?;
        assert_eq!(read_structure_lines(&path)?, vec!["src/", "  main.rs"]);
        Ok(())
    }

    #[test]
    fn test_undecodable_contents_file_is_soft() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("contents.txt");
        fs::write(&path, [0xffu8, 0xfe])?;
        let blocks = read_content_blocks(&path, &ContentFileParser::default())?;
        assert!(blocks.is_empty());

        let missing = read_content_blocks(&dir.path().join("nope.txt"), &ContentFileParser::default());
        assert!(matches!(missing, Err(StructureError::InputNotFound(_))));
        Ok(())
    }
}
