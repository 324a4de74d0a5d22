/*!
 * Configuration handling for dirtext
 */

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ResultExt};
use crate::sanitizer::is_reserved_char;
use crate::types::EntryKind;
use crate::utils::{DEFAULT_IGNORED_DIRECTORIES, DEFAULT_IGNORED_EXTENSIONS};

/// Verbosity of the stderr log stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warn,
    Error,
    Silent,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Option<tracing::Level> {
        match self {
            LogLevel::Debug => Some(tracing::Level::DEBUG),
            LogLevel::Info => Some(tracing::Level::INFO),
            LogLevel::Warn => Some(tracing::Level::WARN),
            LogLevel::Error => Some(tracing::Level::ERROR),
            LogLevel::Silent => None,
        }
    }
}

/// Command-line arguments for dirtext
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "dirtext",
    version = env!("CARGO_PKG_VERSION"),
    about = "Render directory trees as indented ASCII text and materialize them back",
    long_about = "Writes a directory subtree as an indented ASCII-art listing (optionally with file contents), and recreates directories and files from such a listing plus an optional keyed contents file."
)]
pub struct Args {
    /// Log level for messages written to stderr (and the log file)
    #[clap(long, short, global = true, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Also append log messages to this file, for inspection after the run
    #[clap(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// JSON file with additional ignore rules ({"extensions": [..], "directories": [..]})
    #[clap(long, global = true)]
    pub rules: Option<String>,

    /// Comma-separated list of file-name suffixes to ignore
    #[clap(long, global = true, value_delimiter = ',')]
    pub ignore_ext: Vec<String>,

    /// Comma-separated list of directory names to ignore
    #[clap(long, global = true, value_delimiter = ',')]
    pub ignore_dir: Vec<String>,

    /// Start from an empty ignore list instead of the built-in one
    #[clap(long, global = true)]
    pub no_default_ignores: bool,

    #[clap(subcommand)]
    pub command: Command,
}

/// Top-level operations
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create directories and files from a structure file
    Create {
        /// Structure definition file
        structure_file: String,

        /// Directory the structure is created under (default: current directory)
        #[clap(long)]
        root: Option<String>,

        /// Only entries ending with '/' are directories
        #[clap(long)]
        strict_dirs: bool,
    },

    /// Recreate a structure, filling file contents from a contents file
    Recreate {
        /// Structure definition file
        structure_file: String,

        /// File with "--- START OF FILE <path> ---" content blocks
        contents_file: String,

        /// Directory the structure is created under (default: current directory)
        #[clap(long)]
        root: Option<String>,

        /// Only entries ending with '/' are directories
        #[clap(long)]
        strict_dirs: bool,
    },

    /// Write the structure of a directory to a text file
    Output {
        /// Directory to render
        root_directory: String,

        /// Output file (default: directory_structure_<timestamp>.txt)
        #[clap(long, short)]
        out_file: Option<String>,

        /// Inline file contents below each file entry
        #[clap(long, short = 'c')]
        include_contents: bool,
    },

    /// Generate shell completions
    Completions {
        #[clap(value_enum)]
        shell: Shell,
    },
}

/// Names excluded from parsing, rendering and materialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreRules {
    /// File-name suffixes, matched case-sensitively
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Exact directory names, matched case-sensitively
    #[serde(default)]
    pub directories: Vec<String>,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_IGNORED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            directories: DEFAULT_IGNORED_DIRECTORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl IgnoreRules {
    /// A rule set that ignores nothing
    pub fn empty() -> Self {
        Self {
            extensions: Vec::new(),
            directories: Vec::new(),
        }
    }

    /// Load rules from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file {}", path.display()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Add rules, skipping duplicates
    pub fn extend<I, J>(&mut self, extensions: I, directories: J)
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        for ext in extensions {
            if !self.extensions.contains(&ext) {
                self.extensions.push(ext);
            }
        }
        for dir in directories {
            if !self.directories.contains(&dir) {
                self.directories.push(dir);
            }
        }
    }

    pub fn is_ignored_file(&self, name: &str) -> bool {
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.directories.iter().any(|dir| dir == name)
    }

    pub fn is_ignored(&self, name: &str, kind: EntryKind) -> bool {
        match kind {
            EntryKind::Directory => self.is_ignored_dir(name),
            EntryKind::File => self.is_ignored_file(name),
        }
    }

    /// Directories the renderer does not descend into: ignored or hidden
    pub fn skip_when_rendering(&self, dir_name: &str) -> bool {
        self.is_ignored_dir(dir_name) || dir_name.starts_with('.')
    }
}

/// Options for turning raw labels into file-system names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// Character substituted for disallowed characters and whitespace
    pub replacement: char,
    /// Maximum name length in bytes
    pub max_len: usize,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            replacement: '_',
            max_len: 255,
        }
    }
}

/// Sentinel lines bracketing a payload inside a content block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMarkers {
    pub start: String,
    pub end: String,
}

impl Default for ContentMarkers {
    fn default() -> Self {
        Self {
            start: "<startwolf>".to_string(),
            end: "<endwolf>".to_string(),
        }
    }
}

/// Application configuration
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Ignore rules shared by every component
    pub rules: IgnoreRules,

    /// Name sanitization options
    pub sanitize: SanitizeOptions,

    /// Content file sentinels
    pub markers: ContentMarkers,

    /// Classify only entries ending with '/' as directories
    pub strict_dirs: bool,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut rules = if args.no_default_ignores {
            IgnoreRules::empty()
        } else {
            IgnoreRules::default()
        };

        if let Some(path) = &args.rules {
            let extra = IgnoreRules::from_file(&PathBuf::from(path))?;
            rules.extend(extra.extensions, extra.directories);
        }
        rules.extend(args.ignore_ext.clone(), args.ignore_dir.clone());

        let strict_dirs = match &args.command {
            Command::Create { strict_dirs, .. } | Command::Recreate { strict_dirs, .. } => {
                *strict_dirs
            }
            _ => false,
        };

        Ok(Self {
            rules,
            strict_dirs,
            ..Self::default()
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        crate::ensure!(
            !is_reserved_char(self.sanitize.replacement),
            Config,
            "replacement character {:?} is itself disallowed in names",
            self.sanitize.replacement
        );
        crate::ensure!(
            self.sanitize.max_len >= 8,
            Config,
            "maximum name length {} is too small",
            self.sanitize.max_len
        );
        crate::ensure!(
            !self.rules.extensions.iter().any(|e| e.is_empty()),
            Config,
            "empty extension in ignore rules would ignore every file"
        );
        crate::ensure!(
            !self.markers.start.trim().is_empty()
                && !self.markers.end.trim().is_empty()
                && self.markers.start.trim() != self.markers.end.trim(),
            Config,
            "content sentinels must be non-empty and distinct"
        );

        Ok(())
    }
}
