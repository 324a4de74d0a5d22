/*!
 * Utility functions for dirtext
 */

use std::path::Path;

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use walkdir::WalkDir;

use crate::config::IgnoreRules;

/// Count the files the renderer will visit, for progress tracking
pub fn count_files(dir: &Path, rules: &IgnoreRules) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !rules.skip_when_rendering(&e.file_name().to_string_lossy())
        })
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| !rules.is_ignored_file(&e.file_name().to_string_lossy()))
        .count() as u64
}

/// File name used when `output` is not given an explicit destination
pub fn timestamped_output_name(now: DateTime<Local>) -> String {
    format!("directory_structure_{}.txt", now.format("%m%d%H%M%S"))
}

/// Normalize a relative path key to forward slashes without a leading `./` or `/`
pub fn normalize_rel_path(raw: &str) -> String {
    let unified = raw.trim().replace('\\', "/");
    let mut path = unified.as_str();
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest;
        } else {
            break;
        }
    }
    path.trim_end_matches('/').to_string()
}

/// Default file-name suffixes to ignore
pub static DEFAULT_IGNORED_EXTENSIONS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        // Bytecode & build output
        ".pyc",
        ".pyo",
        ".class",
        // Logs & temp
        ".log",
        ".tmp",
        // Windows shortcuts & scripts
        ".lnk",
        ".inf",
        ".bat",
        // Images & diagrams
        ".jpg",
        ".jpeg",
        ".png",
        ".webp",
        ".drawio",
        // Archives
        ".zip",
        // Databases
        ".sqlite3",
        // Tooling
        ".gitignore",
        ".dockerignore",
        "package-lock.json",
    ]
});

/// Default directory names to ignore
pub static DEFAULT_IGNORED_DIRECTORIES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        // Version Control
        ".git",
        ".svn",
        ".hg",
        // Dependencies
        "node_modules",
        "venv",
        ".venv",
        // Python
        "__pycache__",
        ".pytest_cache",
        // Rust
        "target",
        // IDEs & Editors
        ".vscode",
        ".idea",
        // Django artifacts
        "migrations",
        "staticfiles",
    ]
});
