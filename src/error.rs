//! Global error handling for dirtext
//!
//! Hard failures that abort a top-level operation are represented here.
//! Soft failures (sanitization fallbacks, malformed content blocks, per-node
//! materialization errors) are logged and counted instead.

use std::io;
use thiserror::Error;

/// Global error type for dirtext operations
#[derive(Error, Debug)]
pub enum StructureError {
    /// Structure or content file does not exist
    #[error("Input not found: {0}")]
    InputNotFound(String),

    /// Structure file contained no lines
    #[error("Input is empty: {0}")]
    InputEmpty(String),

    /// Input is not valid UTF-8 text
    #[error("Failed to decode {0} as UTF-8 text")]
    Decode(String),

    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Ignore-rule file could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unexpected error
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Specialized Result type for dirtext operations
pub type Result<T> = std::result::Result<T, StructureError>;

/// Creates a StructureError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::StructureError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

/// Extension trait for adding context to errors
pub trait ResultExt<T, E> {
    /// Add additional context to an error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E: std::error::Error + 'static> ResultExt<T, E> for std::result::Result<T, E> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|e| {
            let context = f();
            StructureError::Unexpected(format!("{}: {}", context, e))
        })
    }
}

// Lets the binary keep an io::Result main
impl From<StructureError> for io::Error {
    fn from(err: StructureError) -> Self {
        let kind = match &err {
            StructureError::InputNotFound(_) => io::ErrorKind::NotFound,
            StructureError::InputEmpty(_)
            | StructureError::Decode(_)
            | StructureError::InvalidArgument(_) => io::ErrorKind::InvalidInput,
            StructureError::Io(e) => e.kind(),
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err.to_string())
    }
}
