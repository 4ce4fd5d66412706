//! Structured error types for dynimage.
//!
//! Configuration problems in the tree, unreadable sources, backend failures
//! and JSON document parsing each get their own variant. Paint descriptors
//! never error: an unparsable colour or gradient degrades to "no paint".

use thiserror::Error;

/// The unified error type returned by all public dynimage API functions.
#[derive(Debug, Error)]
pub enum DynImageError {
    /// The tree cannot be resolved as configured.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An image source could not be read.
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// The drawing backend failed to decode, measure or encode.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// JSON input failed to parse as a valid dynimage document.
    #[error("Failed to parse document: {source}{}", hint_suffix(.hint))]
    Parse {
        source: serde_json::Error,
        hint: String,
    },

    /// Writing the encoded image failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors in the shape of the tree itself.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("undecidable size: the image has no explicit size and its content resolves to {width}x{height}")]
    UndecidableSize { width: f64, height: f64 },

    #[error("percentage {axis} cannot resolve: the parent's {axis} is not known before its children")]
    UnresolvablePercentage { axis: &'static str },

    #[error("a cell spanning {span} columns cannot be placed in a {cols}-column table")]
    SpanExceedsColumns { span: usize, cols: usize },
}

/// Failures reported by a [`Backend`](crate::backend::Backend) implementation.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("cannot create a {width}x{height} surface")]
    InvalidSurface { width: u32, height: u32 },

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("output format {0} is not supported by this backend")]
    UnsupportedFormat(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("encoding failed: {0}")]
    Encode(String),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!(" ({})", hint)
    }
}

impl From<serde_json::Error> for DynImageError {
    fn from(e: serde_json::Error) -> Self {
        use serde_json::error::Category;
        let hint = match e.classify() {
            Category::Syntax => "the document is not valid JSON at that position",
            Category::Data => {
                "each child needs a \"type\" of block, text, image or table, with its options under \"options\""
            }
            Category::Eof => "the document ends early, look for an unclosed brace or bracket",
            Category::Io => "",
        }
        .to_string();
        DynImageError::Parse { source: e, hint }
    }
}

pub type Result<T> = std::result::Result<T, DynImageError>;
