use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for docgen operations
#[derive(Error, Debug)]
pub enum DocgenError {
    /// IO error when writing output or creating directories
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Input document or fragment does not exist
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Input document or fragment exists but could not be read as UTF-8 text
    #[error("Cannot read {path}: {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Nested inclusion went deeper than the configured bound
    #[error("Maximum inclusion depth of {max_depth} exceeded while including {fragment}")]
    IncludeDepthExceeded { fragment: String, max_depth: usize },

    /// Two sources in one run resolve to the same output file
    #[error("Output {path} would be written by both {first} and {second}")]
    OutputCollision {
        path: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("No input file specified")]
    MissingInput,

    #[error("No output folder specified")]
    MissingOutputDir,

    #[error("Invalid format: {format} (expected json or html)")]
    InvalidFormat { format: String },

    /// Markdown that cannot be turned into a section outline
    #[error("Malformed outline in {source_path}: {message}")]
    Outline { source_path: String, message: String },

    /// Template loading or rendering error
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// Regex compilation error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error while walking a source directory
    #[error("Directory traversal error: {0}")]
    Walk(#[from] ignore::Error),

    /// Invalid exclude pattern
    #[error("Invalid exclude pattern: {0}")]
    Glob(#[from] globset::Error),
}

pub type Result<T> = std::result::Result<T, DocgenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DocgenError::FileNotFound {
            path: PathBuf::from("/docs/api/fs.markdown"),
        };
        assert_eq!(format!("{err}"), "File not found: /docs/api/fs.markdown");

        let err = DocgenError::IncludeDepthExceeded {
            fragment: "loop.markdown".to_string(),
            max_depth: 4,
        };
        assert_eq!(
            format!("{err}"),
            "Maximum inclusion depth of 4 exceeded while including loop.markdown"
        );

        let err = DocgenError::InvalidFormat {
            format: "pdf".to_string(),
        };
        assert_eq!(format!("{err}"), "Invalid format: pdf (expected json or html)");

        assert_eq!(
            format!("{}", DocgenError::MissingInput),
            "No input file specified"
        );
        assert_eq!(
            format!("{}", DocgenError::MissingOutputDir),
            "No output folder specified"
        );

        let err = DocgenError::OutputCollision {
            path: PathBuf::from("out/a.html"),
            first: PathBuf::from("src/a.markdown"),
            second: PathBuf::from("src/x.markdown"),
        };
        assert_eq!(
            format!("{err}"),
            "Output out/a.html would be written by both src/a.markdown and src/x.markdown"
        );

        let err = DocgenError::Outline {
            source_path: "fs.markdown".to_string(),
            message: "heading jumps".to_string(),
        };
        assert!(format!("{err}").contains("fs.markdown"));
    }

    #[test]
    fn test_unreadable_keeps_source() {
        use std::error::Error as _;

        let err = DocgenError::FileUnreadable {
            path: PathBuf::from("bad.markdown"),
            source: io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8"),
        };
        assert!(format!("{err}").starts_with("Cannot read bad.markdown"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "test");
        let err: DocgenError = io_err.into();
        assert!(matches!(err, DocgenError::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: DocgenError = json_err.into();
        assert!(matches!(err, DocgenError::Json(_)));
    }
}
