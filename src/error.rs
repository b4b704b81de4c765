use std::path::PathBuf;

/// Errors that can occur while calling FGFR1 ITDs.
#[derive(Debug, thiserror::Error)]
pub enum ItdError {
    #[error("I/O error: {source} ({path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("breakpoint BED file is missing required exon coordinates ({})", .labels.join(", "))]
    MissingCoordinates { labels: Vec<String> },

    #[error("{kind} does not exist: {}", .path.display())]
    Preflight { kind: String, path: PathBuf },

    #[error("variant caller failed ({status}):\n{output}")]
    Caller { status: String, output: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("run summary failed schema validation: {0}")]
    Schema(String),
}

impl ItdError {
    /// Wrap an `io::Error` with the path it happened on.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: path.into(),
        }
    }
}

impl From<std::io::Error> for ItdError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            source: err,
            path: PathBuf::from("<stream>"),
        }
    }
}

pub type Result<T> = std::result::Result<T, ItdError>;
