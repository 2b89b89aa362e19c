use std::path::PathBuf;

/// Errors from the ambient surfaces of the pipeline: reading inputs,
/// loading configuration, writing output and running the dev server.
///
/// Extraction, normalization, patching and synthesis never fail; they
/// degrade to their input instead.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// Filesystem access failed.
    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A chat transcript was not valid JSON or not a message list.
    #[error("invalid transcript '{}': {source}", path.display())]
    Transcript {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A configuration file could not be parsed.
    #[error("invalid config '{}': {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The dev server could not start or stopped unexpectedly.
    #[error("dev server: {0}")]
    Server(String),
}

pub type Result<T> = std::result::Result<T, PreviewError>;

/// Shorthand constructors.
impl PreviewError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn server(msg: impl std::fmt::Display) -> Self {
        Self::Server(msg.to_string())
    }
}
