use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Source unreadable: {0}")]
    SourceUnreadable(String),
}

impl Error {
    /// Whether this failure means the source is simply absent, as opposed to
    /// present but broken.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::SourceNotFound(_) => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
