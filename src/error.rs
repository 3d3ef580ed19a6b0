use crate::config::ConfigError;
use crate::source::SourceError;

/// Top-level error for the dashboard and batch entry points
#[derive(Debug)]
pub enum TopError {
    Io(std::io::Error),
    Source(SourceError),
    Config(ConfigError),
}

impl From<std::io::Error> for TopError {
    fn from(err: std::io::Error) -> Self {
        TopError::Io(err)
    }
}

impl From<SourceError> for TopError {
    fn from(err: SourceError) -> Self {
        TopError::Source(err)
    }
}

impl From<ConfigError> for TopError {
    fn from(err: ConfigError) -> Self {
        TopError::Config(err)
    }
}

impl std::fmt::Display for TopError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopError::Io(e) => write!(f, "IO error: {}", e),
            TopError::Source(e) => write!(f, "Source error: {}", e),
            TopError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for TopError {}
