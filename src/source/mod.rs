//! Record sources
//!
//! A source is pulled one record at a time by the ingestion loop (or the
//! batch reporter). Options are applied to [`SourceOptions`] before it is
//! opened; filtering happens inside the source.

pub mod filter;
pub mod frame_reader;
pub mod options;

use crate::aggregator_core::Record;

pub use filter::RecordFilter;
pub use frame_reader::FrameSource;
pub use options::SourceOptions;

/// Result of one pull from a source
#[derive(Debug)]
pub enum Pull {
    Record(Record),
    /// Nothing available right now; try again later
    Idle,
    /// The source is exhausted
    End,
    Error(SourceError),
}

/// Pull-based producer of tagged records
pub trait RecordSource: Send {
    fn next_record(&mut self) -> Pull;

    /// In non-blocking mode running out of data ends the stream instead of
    /// reporting `Idle`
    fn set_non_blocking(&mut self, non_blocking: bool);

    /// Identifier shown in the dashboard header
    fn name(&self) -> &str;
}

#[derive(Debug)]
pub enum SourceError {
    Io(std::io::Error),
    UnknownOption(char),
    MissingArgument(char),
    UnknownTag(String),
    Pattern(regex::Error),
    /// The stream ended inside a frame
    Truncated { buffered: usize },
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err)
    }
}

impl From<regex::Error> for SourceError {
    fn from(err: regex::Error) -> Self {
        SourceError::Pattern(err)
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Io(e) => write!(f, "IO error: {}", e),
            SourceError::UnknownOption(code) => write!(f, "unknown source option -{}", code),
            SourceError::MissingArgument(code) => write!(f, "option -{} requires an argument", code),
            SourceError::UnknownTag(tag) => write!(f, "unknown tag: {}", tag),
            SourceError::Pattern(e) => write!(f, "bad pattern: {}", e),
            SourceError::Truncated { buffered } => {
                write!(f, "stream ended inside a frame ({} bytes buffered)", buffered)
            }
        }
    }
}

impl std::error::Error for SourceError {}
