//! Source option codes and opening a log
//!
//! Options are single-character codes, most with no argument:
//!
//! - `d` - read from the start of the log instead of tailing it
//! - `r <file>` - read this file (`-` is standard input)
//! - `i <tag>` / `x <tag>` - include only / exclude a tag (repeatable)
//! - `I <regex>` / `X <regex>` - include only / exclude matching payloads
//! - `C` - case-insensitive `I`/`X` patterns

use super::{FrameSource, RecordFilter, SourceError};
use crate::tags::parse_tag;
use regex::bytes::{Regex, RegexBuilder};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Instance opened when no name is given
pub const DEFAULT_INSTANCE: &str = "default";

/// Extension of per-instance log files under the log directory
pub const LOG_EXTENSION: &str = "tlog";

/// Source that `SourceOptions::open` produces
pub type LogSource = FrameSource<Box<dyn Read + Send>>;

#[derive(Debug, Clone)]
pub struct SourceOptions {
    log_dir: PathBuf,
    from_start: bool,
    file: Option<PathBuf>,
    include_tags: Vec<u8>,
    exclude_tags: Vec<u8>,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
    case_insensitive: bool,
}

impl SourceOptions {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            from_start: false,
            file: None,
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            case_insensitive: false,
        }
    }

    /// Apply one option code
    pub fn arg(&mut self, code: char, value: Option<&str>) -> Result<(), SourceError> {
        match code {
            'd' => self.from_start = true,
            'C' => self.case_insensitive = true,
            'r' => self.file = Some(PathBuf::from(required(code, value)?)),
            'i' => self.include_tags.push(resolve_tag(required(code, value)?)?),
            'x' => self.exclude_tags.push(resolve_tag(required(code, value)?)?),
            'I' => self.include_patterns.push(required(code, value)?.to_string()),
            'X' => self.exclude_patterns.push(required(code, value)?.to_string()),
            _ => return Err(SourceError::UnknownOption(code)),
        }
        Ok(())
    }

    pub fn from_start(&self) -> bool {
        self.from_start
    }

    /// Path a given instance name resolves to
    pub fn instance_path(&self, instance: Option<&str>) -> PathBuf {
        let name = instance.unwrap_or(DEFAULT_INSTANCE);
        self.log_dir.join(format!("{}.{}", name, LOG_EXTENSION))
    }

    /// Compile the filter and open the log
    ///
    /// An explicit `r` file wins over the instance name; the source is named
    /// after whichever was used.
    pub fn open(self, instance: Option<&str>) -> Result<LogSource, SourceError> {
        let filter = self.build_filter()?;

        let source = match &self.file {
            Some(path) if path == Path::new("-") => {
                log::info!("📖 Reading records from standard input");
                let stdin: Box<dyn Read + Send> = Box::new(std::io::stdin());
                FrameSource::new(stdin, "stdin").without_follow()
            }
            Some(path) => {
                let file = open_log(path, self.from_start)?;
                FrameSource::new(file, path.display().to_string())
            }
            None => {
                let path = self.instance_path(instance);
                let file = open_log(&path, self.from_start)?;
                FrameSource::new(file, instance.unwrap_or(DEFAULT_INSTANCE))
            }
        };

        if !filter.is_empty() {
            log::info!("   Source filter active");
        }
        Ok(source.with_filter(filter))
    }

    fn build_filter(&self) -> Result<RecordFilter, SourceError> {
        let compile = |patterns: &[String]| -> Result<Vec<Regex>, SourceError> {
            patterns
                .iter()
                .map(|p| {
                    RegexBuilder::new(p)
                        .case_insensitive(self.case_insensitive)
                        .build()
                        .map_err(SourceError::from)
                })
                .collect()
        };

        Ok(RecordFilter::new(
            self.include_tags.clone(),
            self.exclude_tags.clone(),
            compile(&self.include_patterns)?,
            compile(&self.exclude_patterns)?,
        ))
    }
}

fn required(code: char, value: Option<&str>) -> Result<&str, SourceError> {
    value.ok_or(SourceError::MissingArgument(code))
}

fn resolve_tag(value: &str) -> Result<u8, SourceError> {
    parse_tag(value).ok_or_else(|| SourceError::UnknownTag(value.to_string()))
}

fn open_log(path: &Path, from_start: bool) -> Result<Box<dyn Read + Send>, SourceError> {
    let mut file = File::open(path)?;
    if !from_start {
        file.seek(SeekFrom::End(0))?;
    }
    log::info!(
        "📖 Opened {} ({})",
        path.display(),
        if from_start { "from start" } else { "tailing" }
    );
    Ok(Box::new(file))
}
