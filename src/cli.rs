//! Command-line surface
//!
//! Mode flags belong to tagtop itself; the rest are source options and are
//! forwarded to [`SourceOptions::arg`](crate::source::SourceOptions::arg)
//! as `(code, argument)` pairs.

use crate::aggregator_core::KeyMode;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "tagtop", version, about = "Live top-N view of a tagged record log")]
pub struct Cli {
    /// Drain the log once and print the ranking instead of the dashboard
    #[arg(short = '1')]
    pub once: bool,

    /// Group on the first field of each payload (up to whitespace or ':')
    #[arg(short = 'f')]
    pub field: bool,

    /// Log instance to open
    #[arg(short = 'n', value_name = "NAME")]
    pub instance: Option<String>,

    /// Read from the start of the log instead of tailing it
    #[arg(short = 'd')]
    pub from_start: bool,

    /// Read records from this file ('-' for standard input)
    #[arg(short = 'r', value_name = "FILE")]
    pub file: Option<String>,

    /// Only include records with this tag
    #[arg(short = 'i', value_name = "TAG")]
    pub include_tags: Vec<String>,

    /// Exclude records with this tag
    #[arg(short = 'x', value_name = "TAG")]
    pub exclude_tags: Vec<String>,

    /// Only include payloads matching this regex
    #[arg(short = 'I', value_name = "REGEX")]
    pub include_patterns: Vec<String>,

    /// Exclude payloads matching this regex
    #[arg(short = 'X', value_name = "REGEX")]
    pub exclude_patterns: Vec<String>,

    /// Case-insensitive -I/-X
    #[arg(short = 'C')]
    pub case_insensitive: bool,
}

impl Cli {
    pub fn key_mode(&self) -> KeyMode {
        if self.field {
            KeyMode::Field
        } else {
            KeyMode::Full
        }
    }

    /// Source option codes in application order
    pub fn source_args(&self) -> Vec<(char, Option<String>)> {
        let mut args = Vec::new();
        if self.case_insensitive {
            args.push(('C', None));
        }
        if self.from_start || self.once {
            args.push(('d', None));
        }
        if let Some(file) = &self.file {
            args.push(('r', Some(file.clone())));
        }
        let repeated = [
            ('i', &self.include_tags),
            ('x', &self.exclude_tags),
            ('I', &self.include_patterns),
            ('X', &self.exclude_patterns),
        ];
        for (code, values) in repeated {
            args.extend(values.iter().map(|v| (code, Some(v.clone()))));
        }
        args
    }
}
