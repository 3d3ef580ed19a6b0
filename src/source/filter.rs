//! Source-side record filtering (tag include/exclude, payload patterns)

use crate::aggregator_core::Record;
use regex::bytes::Regex;

#[derive(Debug, Default)]
pub struct RecordFilter {
    include_tags: Vec<u8>,
    exclude_tags: Vec<u8>,
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl RecordFilter {
    pub fn new(
        include_tags: Vec<u8>,
        exclude_tags: Vec<u8>,
        include: Vec<Regex>,
        exclude: Vec<Regex>,
    ) -> Self {
        Self {
            include_tags,
            exclude_tags,
            include,
            exclude,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.include_tags.is_empty()
            && self.exclude_tags.is_empty()
            && self.include.is_empty()
            && self.exclude.is_empty()
    }

    pub fn accepts(&self, record: &Record) -> bool {
        if !self.include_tags.is_empty() && !self.include_tags.contains(&record.tag) {
            return false;
        }
        if self.exclude_tags.contains(&record.tag) {
            return false;
        }
        let payload = record.payload();
        if !self.include.is_empty() && !self.include.iter().any(|re| re.is_match(payload)) {
            return false;
        }
        !self.exclude.iter().any(|re| re.is_match(payload))
    }
}
