//! Framed log reader
//!
//! Reads back-to-back `[tag][len][reserved:2][payload]` frames from any
//! `Read`. A followed file that has no more bytes yet is `Idle`; a partial
//! frame at the end stays buffered until the rest is appended.

use super::{Pull, RecordFilter, RecordSource, SourceError};
use crate::aggregator_core::Record;
use std::io::{ErrorKind, Read};

const READ_CHUNK: usize = 8192;

pub struct FrameSource<R> {
    reader: R,
    name: String,
    filter: RecordFilter,
    buf: Vec<u8>,
    pos: usize,
    /// The underlying file may still grow, so running dry is not the end
    follow: bool,
    non_blocking: bool,
}

impl<R> std::fmt::Debug for FrameSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSource")
            .field("name", &self.name)
            .field("filter", &self.filter)
            .field("pos", &self.pos)
            .field("follow", &self.follow)
            .field("non_blocking", &self.non_blocking)
            .finish_non_exhaustive()
    }
}

impl<R: Read> FrameSource<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            name: name.into(),
            filter: RecordFilter::default(),
            buf: Vec::with_capacity(READ_CHUNK),
            pos: 0,
            follow: true,
            non_blocking: false,
        }
    }

    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Treat end of input as end of stream even in blocking mode (pipes)
    pub fn without_follow(mut self) -> Self {
        self.follow = false;
        self
    }

    fn take_frame(&mut self) -> Option<Record> {
        while let Some((record, used)) = Record::from_frame(&self.buf[self.pos..]) {
            self.pos += used;
            if self.filter.accepts(&record) {
                return Some(record);
            }
        }
        None
    }

    fn compact(&mut self) {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
    }

    fn run_dry(&mut self) -> Pull {
        if self.follow && !self.non_blocking {
            return Pull::Idle;
        }
        if self.buf.is_empty() {
            return Pull::End;
        }
        let buffered = self.buf.len();
        self.buf.clear();
        Pull::Error(SourceError::Truncated { buffered })
    }
}

impl<R: Read + Send> RecordSource for FrameSource<R> {
    fn next_record(&mut self) -> Pull {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(record) = self.take_frame() {
                return Pull::Record(record);
            }
            self.compact();

            match self.reader.read(&mut chunk) {
                Ok(0) => return self.run_dry(),
                Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Pull::Idle,
                Err(e) => return Pull::Error(SourceError::Io(e)),
            }
        }
    }

    fn set_non_blocking(&mut self, non_blocking: bool) {
        self.non_blocking = non_blocking;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;

    /// Reader that hands out pre-staged chunks, then reports no data
    struct StagedReader {
        chunks: VecDeque<Vec<u8>>,
    }

    impl Read for StagedReader {
        fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
            match self.chunks.pop_front() {
                Some(chunk) => {
                    out[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => Ok(0),
            }
        }
    }

    fn frames(records: &[(u8, &str)]) -> Vec<u8> {
        records
            .iter()
            .flat_map(|(tag, payload)| Record::new(*tag, payload.as_bytes()).to_frame())
            .collect()
    }

    fn expect_record(pull: Pull) -> Record {
        match pull {
            Pull::Record(record) => record,
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_reads_frames_then_ends() {
        let data = frames(&[(19, "/a"), (21, "Host: x"), (19, "/b")]);
        let mut source = FrameSource::new(Cursor::new(data), "test");
        source.set_non_blocking(true);

        assert_eq!(expect_record(source.next_record()).payload(), b"/a");
        assert_eq!(expect_record(source.next_record()).tag, 21);
        assert_eq!(expect_record(source.next_record()).payload(), b"/b");
        assert!(matches!(source.next_record(), Pull::End));
        assert!(matches!(source.next_record(), Pull::End));
    }

    #[test]
    fn test_followed_input_goes_idle() {
        let data = frames(&[(19, "/a")]);
        let mut source = FrameSource::new(Cursor::new(data), "test");

        expect_record(source.next_record());
        assert!(matches!(source.next_record(), Pull::Idle));
    }

    #[test]
    fn test_unfollowed_input_ends() {
        let mut source = FrameSource::new(Cursor::new(Vec::new()), "stdin").without_follow();
        assert!(matches!(source.next_record(), Pull::End));
    }

    #[test]
    fn test_partial_frame_completed_later() {
        let frame = Record::new(19, b"/split").to_frame();
        let reader = StagedReader {
            chunks: VecDeque::from(vec![frame[..3].to_vec(), Vec::new(), frame[3..].to_vec()]),
        };
        let mut source = FrameSource::new(reader, "test");

        // First read stages 3 bytes, then the reader runs dry
        assert!(matches!(source.next_record(), Pull::Idle));
        assert_eq!(expect_record(source.next_record()).payload(), b"/split");
    }

    #[test]
    fn test_truncated_frame_in_non_blocking_mode() {
        let mut data = frames(&[(19, "/ok")]);
        data.extend_from_slice(&[19, 10, 0, 0, b'/']);
        let mut source = FrameSource::new(Cursor::new(data), "test");
        source.set_non_blocking(true);

        expect_record(source.next_record());
        assert!(matches!(
            source.next_record(),
            Pull::Error(SourceError::Truncated { buffered: 5 })
        ));
        assert!(matches!(source.next_record(), Pull::End));
    }

    #[test]
    fn test_filter_skips_records() {
        let data = frames(&[(2, "err"), (19, "/a"), (2, "err")]);
        let filter = RecordFilter::new(vec![19], vec![], vec![], vec![]);
        let mut source = FrameSource::new(Cursor::new(data), "test").with_filter(filter);
        source.set_non_blocking(true);

        assert_eq!(expect_record(source.next_record()).tag, 19);
        assert!(matches!(source.next_record(), Pull::End));
    }
}
