//! Tagged log records and their frame encoding
//!
//! Frame layout: `[tag:1][len:1][reserved:2][payload:len]`. The single-byte
//! length field bounds every payload to 255 bytes.

/// Size of the fixed frame header
pub const HEADER_LEN: usize = 4;

/// Largest payload a frame can carry
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// One tagged record pulled from a log source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub tag: u8,
    payload: Vec<u8>,
}

impl Record {
    /// Build a record, truncating the payload to what a frame can carry
    pub fn new(tag: u8, payload: &[u8]) -> Self {
        let len = payload.len().min(MAX_PAYLOAD);
        Self {
            tag,
            payload: payload[..len].to_vec(),
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Decode the first frame in `buf`
    ///
    /// Returns the record and the number of bytes consumed, or `None` when
    /// `buf` does not yet hold a complete frame.
    pub fn from_frame(buf: &[u8]) -> Option<(Self, usize)> {
        if buf.len() < HEADER_LEN {
            return None;
        }
        let len = buf[1] as usize;
        let end = HEADER_LEN + len;
        if buf.len() < end {
            return None;
        }
        let record = Self {
            tag: buf[0],
            payload: buf[HEADER_LEN..end].to_vec(),
        };
        Some((record, end))
    }

    /// Encode as a frame; the reserved bytes are written as zero
    pub fn to_frame(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(HEADER_LEN + self.payload.len());
        frame.push(self.tag);
        frame.push(self.payload.len() as u8);
        frame.extend_from_slice(&[0, 0]);
        frame.extend_from_slice(&self.payload);
        frame
    }
}
