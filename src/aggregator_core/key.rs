//! Key derivation and the additive pre-filter hash

/// How the matching key is cut from a record payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMode {
    /// The whole payload is the key
    #[default]
    Full,
    /// The key stops at the first whitespace or `:` byte
    Field,
}

/// Key length and hash derived from one payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInfo {
    pub len: usize,
    pub hash: u32,
}

impl KeyMode {
    /// Length of the key prefix of `payload` and its additive hash
    pub fn derive(self, payload: &[u8]) -> KeyInfo {
        let len = match self {
            KeyMode::Full => payload.len(),
            KeyMode::Field => payload
                .iter()
                .position(|&b| is_field_break(b))
                .unwrap_or(payload.len()),
        };
        KeyInfo {
            len,
            hash: key_hash(&payload[..len]),
        }
    }
}

/// Wrapping sum of the key bytes; a cheap reject before full comparison
pub fn key_hash(key: &[u8]) -> u32 {
    key.iter().fold(0u32, |acc, &b| acc.wrapping_add(b as u32))
}

fn is_field_break(b: u8) -> bool {
    // Same set as C isspace(): space, \t, \n, \v, \f, \r
    b == b':' || b == b' ' || (b'\t'..=b'\r').contains(&b)
}
