//! Tag-name table
//!
//! Display names for record tags, indexed by the raw tag byte. Index 0 is
//! reserved and has no name.

const TAG_NAMES: &[&str] = &[
    "",
    "Debug",
    "Error",
    "CLI",
    "StatSess",
    "ReqEnd",
    "SessionOpen",
    "SessionClose",
    "BackendOpen",
    "BackendXID",
    "BackendReuse",
    "BackendClose",
    "HttpGarbage",
    "Backend",
    "Length",
    "FetchError",
    "RxRequest",
    "RxResponse",
    "RxStatus",
    "RxURL",
    "RxProtocol",
    "RxHeader",
    "TxRequest",
    "TxResponse",
    "TxStatus",
    "TxURL",
    "TxProtocol",
    "TxHeader",
    "ObjRequest",
    "ObjResponse",
    "ObjStatus",
    "ObjURL",
    "ObjProtocol",
    "ObjHeader",
    "LostHeader",
    "TTL",
    "VCL_acl",
    "VCL_call",
    "VCL_trace",
    "VCL_return",
    "ReqStart",
    "Hit",
    "HitPass",
    "ExpBan",
    "ExpKill",
    "WorkThread",
    "ESI_xmlerror",
    "Hash",
];

/// Name for a tag byte, `None` when the table has no entry for it
pub fn tag_name(tag: u8) -> Option<&'static str> {
    TAG_NAMES
        .get(tag as usize)
        .copied()
        .filter(|name| !name.is_empty())
}

/// Display label for a tag; unknown tags render as their decimal value
pub fn tag_label(tag: u8) -> String {
    match tag_name(tag) {
        Some(name) => name.to_string(),
        None => tag.to_string(),
    }
}

/// Resolve a tag given by name (case-insensitive) or decimal number
pub fn parse_tag(s: &str) -> Option<u8> {
    if let Ok(n) = s.parse::<u8>() {
        return Some(n);
    }
    TAG_NAMES
        .iter()
        .position(|name| !name.is_empty() && name.eq_ignore_ascii_case(s))
        .map(|idx| idx as u8)
}
