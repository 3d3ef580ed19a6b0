// Row formatting for the dashboard body

use crate::aggregator_core::GroupView;
use crate::tags::tag_label;

/// Columns taken by the count and tag name ahead of the key
pub const ROW_PREFIX_WIDTH: usize = 20;

/// Format one body row: `count tag-name key`
///
/// Key bytes are cut to `width - 20` before decoding so the row fits.
pub fn format_row(row: &GroupView, width: u16) -> String {
    let room = (width as usize).saturating_sub(ROW_PREFIX_WIDTH);
    let key = &row.payload[..row.payload.len().min(room)];
    format!("{:9.2} {:<9.9} {}", row.count, tag_label(row.tag), printable(key))
}

/// Lossy UTF-8 with control characters replaced so they cannot move the cursor
pub fn printable(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .map(|c| if c.is_control() { '.' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(count: f64, tag: u8, payload: &str) -> GroupView {
        GroupView {
            count,
            tag,
            payload: payload.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_format_row() {
        let row = format_row(&view(12.5, 19, "/index.html"), 80);
        assert_eq!(row, "    12.50 RxURL     /index.html");
    }

    #[test]
    fn test_long_tag_name_is_cut() {
        let row = format_row(&view(1.0, 6, "x"), 80);
        assert_eq!(row, "     1.00 SessionOp x");
    }

    #[test]
    fn test_key_truncated_to_width() {
        let row = format_row(&view(3.0, 19, "/abcdefghij"), 25);
        assert!(row.ends_with(" /abcd"), "{}", row);
        let narrow = format_row(&view(3.0, 19, "/abc"), 10);
        assert!(narrow.ends_with("RxURL     "), "{:?}", narrow);
    }

    #[test]
    fn test_unknown_tag_and_control_bytes() {
        let row = format_row(&view(2.0, 250, "a\tb\x1b"), 80);
        assert_eq!(row, "     2.00 250       a.b.");
    }
}
