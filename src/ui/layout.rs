use {
    super::renderer::format_row,
    crate::{aggregator_core::TickSnapshot, ingestion::SourceStatus},
    ratatui::{
        layout::Rect,
        style::{Color, Modifier, Style},
        text::{Line, Span},
        widgets::Paragraph,
        Frame,
    },
};

/// Everything one paint needs, gathered outside the aggregator lock
pub struct DashboardView<'a> {
    pub snapshot: &'a TickSnapshot,
    pub source_name: &'a str,
    pub status: &'a SourceStatus,
}

/// Body rows available on a terminal of `height` lines (header + blank line
/// above the body)
pub fn visible_rows(height: u16) -> usize {
    (height as usize).saturating_sub(2).max(1)
}

/// Render the dashboard: header, blank line, one row per visible group
pub fn render_layout(f: &mut Frame, area: Rect, view: &DashboardView) {
    let mut lines = Vec::with_capacity(view.snapshot.rows.len() + 2);
    lines.push(header_line(view, area.width));
    lines.push(Line::default());

    let body = visible_rows(area.height);
    lines.extend(
        view.snapshot
            .rows
            .iter()
            .take(body)
            .map(|row| Line::raw(format_row(row, area.width))),
    );

    f.render_widget(Paragraph::new(lines), area);
}

/// `list length N` on the left, source identifier right-aligned
fn header_line<'a>(view: &DashboardView<'a>, width: u16) -> Line<'a> {
    let left = format!("list length {}", view.snapshot.live_groups);
    let notice = view
        .status
        .notice()
        .map(|n| format!("  {}", n))
        .unwrap_or_default();

    let used = left.chars().count() + notice.chars().count();
    let name_len = view.source_name.chars().count();
    let line_width = (width as usize).saturating_sub(1);

    let mut spans = vec![
        Span::styled(left, Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(notice, Style::default().fg(Color::Red)),
    ];
    if used + 1 + name_len <= line_width {
        spans.push(Span::raw(" ".repeat(line_width - used - name_len)));
        spans.push(Span::styled(view.source_name, Style::default().fg(Color::Cyan)));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator_core::GroupView;
    use chrono::Local;
    use ratatui::{backend::TestBackend, Terminal};

    fn snapshot(rows: usize) -> TickSnapshot {
        TickSnapshot {
            rows: (0..rows)
                .map(|i| GroupView {
                    count: (rows - i) as f64,
                    tag: 19,
                    payload: format!("/p{}", i).into_bytes(),
                })
                .collect(),
            live_groups: rows + 5,
            evicted: 0,
        }
    }

    fn screen(terminal: &Terminal<TestBackend>) -> Vec<String> {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer.get(x, y).symbol())
                    .collect::<String>()
            })
            .collect()
    }

    fn paint(width: u16, height: u16, view: &DashboardView) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| {
                let area = f.size();
                render_layout(f, area, view)
            })
            .unwrap();
        screen(&terminal)
    }

    #[test]
    fn test_visible_rows() {
        assert_eq!(visible_rows(24), 22);
        assert_eq!(visible_rows(2), 1);
        assert_eq!(visible_rows(0), 1);
    }

    #[test]
    fn test_header_and_rows() {
        let snapshot = snapshot(2);
        let status = SourceStatus::Streaming;
        let view = DashboardView {
            snapshot: &snapshot,
            source_name: "edge",
            status: &status,
        };

        let lines = paint(40, 6, &view);
        assert!(lines[0].starts_with("list length 7"));
        assert_eq!(lines[0].trim_end().len(), 39);
        assert!(lines[0].trim_end().ends_with("edge"));
        assert_eq!(lines[1].trim(), "");
        assert!(lines[2].starts_with("     2.00 RxURL     /p0"));
        assert!(lines[3].starts_with("     1.00 RxURL     /p1"));
        assert_eq!(lines[4].trim(), "");
    }

    #[test]
    fn test_body_bounded_by_height() {
        let snapshot = snapshot(10);
        let status = SourceStatus::Streaming;
        let view = DashboardView {
            snapshot: &snapshot,
            source_name: "edge",
            status: &status,
        };

        let lines = paint(40, 5, &view);
        assert_eq!(lines.len(), 5);
        assert!(lines[4].contains("/p2"));
    }

    #[test]
    fn test_stopped_source_notice() {
        let snapshot = snapshot(1);
        let status = SourceStatus::Failed {
            reason: "IO error: broken pipe".to_string(),
            at: Local::now(),
        };
        let view = DashboardView {
            snapshot: &snapshot,
            source_name: "edge",
            status: &status,
        };

        let lines = paint(100, 4, &view);
        assert!(lines[0].contains("[source stopped: IO error: broken pipe at "));
    }
}
