//! Terminal input polling
//!
//! The dashboard only sees [`Input`] classes; the crossterm implementation
//! maps raw key events onto them.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io::{self, Write};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Quit,
    /// Clear and repaint (also sent on resize)
    Redraw,
    /// Hand the terminal back and stop the process (job control)
    Suspend,
    Interrupt,
    Unrecognized,
}

pub trait InputEvents {
    /// Wait up to `timeout` for one input; `None` when nothing relevant arrived
    fn poll_input(&mut self, timeout: Duration) -> io::Result<Option<Input>>;

    /// Audible alert for unrecognized keys
    fn alert(&mut self) -> io::Result<()>;
}

pub struct CrosstermInput;

impl InputEvents for CrosstermInput {
    fn poll_input(&mut self, timeout: Duration) -> io::Result<Option<Input>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        Ok(classify(&event::read()?))
    }

    fn alert(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();
        stdout.write_all(b"\x07")?;
        stdout.flush()
    }
}

/// Map a terminal event onto an input class; non-key events other than
/// resize are ignored
pub fn classify(event: &Event) -> Option<Input> {
    match event {
        Event::Resize(_, _) => Some(Input::Redraw),
        Event::Key(key) if key.kind != KeyEventKind::Release => Some(classify_key(key)),
        _ => None,
    }
}

fn classify_key(key: &KeyEvent) -> Input {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => Input::Quit,
        KeyCode::Char(c) if ctrl => match c.to_ascii_lowercase() {
            'l' | 't' => Input::Redraw,
            'z' => Input::Suspend,
            'c' => Input::Interrupt,
            _ => Input::Unrecognized,
        },
        _ => Input::Unrecognized,
    }
}
