//! Signal delivery for the suspend and interrupt keys
//!
//! In raw mode the terminal no longer turns Ctrl-Z / Ctrl-C into signals, so
//! the dashboard raises them itself, giving the terminal back first.

use super::terminal::{enter_screen, leave_screen};
use std::io;

pub trait JobControl {
    /// Stop the process until it is continued
    fn suspend(&mut self) -> io::Result<()>;

    fn interrupt(&mut self) -> io::Result<()>;
}

/// Delivers real signals to this process
pub struct ProcessJobControl;

impl JobControl for ProcessJobControl {
    fn suspend(&mut self) -> io::Result<()> {
        leave_screen()?;
        raise(libc::SIGTSTP)?;
        // Continued by the shell
        enter_screen()
    }

    fn interrupt(&mut self) -> io::Result<()> {
        leave_screen()?;
        raise(libc::SIGINT)?;
        // Still alive when SIGINT is caught or ignored
        enter_screen()
    }
}

fn raise(signal: libc::c_int) -> io::Result<()> {
    // SAFETY: raise(3) has no memory-safety preconditions
    if unsafe { libc::raise(signal) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
