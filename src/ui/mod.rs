//! Interactive dashboard
//!
//! `terminal` owns the refresh loop, `layout` and `renderer` turn a tick
//! snapshot into lines, `input` and `job_control` are the seams to the real
//! terminal and process signals.

pub mod input;
pub mod job_control;
pub mod layout;
pub mod renderer;
pub mod terminal;

pub use input::{CrosstermInput, Input, InputEvents};
pub use job_control::{JobControl, ProcessJobControl};
pub use terminal::{run_ui, Dashboard, Flow};
