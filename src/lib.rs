//! tagtop - live top-N view of a tagged record log
//!
//! Records pulled from a [`source::RecordSource`] are grouped by tag and key
//! into an [`aggregator_core::Aggregator`] whose counts decay once per
//! refresh. The [`ui`] dashboard shows the hottest groups; [`batch`] drains
//! the log once and prints the final ranking.

pub mod aggregator_core;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod source;
pub mod tags;
pub mod ui;

pub use config::TopConfig;
pub use error::TopError;
