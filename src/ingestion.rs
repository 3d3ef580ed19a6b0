//! Ingestion loop - pulls records and feeds the shared aggregator
//!
//! Sources read with plain blocking I/O (a quiet pipe can block a read
//! indefinitely), so the loop runs on tokio's blocking pool rather than as an
//! async task. The aggregator lock is held for exactly one `accumulate` call;
//! an idle source is retried after a short sleep. When the source ends or
//! fails the loop stops and publishes the reason on the status channel so the
//! dashboard can show it.

use crate::aggregator_core::{lock_aggregator, SharedAggregator};
use crate::source::{Pull, RecordSource};
use chrono::{DateTime, Local};
use std::thread;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Producer state as seen by the dashboard
#[derive(Debug, Clone, PartialEq)]
pub enum SourceStatus {
    Streaming,
    Ended { at: DateTime<Local> },
    Failed { reason: String, at: DateTime<Local> },
}

impl SourceStatus {
    pub fn is_stopped(&self) -> bool {
        !matches!(self, SourceStatus::Streaming)
    }

    /// Short notice for the dashboard header, `None` while streaming
    pub fn notice(&self) -> Option<String> {
        match self {
            SourceStatus::Streaming => None,
            SourceStatus::Ended { at } => Some(format!(
                "[source stopped: end of stream at {}]",
                at.format("%H:%M:%S")
            )),
            SourceStatus::Failed { reason, at } => Some(format!(
                "[source stopped: {} at {}]",
                reason,
                at.format("%H:%M:%S")
            )),
        }
    }
}

/// Run [`run_ingestion`] on the blocking pool
pub fn spawn_ingestion<S: RecordSource + 'static>(
    source: S,
    aggregator: SharedAggregator,
    idle_backoff: Duration,
    status: watch::Sender<SourceStatus>,
) -> JoinHandle<u64> {
    tokio::task::spawn_blocking(move || run_ingestion(source, aggregator, idle_backoff, status))
}

/// Pull from `source` until it ends or fails
///
/// Blocks the calling thread. Returns the number of records accumulated.
pub fn run_ingestion<S: RecordSource>(
    mut source: S,
    aggregator: SharedAggregator,
    idle_backoff: Duration,
    status: watch::Sender<SourceStatus>,
) -> u64 {
    log::info!("🚀 Ingestion started ({})", source.name());

    let mut records = 0u64;
    let stopped = loop {
        match source.next_record() {
            Pull::Record(record) => {
                lock_aggregator(&aggregator).accumulate(&record);
                records += 1;
            }
            Pull::Idle => thread::sleep(idle_backoff),
            Pull::End => {
                log::info!("Source {} reached end of stream", source.name());
                break SourceStatus::Ended { at: Local::now() };
            }
            Pull::Error(e) => {
                log::info!("Source {} failed: {}", source.name(), e);
                break SourceStatus::Failed {
                    reason: e.to_string(),
                    at: Local::now(),
                };
            }
        }
    };

    log::info!("Ingestion stopped after {} records", records);
    status.send_replace(stopped);
    records
}
