//! One-shot batch report
//!
//! Drains the source without pacing, then prints every group whose count is
//! above 1.0 in rank order. No ticks run, so nothing decays or is evicted.

use crate::aggregator_core::Aggregator;
use crate::error::TopError;
use crate::source::{Pull, RecordSource};
use std::io::Write;

/// Counts at or below this are left out of the report
pub const REPORT_THRESHOLD: f64 = 1.0;

/// How the drain loop finished
#[derive(Debug, Clone, PartialEq)]
pub enum DrainOutcome {
    Exhausted,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub records: u64,
    pub groups: usize,
    pub printed: usize,
    pub outcome: DrainOutcome,
}

/// Feed every record from `source` into `aggregator`
///
/// In non-blocking mode an idle source has nothing left, so `Idle` ends the
/// drain like `End` does. A source error also ends it; what was read so far
/// is kept.
pub fn drain<S: RecordSource>(source: &mut S, aggregator: &mut Aggregator) -> (u64, DrainOutcome) {
    let mut records = 0u64;
    loop {
        match source.next_record() {
            Pull::Record(record) => {
                aggregator.accumulate(&record);
                records += 1;
            }
            Pull::Idle | Pull::End => return (records, DrainOutcome::Exhausted),
            Pull::Error(e) => {
                log::warn!("Source {} failed: {}", source.name(), e);
                return (records, DrainOutcome::Failed(e.to_string()));
            }
        }
    }
}

/// Print `count payload` lines in rank order, stopping at the first count
/// at or below the threshold
pub fn write_report<W: Write>(aggregator: &Aggregator, out: &mut W) -> std::io::Result<usize> {
    let mut printed = 0;
    for group in aggregator
        .groups()
        .take_while(|group| group.count() > REPORT_THRESHOLD)
    {
        write!(out, "{:9.2} ", group.count())?;
        out.write_all(group.payload())?;
        out.write_all(b"\n")?;
        printed += 1;
    }
    out.flush()?;
    Ok(printed)
}

/// Drain `source` to the end and write the report to `out`
pub fn run_batch<S: RecordSource, W: Write>(
    mut source: S,
    mut aggregator: Aggregator,
    out: &mut W,
) -> Result<BatchSummary, TopError> {
    source.set_non_blocking(true);
    log::info!("📖 Draining {}", source.name());

    let (records, outcome) = drain(&mut source, &mut aggregator);
    let printed = write_report(&aggregator, out)?;

    let summary = BatchSummary {
        records,
        groups: aggregator.len(),
        printed,
        outcome,
    };
    log::info!(
        "✅ Batch done: {} records, {} groups, {} reported",
        summary.records,
        summary.groups,
        summary.printed
    );
    Ok(summary)
}
