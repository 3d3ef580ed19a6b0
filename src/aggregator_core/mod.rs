//! Aggregator Core - decaying top-N over tagged records
//!
//! # Architecture
//!
//! ```text
//! Record (tag, payload) → KeyMode::derive (key prefix + additive hash)
//!     ↓
//! Aggregator::accumulate (match-or-create, adjacent-swap repair)
//!     ↓
//! Aggregator::tick (decay, snapshot visible rows, evict)
//! ```

pub mod aggregator;
pub mod key;
pub mod record;

pub use aggregator::{
    lock_aggregator, Accumulated, Aggregator, DecayPolicy, Group, GroupView, SharedAggregator,
    TickSnapshot,
};
pub use key::{key_hash, KeyInfo, KeyMode};
pub use record::Record;
