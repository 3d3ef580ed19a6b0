//! Decaying top-N aggregator
//!
//! Groups live in an index-addressed arena linked in rank order (highest
//! count first). The same list serves lookup and ranking: `accumulate` walks
//! it to find a match and then repairs the order with adjacent swaps only,
//! `tick` decays and evicts in a single ordered pass.

use super::key::KeyMode;
use super::record::Record;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Aggregator shared between the ingestion loop and the renderer
pub type SharedAggregator = Arc<Mutex<Aggregator>>;

/// Lock the shared aggregator
///
/// A panic while holding the lock cannot leave the list half-linked (every
/// mutation completes before the guard is released), so a poisoned lock is
/// recovered rather than propagated.
pub fn lock_aggregator(shared: &SharedAggregator) -> MutexGuard<'_, Aggregator> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Decay and eviction policy applied by `tick`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayPolicy {
    /// Multiplier applied to every count once per tick
    pub decay: f64,
    /// A group is evicted when `count * evict_factor` falls below the last
    /// visible count, or when its rank exceeds `evict_factor * visible_rows`
    pub evict_factor: f64,
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self {
            decay: 0.999,
            evict_factor: 10.0,
        }
    }
}

/// One aggregation bucket for a distinct `(tag, key)`
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    tag: u8,
    /// Most recent full payload; the key is its first `keylen` bytes
    payload: Vec<u8>,
    keylen: usize,
    keyhash: u32,
    count: f64,
}

impl Group {
    pub fn tag(&self) -> u8 {
        self.tag
    }

    pub fn key(&self) -> &[u8] {
        &self.payload[..self.keylen]
    }

    pub fn keylen(&self) -> usize {
        self.keylen
    }

    pub fn keyhash(&self) -> u32 {
        self.keyhash
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn count(&self) -> f64 {
        self.count
    }
}

/// Copy of a visible group taken during a tick
#[derive(Debug, Clone, PartialEq)]
pub struct GroupView {
    pub count: f64,
    pub tag: u8,
    pub payload: Vec<u8>,
}

impl From<&Group> for GroupView {
    fn from(group: &Group) -> Self {
        Self {
            count: group.count,
            tag: group.tag,
            payload: group.payload.clone(),
        }
    }
}

/// Result of one tick: the visible rows (counts as they stood before the
/// decay) and the state of the list afterwards
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSnapshot {
    pub rows: Vec<GroupView>,
    pub live_groups: usize,
    pub evicted: usize,
}

/// Outcome of a single `accumulate` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulated {
    Created,
    Updated,
}

#[derive(Debug)]
struct Node {
    group: Group,
    prev: Option<usize>,
    next: Option<usize>,
}

pub struct Aggregator {
    nodes: Vec<Node>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    live: usize,
    mode: KeyMode,
    policy: DecayPolicy,
}

impl Aggregator {
    pub fn new(mode: KeyMode, policy: DecayPolicy) -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            live: 0,
            mode,
            policy,
        }
    }

    /// Wrap in the lock shared by producer and consumer
    pub fn into_shared(self) -> SharedAggregator {
        Arc::new(Mutex::new(self))
    }

    pub fn mode(&self) -> KeyMode {
        self.mode
    }

    pub fn policy(&self) -> DecayPolicy {
        self.policy
    }

    /// Number of live groups
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Groups in rank order, highest count first
    pub fn groups(&self) -> Ranked<'_> {
        Ranked {
            aggregator: self,
            cursor: self.head,
        }
    }

    /// True when counts are non-increasing from head to tail
    pub fn is_ranked(&self) -> bool {
        let mut last = f64::INFINITY;
        for group in self.groups() {
            if group.count > last {
                return false;
            }
            last = group.count;
        }
        true
    }

    /// Count one observation of `record`
    ///
    /// Bumps the matching group by 1.0 (refreshing its stored payload to this
    /// instance) or creates it with count 1.0, then restores rank order.
    pub fn accumulate(&mut self, record: &Record) -> Accumulated {
        let payload = record.payload();
        let info = self.mode.derive(payload);

        let (idx, outcome) = match self.find(record.tag, &payload[..info.len], info.hash) {
            Some(idx) => {
                let group = &mut self.nodes[idx].group;
                group.count += 1.0;
                group.payload.clear();
                group.payload.extend_from_slice(payload);
                (idx, Accumulated::Updated)
            }
            None => {
                let group = Group {
                    tag: record.tag,
                    payload: payload.to_vec(),
                    keylen: info.len,
                    keyhash: info.hash,
                    count: 1.0,
                };
                (self.push_back(group), Accumulated::Created)
            }
        };

        self.repair(idx);
        outcome
    }

    /// Decay every count and evict what fell out of range
    ///
    /// The first `visible_rows` groups are copied into the snapshot; the count
    /// of the last of them is the reference for the count-ratio cut.
    pub fn tick(&mut self, visible_rows: usize) -> TickSnapshot {
        let DecayPolicy {
            decay,
            evict_factor,
        } = self.policy;
        let rank_cap = (visible_rows as f64 * evict_factor) as usize;

        let mut rows = Vec::with_capacity(visible_rows.min(self.live));
        let mut reference = 0.0;
        let mut evicted = 0;
        let mut rank = 0;
        let mut cursor = self.head;

        while let Some(idx) = cursor {
            cursor = self.nodes[idx].next;
            rank += 1;

            let group = &mut self.nodes[idx].group;
            if rank <= visible_rows {
                rows.push(GroupView::from(&*group));
                reference = group.count;
            }
            group.count *= decay;

            if group.count * evict_factor < reference || rank > rank_cap {
                self.remove(idx);
                evicted += 1;
            }
        }

        TickSnapshot {
            rows,
            live_groups: self.live,
            evicted,
        }
    }

    fn find(&self, tag: u8, key: &[u8], hash: u32) -> Option<usize> {
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let node = &self.nodes[idx];
            let group = &node.group;
            if group.keyhash == hash
                && group.tag == tag
                && group.keylen == key.len()
                && group.key() == key
            {
                return Some(idx);
            }
            cursor = node.next;
        }
        None
    }

    /// Move `idx` toward the head, then toward the tail, one neighbour at a
    /// time until both neighbours are in order
    fn repair(&mut self, idx: usize) {
        while let Some(prev) = self.nodes[idx].prev {
            if self.nodes[prev].group.count >= self.nodes[idx].group.count {
                break;
            }
            self.swap_with_next(prev);
        }
        while let Some(next) = self.nodes[idx].next {
            if self.nodes[next].group.count <= self.nodes[idx].group.count {
                break;
            }
            self.swap_with_next(idx);
        }
    }

    /// Exchange `a` with its successor
    fn swap_with_next(&mut self, a: usize) {
        let Some(b) = self.nodes[a].next else {
            return;
        };
        let before = self.nodes[a].prev;
        let after = self.nodes[b].next;

        match before {
            Some(p) => self.nodes[p].next = Some(b),
            None => self.head = Some(b),
        }
        match after {
            Some(n) => self.nodes[n].prev = Some(a),
            None => self.tail = Some(a),
        }

        self.nodes[b].prev = before;
        self.nodes[b].next = Some(a);
        self.nodes[a].prev = Some(b);
        self.nodes[a].next = after;
    }

    fn push_back(&mut self, group: Group) -> usize {
        let node = Node {
            group,
            prev: self.tail,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };

        match self.tail {
            Some(t) => self.nodes[t].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.live += 1;
        idx
    }

    fn remove(&mut self, idx: usize) {
        let prev = self.nodes[idx].prev.take();
        let next = self.nodes[idx].next.take();

        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }

        // Slot stays allocated for reuse; drop the payload now
        self.nodes[idx].group.payload = Vec::new();
        self.free.push(idx);
        self.live -= 1;
    }
}

/// Rank-order iterator over live groups
pub struct Ranked<'a> {
    aggregator: &'a Aggregator,
    cursor: Option<usize>,
}

impl<'a> Iterator for Ranked<'a> {
    type Item = &'a Group;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let node = &self.aggregator.nodes[idx];
        self.cursor = node.next;
        Some(&node.group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator_core::key::key_hash;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn rec(tag: u8, payload: &str) -> Record {
        Record::new(tag, payload.as_bytes())
    }

    fn counts(agg: &Aggregator) -> Vec<f64> {
        agg.groups().map(|g| g.count()).collect()
    }

    fn keys(agg: &Aggregator) -> Vec<String> {
        agg.groups()
            .map(|g| String::from_utf8_lossy(g.key()).to_string())
            .collect()
    }

    #[test]
    fn test_new_key_insertion() {
        let mut agg = Aggregator::new(KeyMode::Full, DecayPolicy::default());
        for _ in 0..3 {
            agg.accumulate(&rec(19, "/hot"));
        }
        agg.accumulate(&rec(19, "/warm"));
        agg.accumulate(&rec(19, "/warm"));

        assert_eq!(agg.accumulate(&rec(19, "/new")), Accumulated::Created);
        assert_eq!(agg.len(), 3);
        assert_eq!(keys(&agg), vec!["/hot", "/warm", "/new"]);
        assert_eq!(counts(&agg), vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_cardinality_stable_on_repeat() {
        let mut agg = Aggregator::new(KeyMode::Full, DecayPolicy::default());
        agg.accumulate(&rec(19, "/a"));
        agg.accumulate(&rec(19, "/b"));

        for _ in 0..10 {
            assert_eq!(agg.accumulate(&rec(19, "/b")), Accumulated::Updated);
            assert_eq!(agg.len(), 2);
        }
        assert_eq!(keys(&agg), vec!["/b", "/a"]);
        assert_eq!(counts(&agg), vec![11.0, 1.0]);
    }

    #[test]
    fn test_tag_distinguishes_groups() {
        let mut agg = Aggregator::new(KeyMode::Full, DecayPolicy::default());
        agg.accumulate(&rec(19, "same"));
        agg.accumulate(&rec(21, "same"));
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn test_hash_collision_still_compares_bytes() {
        let mut agg = Aggregator::new(KeyMode::Full, DecayPolicy::default());
        agg.accumulate(&rec(1, "ab"));
        agg.accumulate(&rec(1, "ba"));
        assert_eq!(agg.len(), 2);

        // Same additive hash, different bytes
        let hashes: Vec<u32> = agg.groups().map(|g| g.keyhash()).collect();
        assert_eq!(hashes, vec![key_hash(b"ab"); 2]);
    }

    #[test]
    fn test_field_mode_keeps_most_recent_payload() {
        let mut agg = Aggregator::new(KeyMode::Field, DecayPolicy::default());
        agg.accumulate(&rec(16, "GET /one HTTP/1.1"));
        agg.accumulate(&rec(16, "GET /two HTTP/1.1"));

        assert_eq!(agg.len(), 1);
        let group = agg.groups().next().unwrap();
        assert_eq!(group.key(), b"GET");
        assert_eq!(group.keylen(), 3);
        assert_eq!(group.payload(), b"GET /two HTTP/1.1");
        assert_eq!(group.count(), 2.0);
    }

    #[test]
    fn test_sort_invariant_random_stream() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut agg = Aggregator::new(KeyMode::Full, DecayPolicy::default());

        for step in 0..5_000 {
            let key = format!("/k{}", rng.gen_range(0..40));
            agg.accumulate(&rec(rng.gen_range(19..21), &key));
            assert!(agg.is_ranked(), "order broken after accumulate {}", step);
            if step % 250 == 0 {
                agg.tick(20);
                assert!(agg.is_ranked(), "order broken after tick {}", step);
            }
        }
    }

    #[test]
    fn test_decay_composition() {
        let mut agg = Aggregator::new(KeyMode::Full, DecayPolicy::default());
        agg.accumulate(&rec(19, "/x"));
        agg.tick(10);
        agg.accumulate(&rec(19, "/x"));
        agg.tick(10);
        agg.tick(10);
        agg.accumulate(&rec(19, "/x"));

        let expected = (1.0 * 0.999 + 1.0) * 0.999 * 0.999 + 1.0;
        let count = agg.groups().next().unwrap().count();
        assert!((count - expected).abs() < 1e-12, "{} != {}", count, expected);
    }

    #[test]
    fn test_tick_snapshot_reports_pre_decay_counts() {
        let mut agg = Aggregator::new(KeyMode::Full, DecayPolicy::default());
        for _ in 0..4 {
            agg.accumulate(&rec(19, "/a"));
        }
        agg.accumulate(&rec(19, "/b"));

        let snapshot = agg.tick(1);
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].count, 4.0);
        assert_eq!(snapshot.rows[0].payload, b"/a".to_vec());
        assert!((agg.groups().next().unwrap().count() - 3.996).abs() < 1e-12);
    }

    #[test]
    fn test_rank_cap_eviction() {
        let mut agg = Aggregator::new(KeyMode::Full, DecayPolicy::default());
        for i in 0..50 {
            agg.accumulate(&rec(19, &format!("/k{}", i)));
        }

        let snapshot = agg.tick(2);
        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(snapshot.evicted, 30);
        assert_eq!(snapshot.live_groups, 20);
        assert_eq!(agg.len(), 20);
    }

    #[test]
    fn test_count_ratio_eviction() {
        let mut agg = Aggregator::new(KeyMode::Full, DecayPolicy::default());
        for (key, n) in [("/a", 100), ("/b", 100), ("/c", 11), ("/d", 10), ("/e", 5)] {
            for _ in 0..n {
                agg.accumulate(&rec(19, key));
            }
        }

        agg.tick(2);

        // reference is 100.0: 11 * 0.999 * 10 survives, 10 * 0.999 * 10 does not
        assert_eq!(keys(&agg), vec!["/a", "/b", "/c"]);
        let reference = 100.0;
        for group in agg.groups() {
            assert!(group.count() * 10.0 >= reference);
        }
    }

    #[test]
    fn test_slots_reused_after_eviction() {
        let mut agg = Aggregator::new(KeyMode::Full, DecayPolicy::default());
        for i in 0..30 {
            agg.accumulate(&rec(19, &format!("/k{}", i)));
        }
        agg.tick(1);
        assert_eq!(agg.len(), 10);

        for i in 100..120 {
            agg.accumulate(&rec(19, &format!("/k{}", i)));
        }
        assert_eq!(agg.len(), 30);
        assert_eq!(agg.nodes.len(), 30);
        assert!(agg.is_ranked());
    }

    #[test]
    fn test_zero_visible_rows_evicts_everything() {
        let mut agg = Aggregator::new(KeyMode::Full, DecayPolicy::default());
        agg.accumulate(&rec(19, "/a"));
        agg.accumulate(&rec(19, "/b"));

        let snapshot = agg.tick(0);
        assert!(snapshot.rows.is_empty());
        assert!(agg.is_empty());
        assert_eq!(agg.groups().count(), 0);
    }

    #[test]
    fn test_custom_policy() {
        let policy = DecayPolicy {
            decay: 0.5,
            evict_factor: 100.0,
        };
        let mut agg = Aggregator::new(KeyMode::Full, policy);
        assert_eq!(agg.policy(), policy);
        assert_eq!(agg.mode(), KeyMode::Full);
        agg.accumulate(&rec(19, "/a"));
        agg.accumulate(&rec(19, "/a"));
        agg.tick(5);
        assert_eq!(agg.groups().next().unwrap().count(), 1.0);
    }
}
