//! Single-pass aggregation of parsed access-log records.
//!
//! An [`Aggregator`] folds records in arrival order into running counters and
//! is consumed by [`Aggregator::finalize`] to produce a [`Summary`].

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use stats_core::error::{Result, StatsError};
use stats_core::formatting::percentage;
use stats_core::models::{LogRecord, RankedEntry, StatusClass, StatusShare, Summary};

// ── Tally ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TallyEntry {
    count: u64,
    /// Position of the key's first appearance.
    first_seen: u64,
}

/// Occurrence counts per string key that remember first-seen order.
///
/// Ties in [`Tally::top`] go to the key that appeared first, independent of
/// hash-map iteration order.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    entries: HashMap<String, TallyEntry>,
    next_seq: u64,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more occurrence of `key`.
    pub fn increment(&mut self, key: &str) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.count += 1;
            return;
        }
        self.insert_new(key.to_string(), 1);
    }

    /// Count for `key`, `0` when never seen.
    pub fn get(&self, key: &str) -> u64 {
        self.entries.get(key).map(|e| e.count).unwrap_or(0)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.values().map(|e| e.count).sum()
    }

    /// The key with the highest count, earliest first-seen on ties.
    pub fn top(&self) -> Option<(&str, u64)> {
        self.entries
            .iter()
            .min_by(|(_, a), (_, b)| {
                b.count
                    .cmp(&a.count)
                    .then_with(|| a.first_seen.cmp(&b.first_seen))
            })
            .map(|(key, e)| (key.as_str(), e.count))
    }

    /// All `(key, count)` pairs in first-seen order.
    pub fn in_first_seen_order(&self) -> Vec<(&str, u64)> {
        let mut pairs: Vec<(&str, &TallyEntry)> =
            self.entries.iter().map(|(k, e)| (k.as_str(), e)).collect();
        pairs.sort_by_key(|(_, e)| e.first_seen);
        pairs.into_iter().map(|(k, e)| (k, e.count)).collect()
    }

    /// Add every count from `other`.
    ///
    /// Keys already present keep their position; keys new to `self` are
    /// appended in `other`'s first-seen order.
    pub fn merge(&mut self, other: Tally) {
        let mut incoming: Vec<(String, TallyEntry)> = other.entries.into_iter().collect();
        incoming.sort_by_key(|(_, e)| e.first_seen);

        for (key, entry) in incoming {
            match self.entries.entry(key) {
                Entry::Occupied(mut slot) => slot.get_mut().count += entry.count,
                Entry::Vacant(slot) => {
                    slot.insert(TallyEntry {
                        count: entry.count,
                        first_seen: self.next_seq,
                    });
                    self.next_seq += 1;
                }
            }
        }
    }

    fn insert_new(&mut self, key: String, count: u64) {
        self.entries.insert(
            key,
            TallyEntry {
                count,
                first_seen: self.next_seq,
            },
        );
        self.next_seq += 1;
    }
}

// ── AggregationState ──────────────────────────────────────────────────────────

/// Running counters for one aggregation run.
///
/// Every accepted record bumps `total_requests` and exactly one entry in each
/// tally, so `total_requests == resource_counts.total() == host_counts.total()`.
#[derive(Debug, Clone, Default)]
pub struct AggregationState {
    pub total_requests: u64,
    pub total_bytes: u64,
    pub resource_counts: Tally,
    pub host_counts: Tally,
    /// Keyed by `status_code / 100`; may include classes outside `1..=5`.
    pub status_class_counts: BTreeMap<u16, u64>,
}

// ── Aggregator ────────────────────────────────────────────────────────────────

/// Streaming accumulator over [`LogRecord`]s.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    state: AggregationState,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the running totals.
    pub fn add_record(&mut self, record: &LogRecord) {
        let state = &mut self.state;
        state.total_requests += 1;
        state.total_bytes = state.total_bytes.saturating_add(record.bytes_sent);
        state.resource_counts.increment(&record.resource);
        state.host_counts.increment(&record.remote_host);
        *state
            .status_class_counts
            .entry(record.status_class())
            .or_insert(0) += 1;
    }

    /// Read-only view of the counters.
    pub fn state(&self) -> &AggregationState {
        &self.state
    }

    pub fn total_requests(&self) -> u64 {
        self.state.total_requests
    }

    pub fn total_bytes(&self) -> u64 {
        self.state.total_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.state.total_requests == 0
    }

    /// Combine the counters of an independent run into this one.
    ///
    /// Counts and byte totals add; the top entries are recomputed at
    /// finalization from the merged tallies.
    pub fn merge(&mut self, other: Aggregator) {
        let other = other.state;
        let state = &mut self.state;
        state.total_requests += other.total_requests;
        state.total_bytes = state.total_bytes.saturating_add(other.total_bytes);
        state.resource_counts.merge(other.resource_counts);
        state.host_counts.merge(other.host_counts);
        for (class, count) in other.status_class_counts {
            *state.status_class_counts.entry(class).or_insert(0) += count;
        }
    }

    /// Turn the counters into a [`Summary`].
    ///
    /// Returns [`StatsError::EmptyResult`] when no record was added.
    pub fn finalize(self) -> Result<Summary> {
        let state = self.state;
        let total = state.total_requests;
        if total == 0 {
            return Err(StatsError::EmptyResult);
        }

        let top_resource = ranked(&state.resource_counts, total)?;
        let top_host = ranked(&state.host_counts, total)?;

        let status_distribution = StatusClass::ALL
            .iter()
            .map(|&class| {
                let count = state
                    .status_class_counts
                    .get(&class.digit())
                    .copied()
                    .unwrap_or(0);
                StatusShare {
                    class,
                    count,
                    percentage: percentage(count, total),
                }
            })
            .collect();

        Ok(Summary {
            total_requests: total,
            total_bytes: state.total_bytes,
            top_resource,
            top_host,
            status_distribution,
        })
    }
}

impl<'a> Extend<&'a LogRecord> for Aggregator {
    fn extend<T: IntoIterator<Item = &'a LogRecord>>(&mut self, iter: T) {
        for record in iter {
            self.add_record(record);
        }
    }
}

fn ranked(tally: &Tally, total: u64) -> Result<RankedEntry> {
    let (value, count) = tally.top().ok_or(StatsError::EmptyResult)?;
    Ok(RankedEntry {
        value: value.to_string(),
        count,
        share: percentage(count, total),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LineParser;
    use stats_core::models::FieldSet;

    fn rec(host: &str, resource: &str, status: u16, bytes: u64) -> LogRecord {
        LogRecord {
            remote_host: host.to_string(),
            resource: resource.to_string(),
            status_code: status,
            bytes_sent: bytes,
            details: None,
        }
    }

    fn aggregate(records: &[LogRecord]) -> Aggregator {
        let mut agg = Aggregator::new();
        agg.extend(records);
        agg
    }

    // ── Tally ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_tally_counts() {
        let mut tally = Tally::new();
        tally.increment("/a");
        tally.increment("/b");
        tally.increment("/a");
        assert_eq!(tally.get("/a"), 2);
        assert_eq!(tally.get("/b"), 1);
        assert_eq!(tally.get("/missing"), 0);
        assert_eq!(tally.len(), 2);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn test_tally_top_prefers_first_seen_on_tie() {
        let mut tally = Tally::new();
        for key in ["/x", "/y", "/y", "/x", "/z"] {
            tally.increment(key);
        }
        assert_eq!(tally.top(), Some(("/x", 2)));
    }

    #[test]
    fn test_tally_top_is_stable_across_many_ties() {
        let mut tally = Tally::new();
        let keys: Vec<String> = (0..200).map(|i| format!("/k{i}")).collect();
        for key in keys.iter().rev() {
            tally.increment(key);
        }
        assert_eq!(tally.top(), Some(("/k199", 1)));
    }

    #[test]
    fn test_tally_top_empty() {
        assert_eq!(Tally::new().top(), None);
    }

    #[test]
    fn test_tally_first_seen_order() {
        let mut tally = Tally::new();
        for key in ["c", "a", "c", "b"] {
            tally.increment(key);
        }
        assert_eq!(tally.in_first_seen_order(), vec![("c", 2), ("a", 1), ("b", 1)]);
    }

    #[test]
    fn test_tally_merge_appends_new_keys_in_order() {
        let mut left = Tally::new();
        left.increment("a");
        left.increment("b");

        let mut right = Tally::new();
        right.increment("d");
        right.increment("b");
        right.increment("c");

        left.merge(right);
        assert_eq!(
            left.in_first_seen_order(),
            vec![("a", 1), ("b", 2), ("d", 1), ("c", 1)]
        );
    }

    // ── add_record ────────────────────────────────────────────────────────────

    #[test]
    fn test_add_record_updates_every_counter() {
        let agg = aggregate(&[
            rec("10.0.0.1", "/a", 200, 100),
            rec("10.0.0.1", "/b", 404, 0),
            rec("10.0.0.2", "/a", 503, 7),
        ]);
        let state = agg.state();
        assert_eq!(state.total_requests, 3);
        assert_eq!(state.total_bytes, 107);
        assert_eq!(state.resource_counts.get("/a"), 2);
        assert_eq!(state.host_counts.get("10.0.0.1"), 2);
        assert_eq!(state.status_class_counts.get(&2), Some(&1));
        assert_eq!(state.status_class_counts.get(&4), Some(&1));
        assert_eq!(state.status_class_counts.get(&5), Some(&1));
    }

    #[test]
    fn test_totals_match_tallies() {
        let records: Vec<LogRecord> = (0..50)
            .map(|i| rec(&format!("h{}", i % 7), &format!("/r{}", i % 11), 200, i))
            .collect();
        let agg = aggregate(&records);
        let state = agg.state();
        assert_eq!(state.total_requests, 50);
        assert_eq!(state.resource_counts.total(), 50);
        assert_eq!(state.host_counts.total(), 50);
        assert_eq!(state.total_bytes, (0..50).sum::<u64>());
    }

    #[test]
    fn test_total_bytes_saturates() {
        let agg = aggregate(&[rec("h", "/", 200, u64::MAX), rec("h", "/", 200, 10)]);
        assert_eq!(agg.total_bytes(), u64::MAX);
    }

    // ── finalize ──────────────────────────────────────────────────────────────

    #[test]
    fn test_finalize_reference_scenario() {
        let parser = LineParser::new(FieldSet::Basic);
        let lines = [
            r#"10.0.0.1 - - [01/Jan/2024:00:00:00] "GET /a HTTP/1.1" 200 100"#,
            r#"10.0.0.1 - - [01/Jan/2024:00:00:01] "GET /b HTTP/1.1" 404 -"#,
            r#"10.0.0.2 - - [01/Jan/2024:00:00:02] "GET /a HTTP/1.1" 200 50"#,
        ];
        let mut agg = Aggregator::new();
        for line in lines {
            agg.add_record(&parser.parse(line).unwrap());
        }

        let summary = agg.finalize().unwrap();
        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.total_bytes, 150);
        assert_eq!(summary.top_resource.value, "/a");
        assert_eq!(summary.top_resource.count, 2);
        assert_eq!(summary.top_host.value, "10.0.0.1");
        assert_eq!(summary.top_host.count, 2);

        let rounded: Vec<String> = summary
            .status_distribution
            .iter()
            .map(|s| format!("{:.2}", s.percentage))
            .collect();
        assert_eq!(rounded, vec!["0.00", "66.67", "0.00", "33.33", "0.00"]);
    }

    #[test]
    fn test_finalize_empty_is_explicit() {
        let result = Aggregator::new().finalize();
        assert!(matches!(result, Err(StatsError::EmptyResult)));
    }

    #[test]
    fn test_finalize_always_emits_five_classes() {
        let summary = aggregate(&[rec("h", "/", 302, 0)]).finalize().unwrap();
        let classes: Vec<StatusClass> = summary
            .status_distribution
            .iter()
            .map(|s| s.class)
            .collect();
        assert_eq!(classes, StatusClass::ALL.to_vec());
        assert_eq!(summary.percentage_for(StatusClass::Redirection), 100.0);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let records: Vec<LogRecord> = [101, 200, 200, 301, 404, 404, 404, 500, 502]
            .iter()
            .map(|&s| rec("h", "/", s, 0))
            .collect();
        let summary = aggregate(&records).finalize().unwrap();
        let sum: f64 = summary.status_distribution.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9, "sum = {sum}");
    }

    #[test]
    fn test_out_of_range_class_counted_but_not_distributed() {
        let agg = aggregate(&[rec("h", "/", 200, 0), rec("h", "/", 600, 0)]);
        assert_eq!(agg.state().status_class_counts.get(&6), Some(&1));

        let summary = agg.finalize().unwrap();
        assert_eq!(summary.percentage_for(StatusClass::Success), 50.0);
        let sum: f64 = summary.status_distribution.iter().map(|s| s.percentage).sum();
        assert!((sum - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_share() {
        let summary = aggregate(&[
            rec("a", "/x", 200, 0),
            rec("a", "/y", 200, 0),
            rec("b", "/x", 200, 0),
            rec("a", "/x", 200, 0),
        ])
        .finalize()
        .unwrap();
        assert_eq!(summary.top_resource.count, 3);
        assert!((summary.top_resource.share - 75.0).abs() < 1e-9);
        assert_eq!(summary.top_host.value, "a");
        assert!((summary.top_host.share - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_tie_break_follows_arrival_order() {
        let forward = aggregate(&[rec("h1", "/a", 200, 1), rec("h2", "/b", 200, 2)])
            .finalize()
            .unwrap();
        assert_eq!(forward.top_resource.value, "/a");
        assert_eq!(forward.top_host.value, "h1");

        let reversed = aggregate(&[rec("h2", "/b", 200, 2), rec("h1", "/a", 200, 1)])
            .finalize()
            .unwrap();
        assert_eq!(reversed.top_resource.value, "/b");
        assert_eq!(reversed.top_host.value, "h2");
    }

    #[test]
    fn test_order_independent_fields() {
        let records = vec![
            rec("h1", "/a", 200, 10),
            rec("h2", "/b", 404, 20),
            rec("h1", "/c", 500, 30),
            rec("h3", "/a", 301, 40),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let a = aggregate(&records);
        let b = aggregate(&reversed);
        assert_eq!(a.total_requests(), b.total_requests());
        assert_eq!(a.total_bytes(), b.total_bytes());
        assert_eq!(
            a.state().status_class_counts,
            b.state().status_class_counts
        );
    }

    // ── merge ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_merge_sums_counters() {
        let mut left = aggregate(&[rec("h1", "/a", 200, 10), rec("h2", "/b", 404, 5)]);
        let right = aggregate(&[rec("h2", "/b", 200, 1), rec("h2", "/b", 500, 1)]);
        left.merge(right);

        let state = left.state();
        assert_eq!(state.total_requests, 4);
        assert_eq!(state.total_bytes, 17);
        assert_eq!(state.resource_counts.get("/b"), 3);
        assert_eq!(state.host_counts.get("h2"), 3);
        assert_eq!(state.status_class_counts.get(&2), Some(&2));

        let summary = left.finalize().unwrap();
        assert_eq!(summary.top_resource.value, "/b");
        assert_eq!(summary.top_host.value, "h2");
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let records: Vec<LogRecord> = (0..30)
            .map(|i| rec(&format!("h{}", i % 4), &format!("/r{}", i % 5), 200 + (i % 3) as u16 * 100, i))
            .collect();

        let single = aggregate(&records).finalize().unwrap();

        let mut merged = aggregate(&records[..10]);
        merged.merge(aggregate(&records[10..20]));
        merged.merge(aggregate(&records[20..]));
        let merged = merged.finalize().unwrap();

        assert_eq!(single, merged);
    }

    #[test]
    fn test_merge_into_empty() {
        let mut agg = Aggregator::new();
        agg.merge(aggregate(&[rec("h", "/", 200, 3)]));
        assert_eq!(agg.total_requests(), 1);
        assert!(!agg.is_empty());
    }
}
