use std::time::{Duration, SystemTime};

use crate::{retention::RetentionDecision, shard::ShardDescriptor};

/// Where a table stands relative to compaction, given its listed shards and,
/// once retention has run, the marker's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    /// No shard files.
    Absent,
    /// A single compacted file nothing needs to touch.
    SingleFreshCompacted,
    /// A single compacted file old enough to be rewritten for space reclamation.
    SingleStaleCompacted,
    /// Several shards, a raw shard, or content changed by retention.
    NeedsMerge,
    /// Retention expired every record.
    MarkedEmpty,
}

impl TableState {
    /// Classify `shards`. `decision` is `None` before retention ran or when it is disabled;
    /// staleness only applies once a decision confirmed nothing changed.
    pub fn classify(
        shards: &[ShardDescriptor],
        decision: Option<RetentionDecision>,
        now: SystemTime,
        recreate_older_than: Duration,
    ) -> Self {
        if shards.is_empty() {
            return TableState::Absent;
        }
        let decision_modified = match decision {
            Some(decision) if decision.empty => return TableState::MarkedEmpty,
            Some(decision) => decision.modified,
            None => false,
        };
        match shards {
            [shard] if shard.is_compacted() && !decision_modified => {
                if decision.is_some()
                    && !shard.is_recreated()
                    && shard.age(now) >= recreate_older_than
                {
                    TableState::SingleStaleCompacted
                } else {
                    TableState::SingleFreshCompacted
                }
            }
            _ => TableState::NeedsMerge,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::TableState;
    use crate::{retention::RetentionDecision, shard::ShardDescriptor};

    const THRESHOLD: Duration = Duration::from_secs(12 * 60 * 60);

    fn shard(name: &str, age: Duration, now: SystemTime) -> ShardDescriptor {
        ShardDescriptor {
            name: name.to_string(),
            last_modified: now - age,
            size: 0,
        }
    }

    #[test]
    fn classification_table() {
        let now = SystemTime::now();
        let fresh = Duration::from_secs(60);
        let stale = THRESHOLD + Duration::from_secs(60);
        let unchanged = Some(RetentionDecision::UNCHANGED);
        let modified = Some(RetentionDecision::MODIFIED);
        let empty = Some(RetentionDecision::EMPTY);

        let cases: Vec<(&str, Vec<ShardDescriptor>, Option<RetentionDecision>, TableState)> = vec![
            ("no shards", vec![], None, TableState::Absent),
            ("no shards, empty marker", vec![], empty, TableState::Absent),
            (
                "fresh compacted, no retention",
                vec![shard("compactor-1.gz", fresh, now)],
                None,
                TableState::SingleFreshCompacted,
            ),
            (
                "stale compacted, no retention",
                vec![shard("compactor-1.gz", stale, now)],
                None,
                TableState::SingleFreshCompacted,
            ),
            (
                "fresh compacted, unchanged",
                vec![shard("compactor-1.gz", fresh, now)],
                unchanged,
                TableState::SingleFreshCompacted,
            ),
            (
                "stale compacted, unchanged",
                vec![shard("compactor-1.gz", stale, now)],
                unchanged,
                TableState::SingleStaleCompacted,
            ),
            (
                "stale recreated, unchanged",
                vec![shard("compactor-1.r.gz", stale, now)],
                unchanged,
                TableState::SingleFreshCompacted,
            ),
            (
                "stale compacted, modified",
                vec![shard("compactor-1.gz", stale, now)],
                modified,
                TableState::NeedsMerge,
            ),
            (
                "single raw",
                vec![shard("0.gz", stale, now)],
                unchanged,
                TableState::NeedsMerge,
            ),
            (
                "many shards",
                vec![
                    shard("compactor-1.gz", fresh, now),
                    shard("ingester-2", fresh, now),
                ],
                None,
                TableState::NeedsMerge,
            ),
            (
                "emptied single compacted",
                vec![shard("compactor-1.gz", fresh, now)],
                empty,
                TableState::MarkedEmpty,
            ),
            (
                "emptied many",
                vec![shard("0", fresh, now), shard("1", fresh, now)],
                empty,
                TableState::MarkedEmpty,
            ),
        ];

        for (name, shards, decision, expected) in cases {
            assert_eq!(
                TableState::classify(&shards, decision, now, THRESHOLD),
                expected,
                "case `{name}`"
            );
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let now = SystemTime::now();
        let shards = vec![shard("compactor-1.gz", THRESHOLD, now)];
        assert_eq!(
            TableState::classify(&shards, Some(RetentionDecision::UNCHANGED), now, THRESHOLD),
            TableState::SingleStaleCompacted
        );
    }
}
