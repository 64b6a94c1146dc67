//! RebindReport - 1 バッチ分の rebind 結果
//!
//! 欠落参照やスキップされた設定はエラーではないので、ここに記録して
//! 呼び出し側が確認できるようにします。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ObjectId, RebindId};
use crate::settings::FailureMode;

/// How the persisted config entries of one or more mementos were placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRestoreStats {
    /// Matched a declared key by name or deprecated alias.
    pub declared: usize,
    /// Placed through a flag whose field is a config key.
    pub legacy_keys: usize,
    /// Assigned to a plain legacy field.
    pub fields: usize,
    /// Kept as anonymous config.
    pub anonymous: usize,
    /// Logged and dropped.
    pub skipped: usize,
}

impl ConfigRestoreStats {
    pub fn total(&self) -> usize {
        self.declared + self.legacy_keys + self.fields + self.anonymous + self.skipped
    }

    pub fn absorb(&mut self, other: ConfigRestoreStats) {
        self.declared += other.declared;
        self.legacy_keys += other.legacy_keys;
        self.fields += other.fields;
        self.anonymous += other.anonymous;
        self.skipped += other.skipped;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Parent,
    Child,
}

/// A parent or child id that did not resolve during rebind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingReference {
    pub from: ObjectId,
    pub relation: Relation,
    pub target: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectFailure {
    pub id: ObjectId,
    pub type_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebindCounts {
    pub instantiated: usize,
    pub managed: usize,
    pub missing_references: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebindReport {
    pub rebind_id: RebindId,
    pub failure_mode: FailureMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub instantiated: Vec<ObjectId>,
    pub managed: Vec<ObjectId>,
    pub config: ConfigRestoreStats,
    pub feeds_restored: usize,
    pub missing_references: Vec<MissingReference>,
    pub failures: Vec<ObjectFailure>,
}

impl RebindReport {
    pub fn new(rebind_id: RebindId, failure_mode: FailureMode, started_at: DateTime<Utc>) -> Self {
        Self {
            rebind_id,
            failure_mode,
            started_at,
            finished_at: started_at,
            instantiated: Vec::new(),
            managed: Vec::new(),
            config: ConfigRestoreStats::default(),
            feeds_restored: 0,
            missing_references: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn counts(&self) -> RebindCounts {
        RebindCounts {
            instantiated: self.instantiated.len(),
            managed: self.managed.len(),
            missing_references: self.missing_references.len(),
            failed: self.failures.len(),
        }
    }

    /// No failures and nothing missing.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.missing_references.is_empty()
    }

    pub fn missing_from(&self, id: &ObjectId) -> Vec<&MissingReference> {
        self.missing_references
            .iter()
            .filter(|m| &m.from == id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn stats_accumulate() {
        let mut total = ConfigRestoreStats::default();
        total.absorb(ConfigRestoreStats {
            declared: 2,
            anonymous: 1,
            ..Default::default()
        });
        total.absorb(ConfigRestoreStats {
            fields: 1,
            skipped: 1,
            ..Default::default()
        });
        assert_eq!(total.total(), 5);
        assert_eq!(total.declared, 2);
    }

    #[test]
    fn counts_summarise_the_report() {
        let mut report = RebindReport::new(
            RebindId::from_ulid(Ulid::new()),
            FailureMode::Continue,
            Utc::now(),
        );
        report.instantiated.push(ObjectId::new("loc-1"));
        report.missing_references.push(MissingReference {
            from: ObjectId::new("loc-1"),
            relation: Relation::Child,
            target: ObjectId::new("loc-3"),
        });

        let counts = report.counts();
        assert_eq!(counts.instantiated, 1);
        assert_eq!(counts.missing_references, 1);
        assert!(!report.is_clean());
        assert_eq!(report.missing_from(&ObjectId::new("loc-1")).len(), 1);
    }
}
