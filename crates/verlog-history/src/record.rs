//! History data model: actions, entries, and the per-value versioning record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use verlog_diff::DiffOp;

/// What a history entry records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    /// First commit of the value. Only ever the first entry.
    Created,
    /// A later commit; the diff leads back to the previous snapshot.
    Updated,
    /// Tombstone. Carries no content.
    Deleted,
    /// An older state was restored; the diff leads back to the state before it.
    Rollback,
}

impl HistoryAction {
    /// Returns `true` for actions whose entries always carry a diff.
    pub fn carries_diff(self) -> bool {
        matches!(self, Self::Updated | Self::Rollback)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Rollback => "rollback",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a value's history.
///
/// Build entries through the per-action constructors, which keep the diff
/// present exactly for `updated` and `rollback`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: HistoryAction,
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<Vec<DiffOp>>,
}

impl HistoryEntry {
    pub fn created(timestamp: DateTime<Utc>) -> Self {
        Self {
            action: HistoryAction::Created,
            timestamp,
            diff: None,
        }
    }

    pub fn updated(timestamp: DateTime<Utc>, diff: Vec<DiffOp>) -> Self {
        Self {
            action: HistoryAction::Updated,
            timestamp,
            diff: Some(diff),
        }
    }

    pub fn deleted(timestamp: DateTime<Utc>) -> Self {
        Self {
            action: HistoryAction::Deleted,
            timestamp,
            diff: None,
        }
    }

    pub fn rollback(timestamp: DateTime<Utc>, diff: Vec<DiffOp>) -> Self {
        Self {
            action: HistoryAction::Rollback,
            timestamp,
            diff: Some(diff),
        }
    }

    /// The entry's diff, empty when it carries none.
    pub fn diff_ops(&self) -> &[DiffOp] {
        self.diff.as_deref().unwrap_or(&[])
    }
}

/// History log plus the last committed snapshot of one value.
///
/// Serialized with the field names `history` and `strLast`, so a record can
/// live inside the JSON value it versions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersioningRecord {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(rename = "strLast", default, skip_serializing_if = "Option::is_none")]
    pub str_last: Option<String>,
}

impl VersioningRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// The most recent entry, if any.
    pub fn last_entry(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    pub fn last_action(&self) -> Option<HistoryAction> {
        self.last_entry().map(|entry| entry.action)
    }

    /// Returns `true` if the value is logically removed.
    pub fn is_deleted(&self) -> bool {
        self.last_action() == Some(HistoryAction::Deleted)
    }

    /// The serialized form of the most recent retained state.
    pub fn snapshot(&self) -> Option<&str> {
        self.str_last.as_deref()
    }

    /// Append an entry. History only grows through this method.
    pub fn append(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }

    /// Remove and return the most recent entry.
    ///
    /// This is the only way history shrinks, and it is used solely by `pop`.
    /// The snapshot is left untouched; the caller decides what it becomes.
    pub fn truncate_last(&mut self) -> Option<HistoryEntry> {
        self.history.pop()
    }
}
