//! The history store: push, pop, delete, and rollback over a diff chain.
//!
//! Every operation resolves the value's record through a [`RecordSource`],
//! works on the detached record, and gives it back to the source before
//! returning, including when the codec or the diff chain fails. A failed
//! operation hands back the record exactly as it was taken.

use chrono::Utc;
use serde_json::Value;
use tracing::debug;
use verlog_diff::{apply_diff, DiffEngine};

use crate::codec::{Codec, JsonCodec};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::record::{HistoryAction, HistoryEntry, VersioningRecord};
use crate::replay::{replay, ReplayedState};
use crate::source::{EmbeddedRecord, ExternalRecord, RecordSource};
use crate::validation::{RecordValidator, ValidationReport};

/// Result of an operation that can be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The record was changed.
    Applied,
    /// The operation was refused and the record is unchanged.
    Unchanged,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// Diff-chain history for structured values.
///
/// The store itself is immutable configuration plus a codec; all state lives
/// in the [`VersioningRecord`] of each value. Callers must not run two
/// operations on the same record at once, which `&mut` access already
/// enforces within a thread.
#[derive(Clone, Debug)]
pub struct HistoryStore<C = JsonCodec> {
    config: StoreConfig,
    engine: DiffEngine,
    codec: C,
}

impl Default for HistoryStore<JsonCodec> {
    fn default() -> Self {
        Self {
            engine: DiffEngine::default(),
            config: StoreConfig::default(),
            codec: JsonCodec,
        }
    }
}

impl<C: Codec> HistoryStore<C> {
    /// Create a store after validating `config`.
    pub fn new(config: StoreConfig, codec: C) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self {
            engine: DiffEngine::new(config.min_token_len),
            config,
            codec,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn engine(&self) -> &DiffEngine {
        &self.engine
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// The embedded source for this store's reserved label.
    pub fn embedded(&self) -> EmbeddedRecord<'_> {
        EmbeddedRecord::new(&self.config.label)
    }

    // ---- Operations selecting their source per call ----

    /// Commit the current state of `value`.
    ///
    /// Uses `external` when given, otherwise the record embedded in `value`.
    /// Returns [`Outcome::Unchanged`] if the value is deleted.
    pub fn push(
        &self,
        value: &mut Value,
        external: Option<&mut VersioningRecord>,
    ) -> StoreResult<Outcome> {
        match external {
            Some(record) => self.push_with(value, &mut ExternalRecord::new(record)),
            None => self.push_with(value, &mut self.embedded()),
        }
    }

    /// Drop the last history entry and return the state it superseded.
    ///
    /// `None` means there is no previous value.
    pub fn pop(
        &self,
        value: &mut Value,
        external: Option<&mut VersioningRecord>,
    ) -> StoreResult<Option<Value>> {
        match external {
            Some(record) => self.pop_with(value, &mut ExternalRecord::new(record)),
            None => self.pop_with(value, &mut self.embedded()),
        }
    }

    /// Mark the value as logically removed.
    pub fn delete(
        &self,
        value: &mut Value,
        external: Option<&mut VersioningRecord>,
    ) -> StoreResult<Outcome> {
        match external {
            Some(record) => self.delete_with(value, &mut ExternalRecord::new(record)),
            None => self.delete_with(value, &mut self.embedded()),
        }
    }

    /// Restore the previous retained state while keeping all history.
    ///
    /// `None` means there is no previous value.
    pub fn rollback(
        &self,
        value: &mut Value,
        external: Option<&mut VersioningRecord>,
    ) -> StoreResult<Option<Value>> {
        match external {
            Some(record) => self.rollback_with(value, &mut ExternalRecord::new(record)),
            None => self.rollback_with(value, &mut self.embedded()),
        }
    }

    // ---- Operations over an explicit source ----

    pub fn push_with<S>(&self, value: &mut Value, source: &mut S) -> StoreResult<Outcome>
    where
        S: RecordSource + ?Sized,
    {
        let mut record = source.take(value)?;
        let result = self.push_record(value, &mut record);
        source.restore(value, record)?;
        result
    }

    pub fn pop_with<S>(&self, value: &mut Value, source: &mut S) -> StoreResult<Option<Value>>
    where
        S: RecordSource + ?Sized,
    {
        let mut record = source.take(value)?;
        let original = record.clone();
        let result = self.pop_record(&mut record);
        Self::finish(value, source, record, original, result)
    }

    pub fn delete_with<S>(&self, value: &mut Value, source: &mut S) -> StoreResult<Outcome>
    where
        S: RecordSource + ?Sized,
    {
        let mut record = source.take(value)?;
        let result = self.delete_record(&mut record);
        source.restore(value, record)?;
        Ok(result)
    }

    pub fn rollback_with<S>(
        &self,
        value: &mut Value,
        source: &mut S,
    ) -> StoreResult<Option<Value>>
    where
        S: RecordSource + ?Sized,
    {
        let mut record = source.take(value)?;
        let original = record.clone();
        let result = self.rollback_record(&mut record);
        Self::finish(value, source, record, original, result)
    }

    // ---- Inspection ----

    /// Read the record embedded in `value` without modifying it.
    pub fn record_of(&self, value: &Value) -> StoreResult<VersioningRecord> {
        self.embedded().peek(value)
    }

    /// The text left behind by every entry of `record`, newest first.
    pub fn replay(&self, record: &VersioningRecord) -> StoreResult<Vec<ReplayedState>> {
        replay(record)
    }

    /// Check `record` for structural and chain integrity.
    pub fn validate(&self, record: &VersioningRecord) -> ValidationReport {
        RecordValidator::validate(record, &self.codec)
    }

    // ---- Record-level state machine ----

    fn push_record(&self, value: &Value, record: &mut VersioningRecord) -> StoreResult<Outcome> {
        if record.is_deleted() {
            debug!(entries = record.len(), "push refused: value is deleted");
            return Ok(Outcome::Unchanged);
        }

        let serialized = self.codec.encode(value)?;
        let entry = if record.is_empty() {
            HistoryEntry::created(Utc::now())
        } else {
            let last = record.snapshot().ok_or(StoreError::MissingSnapshot)?;
            HistoryEntry::updated(Utc::now(), self.engine.diff(&serialized, last))
        };

        debug!(
            action = %entry.action,
            ops = entry.diff_ops().len(),
            snapshot_len = serialized.len(),
            "push"
        );
        record.append(entry);
        record.str_last = Some(serialized);
        Ok(Outcome::Applied)
    }

    fn pop_record(&self, record: &mut VersioningRecord) -> StoreResult<Option<Value>> {
        let Some(last) = record.last_entry() else {
            debug!("pop: history is empty");
            return Ok(None);
        };

        let previous = match last.action {
            HistoryAction::Created => {
                record.truncate_last();
                debug!("pop removed the created entry; no previous value");
                return Ok(None);
            }
            // A tombstone carries no content; the snapshot is the state before it.
            HistoryAction::Deleted => record
                .snapshot()
                .ok_or(StoreError::MissingSnapshot)?
                .to_owned(),
            HistoryAction::Updated | HistoryAction::Rollback => {
                let current = record.snapshot().ok_or(StoreError::MissingSnapshot)?;
                apply_diff(current, last.diff_ops())?
            }
        };
        let restored = self.codec.decode(&previous)?;

        let removed = record.truncate_last();
        record.str_last = Some(previous);
        debug!(
            removed = ?removed.map(|entry| entry.action),
            entries = record.len(),
            "pop"
        );
        Ok(Some(restored))
    }

    fn delete_record(&self, record: &mut VersioningRecord) -> Outcome {
        if record.is_deleted() {
            debug!("delete: already deleted");
            return Outcome::Unchanged;
        }
        record.append(HistoryEntry::deleted(Utc::now()));
        debug!(entries = record.len(), "delete");
        Outcome::Applied
    }

    fn rollback_record(&self, record: &mut VersioningRecord) -> StoreResult<Option<Value>> {
        if record.is_empty() {
            debug!("rollback: history is empty");
            return Ok(None);
        }
        let current = record.snapshot().ok_or(StoreError::MissingSnapshot)?;

        // Walk back until an `updated` or `deleted` entry marks a state the
        // value actually landed on. `rollback` entries are undone on the way.
        let mut working = current.to_owned();
        let mut landed = false;
        for entry in record.history.iter().rev() {
            if entry.action.carries_diff() {
                working = apply_diff(&working, entry.diff_ops())?;
            }
            if matches!(entry.action, HistoryAction::Updated | HistoryAction::Deleted) {
                landed = true;
                break;
            }
        }
        if !landed {
            debug!(entries = record.len(), "rollback: no previous value");
            return Ok(None);
        }

        let restored = self.codec.decode(&working)?;
        let diff = self.engine.diff(&working, current);

        debug!(ops = diff.len(), entries = record.len() + 1, "rollback");
        record.append(HistoryEntry::rollback(Utc::now(), diff));
        record.str_last = Some(working);
        Ok(Some(restored))
    }

    /// Attach the record to a reconstructed value and hand it back to the source.
    ///
    /// If anything failed, including the attach itself, `original` goes back
    /// instead of the updated record.
    fn finish<S>(
        value: &mut Value,
        source: &mut S,
        record: VersioningRecord,
        original: VersioningRecord,
        result: StoreResult<Option<Value>>,
    ) -> StoreResult<Option<Value>>
    where
        S: RecordSource + ?Sized,
    {
        let result = result.and_then(|restored| match restored {
            Some(mut restored) => {
                source.attach(&mut restored, &record)?;
                Ok(Some(restored))
            }
            None => Ok(None),
        });
        let record = if result.is_ok() { record } else { original };
        source.restore(value, record)?;
        result
    }
}
