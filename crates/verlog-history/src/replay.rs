//! Reconstruct every state recorded in a history chain.

use chrono::{DateTime, Utc};
use verlog_diff::apply_diff;

use crate::error::StoreResult;
use crate::record::{HistoryAction, VersioningRecord};

/// The snapshot text a history entry left behind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayedState {
    /// Position of the entry in the history.
    pub index: usize,
    pub action: HistoryAction,
    pub timestamp: DateTime<Utc>,
    /// Snapshot text current right after the entry was recorded.
    ///
    /// For a tombstone this is the retained state it hides. `None` when the
    /// record has no snapshot to start from.
    pub text: Option<String>,
}

/// Walk the chain from the newest snapshot back to the first entry.
///
/// States are returned newest first. Without a snapshot every entry is still
/// listed, with no text. Fails if a diff does not fit the text it is applied to.
pub fn replay(record: &VersioningRecord) -> StoreResult<Vec<ReplayedState>> {
    let mut text = record.snapshot().map(str::to_owned);
    let mut states = Vec::with_capacity(record.len());

    for (index, entry) in record.history.iter().enumerate().rev() {
        let before = match &text {
            Some(current) if entry.action.carries_diff() => {
                Some(apply_diff(current, entry.diff_ops())?)
            }
            _ => text.clone(),
        };
        states.push(ReplayedState {
            index,
            action: entry.action,
            timestamp: entry.timestamp,
            text,
        });
        text = before;
    }

    Ok(states)
}
