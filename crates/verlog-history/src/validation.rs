//! Integrity checks for versioning records.
//!
//! The store never validates records on its own: a corrupted chain simply
//! reconstructs wrong text. Callers that load records from untrusted places
//! can run [`RecordValidator`] first.

use verlog_diff::apply_diff;

use crate::codec::Codec;
use crate::record::{HistoryAction, VersioningRecord};

/// Result of record validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub entry_count: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns `true` if at least one violation of `kind` was found.
    pub fn has(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }
}

/// A specific problem found in a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// History index the problem was found at; `None` for record-level problems.
    pub index: Option<usize>,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// The first entry is not `created`, or `created` appears later.
    MisplacedCreated,
    /// A `created` or `deleted` entry carries a diff.
    UnexpectedDiff,
    /// An `updated` or `rollback` entry has no diff.
    MissingDiff,
    /// The history is non-empty but there is no snapshot.
    MissingSnapshot,
    /// An `updated` entry directly follows a tombstone.
    UpdateAfterDelete,
    /// A diff addresses text outside the state it is applied to.
    BrokenDiff,
    /// A reconstructed state is rejected by the codec.
    Undecodable,
}

/// Record validator.
pub struct RecordValidator;

impl RecordValidator {
    /// Check entry structure, then replay the chain and decode every state.
    pub fn validate<C: Codec + ?Sized>(record: &VersioningRecord, codec: &C) -> ValidationReport {
        let mut violations = Vec::new();
        Self::check_structure(record, &mut violations);
        Self::check_chain(record, codec, &mut violations);
        ValidationReport {
            entry_count: record.len(),
            violations,
        }
    }

    fn check_structure(record: &VersioningRecord, violations: &mut Vec<Violation>) {
        let mut previous: Option<HistoryAction> = None;

        for (index, entry) in record.history.iter().enumerate() {
            let first = index == 0;
            if first != (entry.action == HistoryAction::Created) {
                violations.push(Violation {
                    index: Some(index),
                    kind: ViolationKind::MisplacedCreated,
                    description: if first {
                        format!("history starts with `{}`", entry.action)
                    } else {
                        "`created` after the first entry".into()
                    },
                });
            }

            match (entry.action.carries_diff(), entry.diff.is_some()) {
                (true, false) => violations.push(Violation {
                    index: Some(index),
                    kind: ViolationKind::MissingDiff,
                    description: format!("`{}` entry without diff", entry.action),
                }),
                (false, true) => violations.push(Violation {
                    index: Some(index),
                    kind: ViolationKind::UnexpectedDiff,
                    description: format!("`{}` entry carries a diff", entry.action),
                }),
                _ => {}
            }

            if entry.action == HistoryAction::Updated && previous == Some(HistoryAction::Deleted) {
                violations.push(Violation {
                    index: Some(index),
                    kind: ViolationKind::UpdateAfterDelete,
                    description: "value was updated after being deleted".into(),
                });
            }
            previous = Some(entry.action);
        }
    }

    fn check_chain<C: Codec + ?Sized>(
        record: &VersioningRecord,
        codec: &C,
        violations: &mut Vec<Violation>,
    ) {
        if record.is_empty() {
            return;
        }
        let Some(snapshot) = record.snapshot() else {
            violations.push(Violation {
                index: None,
                kind: ViolationKind::MissingSnapshot,
                description: "history is non-empty but no snapshot is stored".into(),
            });
            return;
        };

        let mut text = snapshot.to_owned();
        for (index, entry) in record.history.iter().enumerate().rev() {
            if let Err(e) = codec.decode(&text) {
                violations.push(Violation {
                    index: Some(index),
                    kind: ViolationKind::Undecodable,
                    description: format!("state after entry {index}: {e}"),
                });
            }
            if !entry.action.carries_diff() {
                continue;
            }
            match apply_diff(&text, entry.diff_ops()) {
                Ok(previous) => text = previous,
                Err(e) => {
                    violations.push(Violation {
                        index: Some(index),
                        kind: ViolationKind::BrokenDiff,
                        description: e.to_string(),
                    });
                    // Older states cannot be reconstructed past this point.
                    return;
                }
            }
        }
    }
}
