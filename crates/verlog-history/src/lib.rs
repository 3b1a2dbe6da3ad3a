//! Diff-chain history for structured values.
//!
//! Instead of keeping every version of a value, a [`VersioningRecord`]
//! stores the latest snapshot text plus a log of entries whose diffs lead
//! back, one step at a time, to every earlier state. [`HistoryStore`]
//! implements the four operations over such a record:
//!
//! - `push` commits the current state (`created`, then `updated` entries)
//! - `pop` drops the last entry and returns the state it superseded
//! - `delete` appends a tombstone; a deleted value refuses further pushes
//! - `rollback` restores the previous state and records that as a new entry
//!
//! The record either lives inside the value under a reserved field
//! ([`EmbeddedRecord`]) or is held by the caller ([`ExternalRecord`]).
//!
//! ```
//! use serde_json::json;
//! use verlog_history::{HistoryStore, Outcome};
//!
//! let store = HistoryStore::default();
//! let mut doc = json!({"title": "X", "items": ["A", "B"]});
//! assert_eq!(store.push(&mut doc, None).unwrap(), Outcome::Applied);
//!
//! doc["items"].as_array_mut().unwrap().push(json!("C"));
//! store.push(&mut doc, None).unwrap();
//!
//! let previous = store.rollback(&mut doc, None).unwrap().unwrap();
//! assert_eq!(previous["items"], json!(["A", "B"]));
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod record;
pub mod replay;
pub mod source;
pub mod store;
pub mod validation;

pub use codec::{Codec, JsonCodec};
pub use config::{StoreConfig, DEFAULT_LABEL};
pub use error::{CodecError, StoreError, StoreResult};
pub use record::{HistoryAction, HistoryEntry, VersioningRecord};
pub use replay::{replay, ReplayedState};
pub use source::{EmbeddedRecord, ExternalRecord, RecordSource};
pub use store::{HistoryStore, Outcome};
pub use validation::{RecordValidator, ValidationReport, Violation, ViolationKind};

// Re-export the diff types that appear in records.
pub use verlog_diff::{DiffEngine, DiffOp};
