//! Text diff engine for verlog.
//!
//! Computes the edit needed to go *back* from a newer text to an older one.
//! The engine matches shared substrings ("tokens") greedily from left to
//! right and turns the gaps between them into replace-operations.
//!
//! # Key Types
//!
//! - [`DiffEngine`] -- token matching and diff building, parameterised by the minimum token length
//! - [`TokenMatch`] -- a shared substring located in both texts
//! - [`DiffOp`] -- one replace-operation, offsets counted in `char`s of the newer text
//! - [`apply_diff`] -- replays a diff onto the newer text
//!
//! ```
//! use verlog_diff::{apply_diff, DiffEngine};
//!
//! let engine = DiffEngine::default();
//! let newer = r#"{"items":["A","B","C"]}"#;
//! let older = r#"{"items":["A","B"]}"#;
//! let diff = engine.diff(newer, older);
//! assert_eq!(apply_diff(newer, &diff).unwrap(), older);
//! ```

pub mod apply;
pub mod builder;
pub mod error;
pub mod token;

pub use apply::apply_diff;
pub use builder::DiffOp;
pub use error::{DiffError, DiffResult};
pub use token::{DiffEngine, TokenMatch, DEFAULT_MIN_TOKEN_LEN};
