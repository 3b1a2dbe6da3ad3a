//! Diff application: replay replace-operations onto the newer text.

use crate::builder::DiffOp;
use crate::error::{DiffError, DiffResult};

/// Apply `ops` to `text` in list order and return the resulting text.
///
/// `ops` must be ordered by descending `start`, as produced by
/// [`DiffEngine::diff`](crate::DiffEngine::diff); offsets are then valid
/// against the original text even though every splice mutates it. An
/// operation addressing a region outside the current text fails with
/// [`DiffError::OutOfBounds`]. A well-formed but wrong diff is not detected.
pub fn apply_diff(text: &str, ops: &[DiffOp]) -> DiffResult<String> {
    if ops.is_empty() {
        return Ok(text.to_owned());
    }

    let mut chars: Vec<char> = text.chars().collect();
    for op in ops {
        let end = op
            .start
            .checked_add(op.size)
            .filter(|end| *end <= chars.len())
            .ok_or(DiffError::OutOfBounds {
                start: op.start,
                size: op.size,
                len: chars.len(),
            })?;
        chars.splice(op.start..end, op.substitution.chars());
    }

    Ok(chars.into_iter().collect())
}
