//! Error types for the diff crate.

/// Errors that can occur while applying a diff.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// A replace-operation addressed a region outside the text it was applied to.
    #[error("replace region {start}..{start}+{size} is outside a text of {len} chars")]
    OutOfBounds { start: usize, size: usize, len: usize },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
