use verlog_diff::DiffError;

/// Errors raised by a [`Codec`](crate::Codec).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

/// Errors produced by history store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("diff error: {0}")]
    Diff(#[from] DiffError),

    #[error("embedded history requires an object value")]
    NotAnObject,

    #[error("malformed versioning record: {0}")]
    MalformedRecord(String),

    #[error("versioning record has history but no snapshot")]
    MissingSnapshot,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
