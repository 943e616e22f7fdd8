//! History store error types.

use chrono::NaiveDateTime;

/// Errors from the history archive.
///
/// Filesystem errors are passed through unchanged and never retried:
/// compaction is not safe to repeat blindly.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("history archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("no history record with id {0}")]
    NotFound(u64),

    /// The archive holds something the store did not write
    #[error("corrupt history archive: {0}")]
    CorruptArchive(String),

    /// The clock is outside the range the archive format can store
    #[error("timestamp {0} cannot be stored in the archive")]
    InvalidTimestamp(NaiveDateTime),
}
