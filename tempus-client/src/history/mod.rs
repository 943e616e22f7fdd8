//! Append-only log of past requests, kept in a zip archive.
//!
//! Each record is one archive entry named by its decimal id and holding
//! the XML bundle from [`encode_record`](crate::protocol::encode_record).
//! The archive's own per-entry modification time is the record timestamp.

mod error;
mod store;

pub use error::HistoryError;
pub use store::{HistoryRecord, HistoryStore, RecordSummary};
