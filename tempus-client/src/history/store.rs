use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::error::HistoryError;

/// Prefix of the archive comment that persists the id counter.
const NEXT_ID_COMMENT: &str = "next_id=";

/// Id and creation time of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: u64,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: u64,
    pub timestamp: NaiveDateTime,
    /// Opaque to the store; usually an encoded record bundle
    pub payload: String,
}

/// Append-only, id-keyed record log backed by a zip archive.
///
/// Ids start at 1 and are never reused: the counter is kept in the archive
/// comment and never moves backwards, even when the highest record is
/// removed.
///
/// Every write rewrites or appends to the whole file. Two stores open on
/// the same path (in one process or several) will lose each other's
/// writes; callers that share a path must serialize access themselves.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    archive: ZipArchive<File>,
    next_id: u64,
}

impl HistoryStore {
    /// Open the archive at `path`, creating it (and its parent
    /// directories) when missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        if !path.exists() {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                std::fs::create_dir_all(parent)?;
            }
            write_empty_archive(&path)?;
        }

        let (archive, next_id) = load(&path)?;
        debug!(path = %path.display(), next_id, "Opened history archive");
        Ok(Self {
            path,
            archive,
            next_id,
        })
    }

    /// Re-read the archive from disk, rescanning its entries for the next
    /// id. Records are kept and the id counter never moves backwards.
    pub fn reset(&mut self) -> Result<(), HistoryError> {
        self.reopen()?;
        debug!(path = %self.path.display(), next_id = self.next_id, "History reopened");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Id the next [`add_record`](Self::add_record) will use.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Append a record and return its id. The store assigns the timestamp.
    pub fn add_record(&mut self, payload: &str) -> Result<u64, HistoryError> {
        let id = self.next_id;
        let following = successor(id)?;
        let now = Local::now().naive_local();
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(to_zip_time(now)?);

        let file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let mut writer = ZipWriter::new_append(file)?;
        writer.start_file(id.to_string(), options)?;
        writer.write_all(payload.as_bytes())?;
        writer.set_comment(next_id_comment(following));
        writer.finish()?.sync_all()?;

        // Appending leaves the reader's view stale.
        self.reopen()?;
        self.next_id = self.next_id.max(following);
        info!(id, path = %self.path.display(), "History record added");
        Ok(id)
    }

    /// Delete record `id`.
    ///
    /// Zip has no in-place delete, so the other entries are copied into
    /// `<path>.new`, which is then renamed over the archive. A crash leaves
    /// either the old or the new file complete.
    pub fn remove_record(&mut self, id: u64) -> Result<(), HistoryError> {
        let name = id.to_string();
        if self.archive.index_for_name(&name).is_none() {
            return Err(HistoryError::NotFound(id));
        }

        let mut temp = self.path.clone().into_os_string();
        temp.push(".new");
        let temp = PathBuf::from(temp);

        let mut writer = ZipWriter::new(File::create(&temp)?);
        for index in 0..self.archive.len() {
            let entry = self.archive.by_index_raw(index)?;
            if entry.name() == name {
                continue;
            }
            writer.raw_copy_file(entry)?;
        }
        writer.set_comment(next_id_comment(self.next_id));
        writer.finish()?.sync_all()?;

        std::fs::rename(&temp, &self.path)?;
        self.reopen()?;
        info!(id, path = %self.path.display(), "History record removed");
        Ok(())
    }

    /// All records, most recent first; equal timestamps by descending id.
    pub fn list_summaries(&mut self) -> Result<Vec<RecordSummary>, HistoryError> {
        let mut summaries = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            let entry = self.archive.by_index(index)?;
            summaries.push(RecordSummary {
                id: parse_id(entry.name())?,
                timestamp: entry_time(entry.last_modified().into(), entry.name())?,
            });
        }
        summaries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(summaries)
    }

    pub fn get_record(&mut self, id: u64) -> Result<HistoryRecord, HistoryError> {
        let mut entry = match self.archive.by_name(&id.to_string()) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => return Err(HistoryError::NotFound(id)),
            Err(e) => return Err(e.into()),
        };

        let timestamp = entry_time(entry.last_modified().into(), entry.name())?;
        let mut payload = String::new();
        entry.read_to_string(&mut payload)?;
        Ok(HistoryRecord {
            id,
            timestamp,
            payload,
        })
    }

    /// Re-read the archive, keeping the id counter from going backwards.
    fn reopen(&mut self) -> Result<(), HistoryError> {
        let (archive, next_id) = load(&self.path)?;
        self.archive = archive;
        self.next_id = self.next_id.max(next_id);
        Ok(())
    }
}

fn write_empty_archive(path: &Path) -> Result<(), HistoryError> {
    let mut writer = ZipWriter::new(File::create(path)?);
    writer.set_comment(next_id_comment(1));
    writer.finish()?.sync_all()?;
    Ok(())
}

/// Open the archive and work out the next id from the stored counter and
/// the entry names, whichever is higher.
fn load(path: &Path) -> Result<(ZipArchive<File>, u64), HistoryError> {
    let archive = ZipArchive::new(File::open(path)?)?;

    let mut next_id = 1;
    for name in archive.file_names() {
        next_id = next_id.max(successor(parse_id(name)?)?);
    }

    let stored = std::str::from_utf8(archive.comment())
        .ok()
        .and_then(|comment| comment.strip_prefix(NEXT_ID_COMMENT))
        .and_then(|value| value.trim().parse::<u64>().ok());
    match stored {
        Some(stored) => next_id = next_id.max(stored),
        None => debug!(path = %path.display(), "No id counter in archive comment"),
    }

    Ok((archive, next_id))
}

fn next_id_comment(next_id: u64) -> String {
    format!("{NEXT_ID_COMMENT}{next_id}")
}

fn parse_id(name: &str) -> Result<u64, HistoryError> {
    name.parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| HistoryError::CorruptArchive(format!("entry {name:?} is not a record id")))
}

/// The id after `id`, refusing to wrap.
fn successor(id: u64) -> Result<u64, HistoryError> {
    id.checked_add(1)
        .ok_or_else(|| HistoryError::CorruptArchive(format!("record id {id} leaves no room for another")))
}

fn to_zip_time(at: NaiveDateTime) -> Result<zip::DateTime, HistoryError> {
    let year = u16::try_from(at.year()).map_err(|_| HistoryError::InvalidTimestamp(at))?;
    zip::DateTime::from_date_and_time(
        year,
        at.month() as u8,
        at.day() as u8,
        at.hour() as u8,
        at.minute() as u8,
        at.second() as u8,
    )
    .map_err(|_| HistoryError::InvalidTimestamp(at))
}

fn entry_time(modified: Option<zip::DateTime>, name: &str) -> Result<NaiveDateTime, HistoryError> {
    modified
        .and_then(|t| {
            NaiveDate::from_ymd_opt(t.year().into(), t.month().into(), t.day().into())?.and_hms_opt(
                t.hour().into(),
                t.minute().into(),
                t.second().into(),
            )
        })
        .ok_or_else(|| HistoryError::CorruptArchive(format!("entry {name:?} has no valid timestamp")))
}
