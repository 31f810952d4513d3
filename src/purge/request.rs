//! Deletion-request files: one tab-separated file per institution listing
//! the students whose activity must be purged.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Request files live under this directory inside an institution's data
/// root.
pub const REQUEST_SUBDIR: &str = "activity/delete-request";

/// Expected file name of the pending-deletion file.
pub const REQUEST_FILE: &str = "deletions.tsv";

/// One row of an institution's pending-deletion file: three independent
/// identifier spaces for the same person plus the inclusive activity
/// window to purge. Read once per run and never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletionRequest {
    #[serde(rename = "STUDENT_ID")]
    pub student_id: String,
    #[serde(rename = "VLE_ID")]
    pub vle_id: String,
    #[serde(rename = "SHIB_ID")]
    pub shib_id: String,
    #[serde(rename = "START_DATE")]
    pub start_date: String,
    #[serde(rename = "END_DATE")]
    pub end_date: String,
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("deletion-request file not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read deletion-request file")]
    Load(#[from] csv::Error),

    #[error("row has an empty {0} identifier")]
    EmptyIdentifier(&'static str),
}

impl DeletionRequest {
    /// Reject rows with empty identifier fields before alias expansion, so
    /// an empty account name is never matched against the store.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.student_id.is_empty() {
            return Err(RequestError::EmptyIdentifier("STUDENT_ID"));
        }
        if self.vle_id.is_empty() {
            return Err(RequestError::EmptyIdentifier("VLE_ID"));
        }
        if self.shib_id.is_empty() {
            return Err(RequestError::EmptyIdentifier("SHIB_ID"));
        }
        Ok(())
    }
}

/// Path of an institution's pending-deletion file.
pub fn request_file_path(data_root: &Path) -> PathBuf {
    data_root.join(REQUEST_SUBDIR).join(REQUEST_FILE)
}

/// Load every row of a deletion-request file.
///
/// Tab-separated with a header row. A missing or unreadable file is an
/// institution-level failure; the caller skips the institution.
pub fn load_requests(path: &Path) -> Result<Vec<DeletionRequest>, RequestError> {
    if !path.is_file() {
        return Err(RequestError::NotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;

    let mut requests = Vec::new();
    for row in reader.deserialize() {
        requests.push(row?);
    }
    Ok(requests)
}
