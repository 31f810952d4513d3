//! Submission of batch-delete queries to the store.

use reqwest::{StatusCode, header};
use thiserror::Error;

use super::query::BatchDeleteQuery;
use crate::config::Credentials;

/// Path of the store's batch-delete-initiate endpoint.
pub const INITIALISE_PATH: &str = "/api/v2/batchdelete/initialise";

/// Classification of the store's response to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 2xx: the store accepted the batch-delete job.
    Accepted,
    /// Any other status. Recorded and counted; never retried.
    Rejected { status: StatusCode },
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted)
    }
}

/// Transport-level submission failure (connection refused, timeout).
/// Treated like a rejection by the caller: recorded, counted, no retry.
#[derive(Debug, Error)]
#[error("batch delete submission failed")]
pub struct SubmitError(#[from] reqwest::Error);

/// Sends batch-delete queries over an authenticated channel.
pub struct DeletionSubmitter {
    http: reqwest::Client,
    base_url: String,
    authorization: String,
}

impl DeletionSubmitter {
    pub fn new(http: reqwest::Client, base_url: &str, credentials: &Credentials) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization: credentials.basic_auth_header(),
        }
    }

    /// POST one query to the initiate endpoint and classify the response.
    ///
    /// The body is the bare filter object, not the single-element list the
    /// query is built as.
    pub async fn submit(&self, query: &BatchDeleteQuery) -> Result<SubmitOutcome, SubmitError> {
        let url = format!("{}{}", self.base_url, INITIALISE_PATH);
        tracing::info!(url = %url, "sending batch delete request");

        let response = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, &self.authorization)
            .json(query.wire_body())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(%status, "batch delete request accepted");
            Ok(SubmitOutcome::Accepted)
        } else {
            Ok(SubmitOutcome::Rejected { status })
        }
    }
}
