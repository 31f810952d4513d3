//! Post-submission verification against the store's job listing.

use reqwest::{StatusCode, header};
use thiserror::Error;

use crate::config::Credentials;

/// Path of the store's batch-delete job-listing endpoint.
pub const LISTING_PATH: &str = "/api/connection/batchdelete";

/// Listing filter: jobs not yet marked done.
const PENDING_FILTER: &str = r#"{"done":false}"#;

/// Listing order: newest-created first, ties broken by ascending job id.
const SORT_NEWEST_FIRST: &str = r#"{"createdAt":-1,"_id":1}"#;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("job listing request failed")]
    Transport(#[from] reqwest::Error),

    #[error("job listing request returned {0}")]
    Status(StatusCode),
}

/// Lists the store's most recent pending batch-delete jobs.
///
/// Best-effort visibility: the listing is bounded by the accepted count
/// and returned raw for logging; jobs are not correlated back to the
/// submissions that produced them.
pub struct VerificationPoller {
    http: reqwest::Client,
    base_url: String,
    authorization: String,
}

impl VerificationPoller {
    pub fn new(http: reqwest::Client, base_url: &str, credentials: &Credentials) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization: credentials.basic_auth_header(),
        }
    }

    /// Fetch the `accepted` most recent not-done jobs. Only meaningful
    /// when `accepted > 0`; the runner skips the call otherwise.
    pub async fn verify(&self, accepted: usize) -> Result<String, VerifyError> {
        let url = format!("{}{}", self.base_url, LISTING_PATH);
        let first = accepted.to_string();

        let response = self
            .http
            .get(&url)
            .query(&[
                ("filter", PENDING_FILTER),
                ("sort", SORT_NEWEST_FIRST),
                ("first", first.as_str()),
            ])
            .header(header::AUTHORIZATION, &self.authorization)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::Status(status));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path, query_param},
    };

    use super::*;

    fn poller_for(server: &MockServer) -> VerificationPoller {
        VerificationPoller::new(
            reqwest::Client::new(),
            &server.uri(),
            &Credentials::new("user", "pass"),
        )
    }

    #[tokio::test]
    async fn test_verify_query_parameters() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(LISTING_PATH))
            .and(query_param("filter", r#"{"done":false}"#))
            .and(query_param("sort", r#"{"createdAt":-1,"_id":1}"#))
            .and(query_param("first", "3"))
            .and(header("Authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(r#"[{"_id":"j1"}]"#, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let listing = poller_for(&server).verify(3).await.unwrap();
        assert_eq!(listing, r#"[{"_id":"j1"}]"#);
    }

    #[tokio::test]
    async fn test_verify_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = poller_for(&server).verify(1).await.unwrap_err();
        assert!(matches!(
            err,
            VerifyError::Status(StatusCode::UNAUTHORIZED)
        ));
    }
}
