//! HTTP client for the config service.
//!
//! The service maps capability flags to the institutions that have the
//! capability enabled, keyed by institution id.

use std::collections::BTreeMap;

use reqwest::{StatusCode, header};
use thiserror::Error;

use super::{Credentials, InstitutionRecord};

#[derive(Debug, Error)]
pub enum ConfigFetchError {
    #[error("config service request failed")]
    Transport(#[from] reqwest::Error),

    #[error("config service returned {0}")]
    Status(StatusCode),
}

/// Fetches institution configuration from the config service.
pub struct ConfigClient {
    http: reqwest::Client,
    api_base: String,
    authorization: String,
}

impl ConfigClient {
    pub fn new(http: reqwest::Client, api_base: String, credentials: &Credentials) -> Self {
        Self {
            http,
            api_base,
            authorization: credentials.basic_auth_header(),
        }
    }

    /// List institutions with the given capability flag enabled.
    ///
    /// `GET <api-base>sites/<capability>` with Basic auth. The map is keyed
    /// by institution id; record fields are validated later, per
    /// institution.
    pub async fn institutions(
        &self,
        capability: &str,
    ) -> Result<BTreeMap<String, InstitutionRecord>, ConfigFetchError> {
        let url = format!("{}sites/{}", self.api_base, capability);

        let response = self
            .http
            .get(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, &self.authorization)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigFetchError::Status(status));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    use super::*;

    #[tokio::test]
    async fn test_institutions_fetch() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/sites/function-uxapi-enabled"))
            .and(header("Authorization", "Basic c3ZjOnNlY3JldA=="))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{
                    "inst-1": {
                        "uxapi-username": "u1",
                        "uxapi-password": "p1",
                        "gen-shortname": "ABC",
                        "ladata-root": "/data/abc"
                    },
                    "inst-2": {
                        "gen-shortname": "DEF"
                    }
                }"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = ConfigClient::new(
            reqwest::Client::new(),
            format!("{}/api/", server.uri()),
            &Credentials::new("svc", "secret"),
        );

        let institutions = client
            .institutions("function-uxapi-enabled")
            .await
            .unwrap();
        assert_eq!(institutions.len(), 2);
        assert_eq!(
            institutions["inst-1"].short_name.as_deref(),
            Some("ABC")
        );
        // Partial records decode fine; validation is the runner's job.
        assert!(institutions["inst-2"].xapi_username.is_none());
    }

    #[tokio::test]
    async fn test_institutions_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = ConfigClient::new(
            reqwest::Client::new(),
            format!("{}/api/", server.uri()),
            &Credentials::new("svc", "secret"),
        );

        let err = client
            .institutions("function-uxapi-enabled")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigFetchError::Status(StatusCode::SERVICE_UNAVAILABLE)
        ));
    }
}
