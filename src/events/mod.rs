//! Lifecycle event notifications to the external process-monitoring
//! service.
//!
//! Events are fire-and-forget: a failed post is logged and swallowed so a
//! monitoring outage can never abort a purge run.

use reqwest::header;

use crate::config::Credentials;

/// Posts lifecycle events to the monitoring service.
#[derive(Clone)]
pub struct EventClient {
    http: reqwest::Client,
    endpoint: String,
    authorization: String,
}

impl EventClient {
    pub fn new(http: reqwest::Client, endpoint: String, credentials: &Credentials) -> Self {
        Self {
            http,
            endpoint,
            authorization: credentials.basic_auth_header(),
        }
    }

    /// Post one lifecycle event. Never fails the caller.
    pub async fn post_event(&self, app: &str, event: &str, detail: &str, result: &str, data: &str) {
        let request = self
            .http
            .post(&self.endpoint)
            .query(&[
                ("app", app),
                ("eventname", event),
                ("detail", detail),
                ("result", result),
                ("data", data),
            ])
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, &self.authorization);

        match request.send().await {
            Ok(response) => {
                tracing::info!(
                    event,
                    detail,
                    result,
                    data,
                    status = %response.status(),
                    "posted lifecycle event"
                );
            }
            Err(e) => {
                tracing::warn!(event, detail, error = %e, "failed to post lifecycle event");
            }
        }
    }
}
