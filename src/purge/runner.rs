//! Per-institution batch-deletion runs.
//!
//! For each configured institution the runner validates its record,
//! applies the run-mode gate, loads the deletion-request file, and drives
//! every row through expansion, query building, and submission before
//! polling the store for the jobs it accepted.

use std::collections::BTreeMap;

use crate::{
    config::{InstitutionConfig, InstitutionRecord, RunContext},
    events::EventClient,
    purge::{
        BatchDeleteQuery, DeletionSubmitter, SubmitOutcome, VerificationPoller, expand_aliases,
        load_requests, request_file_path,
    },
};

/// Per-institution counter of failed rows. Created fresh for every
/// institution and read once at reporting time, so concurrent institution
/// processing could never share a tally.
#[derive(Debug, Default)]
pub struct ErrorTally {
    errors: u32,
}

impl ErrorTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self) {
        self.errors += 1;
    }

    pub fn count(&self) -> u32 {
        self.errors
    }

    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

/// Results from a full run across all configured institutions.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Institutions that entered processing.
    pub processed: usize,
    /// Institutions skipped by the run-mode gate or for invalid records.
    pub skipped: usize,
}

/// Drives batch deletion across the configured institutions.
pub struct InstitutionRunner {
    http: reqwest::Client,
    store_base: String,
    events: EventClient,
    context: RunContext,
}

impl InstitutionRunner {
    pub fn new(
        http: reqwest::Client,
        store_base: String,
        events: EventClient,
        context: RunContext,
    ) -> Self {
        Self {
            http,
            store_base,
            events,
            context,
        }
    }

    /// Process every eligible institution sequentially.
    ///
    /// Institution-level failures are contained: an invalid record or a
    /// missing request file skips that institution and the run continues.
    pub async fn run(&self, institutions: &BTreeMap<String, InstitutionRecord>) -> RunSummary {
        let app = format!("xapi-batch-delete-{}", self.context.mode());
        let mut summary = RunSummary::default();

        for (key, record) in institutions {
            let config = match record.validate() {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!(institution = %key, error = %e, "error returning required fields");
                    summary.skipped += 1;
                    continue;
                }
            };

            if !self.context.should_process(&config.short_name) {
                summary.skipped += 1;
                continue;
            }

            self.process_institution(&app, &config).await;
            summary.processed += 1;
        }

        summary
    }

    async fn process_institution(&self, app: &str, config: &InstitutionConfig) {
        tracing::info!(institution = %config.short_name, app, "starting institution run");
        self.events
            .post_event(app, "starting-inst", &config.short_name, "", "")
            .await;

        let path = request_file_path(&config.data_root);
        let requests = match load_requests(&path) {
            Ok(requests) => requests,
            Err(e) => {
                // No completion event fires on load failure.
                tracing::error!(
                    institution = %config.short_name,
                    error = %e,
                    "file not found, ensure that the file is correctly named and in the correct directory"
                );
                return;
            }
        };

        let submitter = DeletionSubmitter::new(
            self.http.clone(),
            &self.store_base,
            &config.credentials,
        );
        let poller = VerificationPoller::new(
            self.http.clone(),
            &self.store_base,
            &config.credentials,
        );

        let mut tally = ErrorTally::new();
        let mut accepted = 0usize;

        for (row, request) in requests.iter().enumerate() {
            // Row failures are isolated: remaining rows are still attempted.
            if let Err(e) = request.validate() {
                tracing::error!(row, error = %e, "rejecting deletion request row");
                tally.record();
                continue;
            }

            let aliases = expand_aliases(request);
            let query =
                match BatchDeleteQuery::build(aliases, &request.start_date, &request.end_date) {
                    Ok(query) => query,
                    Err(e) => {
                        tracing::error!(row, error = %e, "rejecting deletion request row");
                        tally.record();
                        continue;
                    }
                };

            match submitter.submit(&query).await {
                Ok(SubmitOutcome::Accepted) => accepted += 1,
                Ok(SubmitOutcome::Rejected { status }) => {
                    tracing::error!(row, %status, "batch delete request rejected by the store");
                    tally.record();
                }
                Err(e) => {
                    tracing::error!(row, error = %e, "batch delete submission failed");
                    tally.record();
                }
            }
        }

        // Verification is always attempted but is a no-op with nothing
        // accepted.
        if accepted > 0 {
            tracing::info!(accepted, "listing batch delete jobs accepted by the store");
            match poller.verify(accepted).await {
                Ok(listing) => tracing::info!(listing = %listing, "pending batch delete jobs"),
                Err(e) => {
                    tracing::warn!(error = %e, "could not list pending batch delete jobs");
                }
            }
        } else {
            tracing::info!("no requests sent to the store, check the request file");
        }

        if tally.is_clean() {
            tracing::info!(institution = %config.short_name, "finished institution successfully");
            self.events
                .post_event(
                    self.context.mode().as_str(),
                    "finished inst",
                    &config.short_name,
                    "success",
                    "",
                )
                .await;
        } else {
            tracing::info!(
                institution = %config.short_name,
                errors = tally.count(),
                "finished institution with errors"
            );
            self.events
                .post_event(
                    self.context.mode().as_str(),
                    "finished inst",
                    &config.short_name,
                    "completed with errors",
                    &format!("errors: {}", tally.count()),
                )
                .await;
        }
    }
}
