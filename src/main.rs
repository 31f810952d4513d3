//! Batch-deletes learner xAPI statements from the configured statement
//! store, driven by per-institution deletion-request files.

use std::time::Duration;

use clap::Parser;
use xapi_purge::{
    config::{
        CAPABILITY_XAPI_ENABLED, CONTROL_PLANE_SECRET, ConfigClient, ControlPlaneConfig,
        RunContext,
    },
    events::EventClient,
    observability,
    purge::InstitutionRunner,
    secrets::EnvSecretStore,
};

/// CLI arguments for the purge run.
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Delete xAPI data on request by reading an institution's deletion-request file \
             and setting off batch deletes against the statement store"
)]
struct Args {
    /// Run mode: 'interactive' to run against a single institution,
    /// 'testing' to run on data that is not sent to the live store
    #[arg(short = 'r', long)]
    run_mode: String,

    /// Institution short name to process
    #[arg(short = 'u', long)]
    institution: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    observability::init_tracing();

    // Run-mode validation is the only process-fatal check before any
    // institution is touched.
    let context = match RunContext::new(&args.run_mode, args.institution) {
        Ok(context) => context,
        Err(e) => {
            tracing::error!(error = %e, "run parameter invalid");
            std::process::exit(1);
        }
    };

    let secrets = EnvSecretStore::new();
    let control = match ControlPlaneConfig::load(&secrets, CONTROL_PLANE_SECRET).await {
        Ok(control) => control,
        Err(e) => {
            tracing::error!(error = %e, "failed to load control-plane settings");
            std::process::exit(1);
        }
    };

    let http = match reqwest::Client::builder()
        .timeout(Duration::from_secs(control.request_timeout_secs))
        .build()
    {
        Ok(http) => http,
        Err(e) => {
            tracing::error!(error = %e, "failed to build HTTP client");
            std::process::exit(1);
        }
    };

    let events = EventClient::new(http.clone(), control.postevent.clone(), &control.credentials());

    let app = format!("xapi-batch-delete-{}", context.mode());
    events
        .post_event(&app, &format!("started-{}", context.mode()), "", "", "")
        .await;

    let config_client = ConfigClient::new(http.clone(), control.api_base.clone(), &control.credentials());
    let institutions = match config_client.institutions(CAPABILITY_XAPI_ENABLED).await {
        Ok(institutions) => institutions,
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch institution configuration");
            std::process::exit(1);
        }
    };

    let runner = InstitutionRunner::new(http, control.store_base.clone(), events, context);
    let summary = runner.run(&institutions).await;

    tracing::info!(
        processed = summary.processed,
        skipped = summary.skipped,
        "run complete"
    );
}
