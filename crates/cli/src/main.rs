use crate::{
    commands::Commands,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use job_client::{api::JobApi, http::HttpJobClient};
use model::{scope::DataScope, session::SessionPhase};
use session_core::{
    locator::SessionLocator,
    persist::{IdentityStore, sled_store::SledIdentityStore},
};
use session_runtime::{controller::QuerySessionController, settings::SessionSettings};
use std::{sync::Arc, time::Duration};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};

mod commands;
mod error;
mod output;
mod shutdown;

const SURFACE: &str = "cli";

/// How long the drain loop waits for an in-flight page fetch before retrying.
const DRAIN_RETRY_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(
    name = "sift",
    version = "0.1.0",
    about = "Asynchronous query sessions for the security data lake"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Initialize logger
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(()) => ExitCode::Success,
        Err(CliError::ShutdownRequested) => {
            info!("Query session canceled");
            ExitCode::ShutdownRequested
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::GeneralError
        }
    };
    std::process::exit(code.as_i32());
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Run {
            scope,
            query,
            endpoint,
            interval_ms,
            json,
        } => {
            let controller = build_controller(endpoint, interval_ms)?;
            controller.select_scope(DataScope::new(scope)).await?;
            let job_id = controller.submit_query(&query).await?;
            if let Some(locator) = controller.locator().await {
                info!(%job_id, %locator, "query job submitted");
            }
            follow(&controller, json).await
        }
        Commands::Resume {
            locator,
            endpoint,
            interval_ms,
            json,
        } => {
            let locator = locator
                .map(|raw| raw.parse::<SessionLocator>())
                .transpose()?;
            let controller = build_controller(endpoint, interval_ms)?;
            controller.restore(locator).await?;

            if controller.snapshot().await.phase == SessionPhase::Idle {
                info!("Nothing to resume");
                return Ok(());
            }
            follow(&controller, json).await
        }
        Commands::Status { locator, endpoint } => {
            let locator: SessionLocator = locator.parse()?;
            let job_id = locator.job_id.ok_or(CliError::LocatorWithoutJob)?;
            let client = http_client(endpoint)?;
            let poll = client.poll_status(&job_id).await?;
            output::print_status(&poll);
            Ok(())
        }
        Commands::Cancel { locator, endpoint } => {
            let locator: SessionLocator = locator.parse()?;
            let job_id = locator.job_id.ok_or(CliError::LocatorWithoutJob)?;
            let client = http_client(endpoint)?;
            client.cancel(&job_id).await?;
            info!(%job_id, "cancellation requested");
            Ok(())
        }
        Commands::Last => {
            let identity = open_identity_store()?;
            let record = identity.load_identity(SURFACE).await?;
            output::print_identity(record.as_ref())
        }
    }
}

/// Follow the session to a terminal phase, canceling it on SIGINT/SIGTERM,
/// then drain and print results.
async fn follow(controller: &QuerySessionController, json: bool) -> Result<(), CliError> {
    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();
    let cancel = shutdown.cancel_token();

    let mut rx = controller.subscribe().await;
    let terminal = loop {
        let phase = rx.borrow_and_update().phase;
        if phase.is_terminal() {
            break phase;
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                controller.cancel_query().await?;
                return Err(CliError::ShutdownRequested);
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    return Err(CliError::Unexpected(
                        "session state channel closed".to_string(),
                    ));
                }
            }
        }
    };

    match terminal {
        SessionPhase::Succeeded => {
            drain_pages(controller).await?;
            let session = controller.snapshot().await;
            info!(rows = session.rows.len(), "query succeeded");
            output::print_rows(&session, json)
        }
        SessionPhase::Failed => {
            let session = controller.snapshot().await;
            Err(CliError::QueryFailed(
                session
                    .error_message
                    .unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
        SessionPhase::Canceled => {
            info!("Query canceled remotely");
            Ok(())
        }
        // Terminal phases only; unreachable by the loop above.
        _ => Ok(()),
    }
}

/// Fetch pages until the result set is exhausted. `load_more` is a no-op
/// while the scheduler's own first-page fetch is still in flight, so retry
/// until the session reports a fetched page and no continuation token.
async fn drain_pages(controller: &QuerySessionController) -> Result<(), CliError> {
    loop {
        if controller.load_more().await? {
            continue;
        }
        let session = controller.snapshot().await;
        if !session.has_more() {
            return Ok(());
        }
        time::sleep(DRAIN_RETRY_INTERVAL).await;
    }
}

fn http_client(endpoint: Option<String>) -> Result<HttpJobClient, CliError> {
    match endpoint {
        Some(endpoint) => Ok(HttpJobClient::new(
            endpoint,
            std::env::var("SIFT_TOKEN").ok(),
        )),
        None => Ok(HttpJobClient::from_env()?),
    }
}

fn open_identity_store() -> Result<Arc<SledIdentityStore>, CliError> {
    let home = dirs::home_dir()
        .ok_or_else(|| CliError::Unexpected("Could not determine home directory".into()))?;
    let path = home.join(".sift/state");
    let store = SledIdentityStore::open(&path).map_err(|err| {
        CliError::Unexpected(format!(
            "Failed to open state store at {}: {err}",
            path.display()
        ))
    })?;
    Ok(Arc::new(store))
}

fn build_controller(
    endpoint: Option<String>,
    interval_ms: Option<u64>,
) -> Result<Arc<QuerySessionController>, CliError> {
    let client: Arc<dyn JobApi> = Arc::new(http_client(endpoint)?);
    let identity: Arc<dyn IdentityStore> = open_identity_store()?;
    let settings = match interval_ms {
        Some(ms) => SessionSettings::with_poll_interval(Duration::from_millis(ms)),
        None => SessionSettings::default(),
    };

    let controller = QuerySessionController::new(client, identity, SURFACE, settings)?;
    Ok(Arc::new(controller))
}
