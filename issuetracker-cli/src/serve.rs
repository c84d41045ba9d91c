use crate::cli::ServeArgs;
use crate::error::{CliError, CliResult, IntoCliResult};
use crate::signal_handler::spawn_shutdown_listener;
use issuetracker::{open_storage, InstrumentedIssueStorage, IssueServer, ServerConfig};
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Resolve the server configuration for `serve`
///
/// Configuration problems map to exit code 2.
pub fn resolve_config(args: &ServeArgs) -> CliResult<ServerConfig> {
    let mut config = ServerConfig::load(args.config.as_deref()).cli_validation_error()?;
    args.apply_to(&mut config);
    config.validate().cli_validation_error()?;
    Ok(config)
}

/// Run the API server until Ctrl-C
pub async fn run_serve(args: ServeArgs) -> CliResult<()> {
    let config = resolve_config(&args)?;
    tracing::debug!("Effective configuration: {:?}", config);

    let storage = open_storage(&config)
        .cli_general_error()
        .map_err(|e| e.context("Failed to open issue storage"))?;
    let instrumented = InstrumentedIssueStorage::new(storage);
    let metrics = instrumented.metrics().clone();

    let server = IssueServer::bind(&config, Arc::new(instrumented))
        .await
        .cli_general_error()?;
    let address = server.local_addr().cli_general_error()?;
    tracing::info!(
        "Serving issues on http://{}/api/issues/:project ({} storage)",
        address,
        config.storage
    );

    let shutdown = CancellationToken::new();
    spawn_shutdown_listener(shutdown.clone());

    let started = Instant::now();
    let result = server.run(shutdown).await;

    let snapshot = metrics.get_stats();
    tracing::info!("{}", snapshot);
    tracing::debug!(
        "{:.2} storage operations/s over {:.1}s",
        snapshot.operations_per_second(started.elapsed().as_secs_f64()),
        started.elapsed().as_secs_f64()
    );

    result.map_err(|e| CliError::general(e).context("Server stopped with an error"))
}
