use std::time::Duration;
use tracing::{debug, error, info, warn};

use tube_converter::core::artifacts::spawn_sweeper;
use tube_converter::utils::logging::{filter_for_level, init_tracing_with_default};
use tube_converter::{server, AppState, JobEvent, NAME, VERSION};

const ARTIFACT_SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    let config = AppState::load_or_initialize_config();
    init_tracing_with_default(&filter_for_level(&config.advanced.log_level));

    info!("🚀 Starting {} v{}", NAME, VERSION);
    debug!("Effective configuration: {:?}", config.to_env_vars());

    let address = config.server.bind_address();
    let (state, mut events) = match AppState::with_events(config).await {
        Ok(pair) => pair,
        Err(e) => {
            error!("❌ Failed to initialize application state: {:#}", e);
            std::process::exit(1);
        }
    };

    let event_logger = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match &event {
                JobEvent::Progress { .. } => {}
                other => debug!("Job event: {:?}", other),
            }
        }
    });
    let sweeper = spawn_sweeper(state.conversion.artifacts(), ARTIFACT_SWEEP_PERIOD);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("🛑 Shutdown signal received");
    };

    if let Err(e) = server::serve(state.clone(), &address, shutdown).await {
        error!("❌ Server error: {:#}", e);
    }

    sweeper.abort();
    if let Err(e) = state.job_manager.write().await.shutdown().await {
        warn!("Failed to flush job history: {}", e);
    }
    event_logger.abort();
    info!("✅ {} stopped", NAME);
}
