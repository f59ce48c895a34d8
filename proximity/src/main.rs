// Proximity Reminders - location-triggered reminder service
// Entry point: runs the core against the in-memory platform services

use proximity_reminders::app;
use proximity_reminders::platform::{SimulatedLocationService, SimulatedNotificationService};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proximity_reminders=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Proximity Reminders");

    let data_dir = app::default_data_dir()?;
    let location = Arc::new(SimulatedLocationService::default());
    let notifications = Arc::new(SimulatedNotificationService::new());

    let (state, event_loop) = app::setup(data_dir, location, notifications).await?;

    tracing::info!(
        "{} outstanding reminders, {} regions watched",
        state.reminders_service.outstanding_count(),
        state.monitor.active_count()
    );

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down");
    event_loop.abort();

    Ok(())
}
