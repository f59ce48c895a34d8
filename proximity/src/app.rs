//! Application state and initialization
//!
//! This module wires the services together. Platform collaborators are
//! required at construction; nothing is attached after the fact.

use crate::config;
use crate::database::{create_pool, Repository};
use crate::error::{AppError, Result};
use crate::platform::{LocationService, NotificationService};
use crate::services::{GeofenceMonitor, NotificationDispatcher, RemindersService, SettingsService};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub app_data_dir: PathBuf,
    pub settings_service: SettingsService,
    pub reminders_service: RemindersService,
    pub monitor: GeofenceMonitor,
}

/// Resolve the data directory: `PROXIMITY_DATA_DIR`, else the user data dir
pub fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(config::DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }

    dirs::data_dir()
        .map(|dir| dir.join("proximity-reminders"))
        .ok_or_else(|| AppError::Generic("Failed to resolve a data directory".to_string()))
}

/// Application setup - called once on startup.
///
/// Returns the state and the handle of the region event loop.
pub async fn setup(
    app_data_dir: PathBuf,
    location: Arc<dyn LocationService>,
    notifications: Arc<dyn NotificationService>,
) -> Result<(AppState, JoinHandle<()>)> {
    tracing::info!("Initializing application in {:?}", app_data_dir);

    std::fs::create_dir_all(&app_data_dir)?;

    let settings_service = SettingsService::new(app_data_dir.clone());
    let settings = settings_service.load().await?;

    let pool = create_pool(&app_data_dir.join(config::DATABASE_FILE_NAME)).await?;
    let repo = Repository::new(pool);

    let (monitor, events) = GeofenceMonitor::new(location, settings.monitoring.max_regions);
    let dispatcher = NotificationDispatcher::new(notifications, settings.notifications.clone());

    // Refusals are shown to the user but do not stop startup
    if let Err(e) = dispatcher.configure() {
        tracing::warn!("Notifications unavailable: {}", e);
    }

    let reminders_service = RemindersService::new(
        repo,
        monitor.clone(),
        dispatcher,
        settings.monitoring.radius_meters,
    );

    match reminders_service.request_location_authorization() {
        Ok(state) => tracing::info!("Location authorization: {:?}", state),
        Err(e) => tracing::warn!("Region monitoring unavailable: {}", e),
    }

    reminders_service.initialize().await?;
    let event_loop = reminders_service.clone().start_event_loop(events);

    let state = AppState {
        app_data_dir,
        settings_service,
        reminders_service,
        monitor,
    };

    tracing::info!("Application initialized successfully");

    Ok((state, event_loop))
}
