//! Application configuration constants
//!
//! Central location for all configuration constants, resource limits,
//! and validation boundaries used throughout the application.

// ===== Region Monitoring =====

/// Radius of the circle watched around a reminder's location, in meters
pub const DEFAULT_MONITORING_RADIUS_METERS: f64 = 50.0;

/// Smallest radius accepted from settings. Below this the platform
/// reports crossings too eagerly to be useful.
pub const MIN_MONITORING_RADIUS_METERS: f64 = 10.0;

/// Largest radius accepted from settings. The effective radius is still
/// clamped to what the location service reports at runtime.
pub const MAX_MONITORING_RADIUS_METERS: f64 = 10_000.0;

/// Concurrent region watches the platform historically honors
pub const DEFAULT_MAX_MONITORED_REGIONS: usize = 20;

/// Upper bound for the configurable region capacity
pub const MAX_MONITORED_REGIONS_LIMIT: usize = 100;

// ===== Notifications =====

/// Category attached to every reminder notification
pub const REMINDER_CATEGORY: &str = "Reminder";

/// Action identifier that marks a reminder as completed
pub const COMPLETE_ACTION_ID: &str = "Completed";

/// Button title of the completion action
pub const COMPLETE_ACTION_TITLE: &str = "Mark as completed";

/// Sound played with reminder notifications
pub const DEFAULT_NOTIFICATION_SOUND: &str = "reminder.caf";

/// Shown instead of an empty description. Display only, never stored.
pub const MISSING_DESCRIPTION_PLACEHOLDER: &str = "No title";

// ===== User-facing alerts =====

pub const NOTIFICATION_SETTINGS_ALERT_TITLE: &str = "Change Settings";
pub const NOTIFICATION_SETTINGS_ALERT_TEXT: &str =
    "You will not receive any notifications, please change your settings to receive notifications.";

pub const LOCATION_DENIED_ALERT_TEXT: &str =
    "Please allow location services in the settings to proceed.";
pub const LOCATION_UNAVAILABLE_ALERT_TEXT: &str =
    "Please enable location services to use region monitoring.";

// ===== Files =====

/// Settings file name inside the data directory
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Database file name inside the data directory
pub const DATABASE_FILE_NAME: &str = "reminders.db";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "PROXIMITY_DATA_DIR";

// ===== Storage =====

/// Pooled connections. Region events, list reads and edits overlap.
pub const DATABASE_MAX_CONNECTIONS: u32 = 5;

/// How long a writer waits for the database lock, in seconds
pub const DATABASE_BUSY_TIMEOUT_SECS: u64 = 5;
