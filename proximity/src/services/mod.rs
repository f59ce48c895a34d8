//! Services module
//!
//! Business logic services that coordinate between the platform, the
//! repository and the caller.

pub mod geofence;
pub mod notifications;
pub mod reminders;
pub mod settings;

pub use geofence::{GeofenceMonitor, RegionEvent, RegionEventKind, RegionWatch, WatchOutcome};
pub use notifications::NotificationDispatcher;
pub use reminders::RemindersService;
pub use settings::SettingsService;
