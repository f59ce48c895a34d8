//! Platform collaborators
//!
//! The location and notification services are owned by the operating
//! system. The core talks to them only through these traits, injected at
//! construction time. Calls are fire-and-forget: they must return promptly
//! and never block on the platform.

pub mod simulated;

pub use simulated::{SimulatedLocationService, SimulatedNotificationService};

use crate::database::Coordinate;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Location authorization as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationState {
    NotDetermined,
    Restricted,
    Denied,
    WhenInUse,
    Always,
}

impl AuthorizationState {
    /// Region monitoring only works with background ("always") access
    pub fn allows_region_monitoring(self) -> bool {
        self == AuthorizationState::Always
    }

    pub fn is_refused(self) -> bool {
        matches!(
            self,
            AuthorizationState::Denied | AuthorizationState::Restricted
        )
    }
}

/// A circular geofence as handed to the location service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircularRegion {
    pub identifier: String,
    pub center: Coordinate,
    pub radius_meters: f64,
    pub notify_on_entry: bool,
    pub notify_on_exit: bool,
}

/// Platform location service
pub trait LocationService: Send + Sync {
    /// Global location switch of the device
    fn location_services_enabled(&self) -> bool;

    fn authorization_state(&self) -> AuthorizationState;

    /// Ask the user for "always" access. The answer arrives later as an
    /// authorization change.
    fn request_authorization(&self);

    /// Whether circular region monitoring can run right now (hardware
    /// support, background refresh not restricted)
    fn is_monitoring_available(&self) -> bool;

    /// Largest radius the service honors. Varies by device and OS version.
    fn max_monitorable_radius(&self) -> f64;

    fn start_monitoring(&self, region: &CircularRegion);

    fn stop_monitoring(&self, identifier: &str);
}

/// A button attached to a notification category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub identifier: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationCategory {
    pub identifier: String,
    pub actions: Vec<NotificationAction>,
}

/// An immediate local notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationRequest {
    /// Reminder identifier, echoed back with action responses
    pub identifier: String,
    pub title: String,
    pub category: String,
    pub sound: Option<String>,
    pub badge: i64,
}

/// Platform notification service
pub trait NotificationService: Send + Sync {
    fn register_categories(&self, categories: &[NotificationCategory]);

    /// Returns whether alerts, badges and sounds were granted
    fn request_permission(&self) -> Result<bool>;

    fn schedule(&self, request: &NotificationRequest) -> Result<()>;

    /// App icon badge
    fn set_badge(&self, count: i64);
}
