//! Geofence monitor
//!
//! Owns the mapping from reminder identifier to active circular region
//! watch and relays region crossings to the reminder service.
//!
//! Registration is fire-and-forget: without "always" authorization or
//! with region monitoring unavailable, `start_watching` does nothing and
//! reports why. Crossing events are pushed onto an unbounded channel so the
//! platform callback never waits on the database.

use crate::database::Coordinate;
use crate::platform::{AuthorizationState, CircularRegion, LocationService};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Direction of a region crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionEventKind {
    Entered,
    Exited,
}

/// A crossing reported by the location service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionEvent {
    pub identifier: String,
    pub kind: RegionEventKind,
}

/// An active watch as recorded by the monitor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionWatch {
    pub identifier: String,
    pub center: Coordinate,
    /// Radius after clamping to the platform maximum
    pub radius_meters: f64,
    pub requested_radius_meters: f64,
    pub notify_on_entry: bool,
}

impl RegionWatch {
    fn region(&self) -> CircularRegion {
        CircularRegion {
            identifier: self.identifier.clone(),
            center: self.center,
            radius_meters: self.radius_meters,
            notify_on_entry: self.notify_on_entry,
            notify_on_exit: !self.notify_on_entry,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    NotAuthorized(AuthorizationState),
    MonitoringUnavailable,
    InvalidRadius(f64),
}

/// Result of a `start_watching` call
#[derive(Debug, Clone, PartialEq)]
pub enum WatchOutcome {
    Registered(RegionWatch),
    /// Handed to the platform, but more regions are active than it is
    /// known to honor. The platform may silently drop it.
    OverCapacity(RegionWatch),
    Skipped(SkipReason),
}

impl WatchOutcome {
    pub fn watch(&self) -> Option<&RegionWatch> {
        match self {
            WatchOutcome::Registered(watch) | WatchOutcome::OverCapacity(watch) => Some(watch),
            WatchOutcome::Skipped(_) => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.watch().is_some()
    }
}

/// Geofence monitor over an injected location service
#[derive(Clone)]
pub struct GeofenceMonitor {
    location: Arc<dyn LocationService>,
    watches: Arc<DashMap<String, RegionWatch>>,
    capacity: usize,
    events: mpsc::UnboundedSender<RegionEvent>,
}

impl GeofenceMonitor {
    /// Create a monitor and the receiving end of its region event stream
    pub fn new(
        location: Arc<dyn LocationService>,
        capacity: usize,
    ) -> (Self, mpsc::UnboundedReceiver<RegionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();

        let monitor = Self {
            location,
            watches: Arc::new(DashMap::new()),
            capacity,
            events,
        };

        (monitor, receiver)
    }

    pub fn location(&self) -> &Arc<dyn LocationService> {
        &self.location
    }

    /// Start (or replace) the watch for `identifier`.
    ///
    /// The replace is not atomic: callers must serialize calls for the same
    /// identifier. `RemindersService` does so with its per-reminder lock.
    pub fn start_watching(
        &self,
        identifier: &str,
        center: Coordinate,
        radius_meters: f64,
        notify_on_entry: bool,
    ) -> WatchOutcome {
        let authorization = self.location.authorization_state();
        if !authorization.allows_region_monitoring() {
            tracing::warn!(
                "Not watching {}: location authorization is {:?}",
                identifier,
                authorization
            );
            return WatchOutcome::Skipped(SkipReason::NotAuthorized(authorization));
        }

        if !self.location.is_monitoring_available() {
            tracing::warn!("Not watching {}: region monitoring unavailable", identifier);
            return WatchOutcome::Skipped(SkipReason::MonitoringUnavailable);
        }

        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            tracing::warn!("Not watching {}: invalid radius {}", identifier, radius_meters);
            return WatchOutcome::Skipped(SkipReason::InvalidRadius(radius_meters));
        }

        let max_radius = self.location.max_monitorable_radius();
        let effective_radius = radius_meters.min(max_radius);
        if effective_radius < radius_meters {
            tracing::debug!(
                "Clamped radius for {} from {}m to {}m",
                identifier,
                radius_meters,
                effective_radius
            );
        }

        let watch = RegionWatch {
            identifier: identifier.to_string(),
            center,
            radius_meters: effective_radius,
            requested_radius_meters: radius_meters,
            notify_on_entry,
        };

        let replaced = self.watches.remove(identifier).is_some();
        if replaced {
            self.location.stop_monitoring(identifier);
        }

        let over_capacity = self.watches.len() >= self.capacity;

        self.location.start_monitoring(&watch.region());
        self.watches.insert(identifier.to_string(), watch.clone());

        if over_capacity {
            tracing::warn!(
                "Watching {} exceeds the platform capacity of {} regions; it may never fire",
                identifier,
                self.capacity
            );
            return WatchOutcome::OverCapacity(watch);
        }

        tracing::info!(
            "Watching {} ({}m, notify on {})",
            identifier,
            effective_radius,
            if notify_on_entry { "entry" } else { "exit" }
        );
        WatchOutcome::Registered(watch)
    }

    /// Stop the watch for `identifier`. Returns whether one was active.
    pub fn stop_watching(&self, identifier: &str) -> bool {
        match self.watches.remove(identifier) {
            Some(_) => {
                self.location.stop_monitoring(identifier);
                tracing::info!("Stopped watching {}", identifier);
                true
            }
            None => false,
        }
    }

    pub fn watch(&self, identifier: &str) -> Option<RegionWatch> {
        self.watches.get(identifier).map(|entry| entry.value().clone())
    }

    pub fn is_watching(&self, identifier: &str) -> bool {
        self.watches.contains_key(identifier)
    }

    pub fn active_count(&self) -> usize {
        self.watches.len()
    }

    pub fn active_watches(&self) -> Vec<RegionWatch> {
        self.watches
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Platform callback: the device entered a watched region
    pub fn region_entered(&self, identifier: &str) {
        self.forward(identifier, RegionEventKind::Entered);
    }

    /// Platform callback: the device left a watched region
    pub fn region_exited(&self, identifier: &str) {
        self.forward(identifier, RegionEventKind::Exited);
    }

    fn forward(&self, identifier: &str, kind: RegionEventKind) {
        let event = RegionEvent {
            identifier: identifier.to_string(),
            kind,
        };

        if let Err(e) = self.events.send(event) {
            tracing::warn!("Failed to queue region event: {}", e);
        }
    }
}
