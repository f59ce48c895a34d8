//! In-memory platform services
//!
//! Stand-ins for the OS location and notification services. They record
//! every call and let the caller script authorization, capability and
//! failures. Used by the test suites and by the demo binary.

use super::{
    AuthorizationState, CircularRegion, LocationService, NotificationCategory,
    NotificationRequest, NotificationService,
};
use crate::error::{AppError, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct LocationState {
    services_enabled: bool,
    authorization: AuthorizationState,
    /// What a pending authorization request resolves to
    grant_on_request: AuthorizationState,
    monitoring_available: bool,
    max_radius: f64,
    regions: HashMap<String, CircularRegion>,
    start_calls: usize,
    stop_calls: usize,
}

/// Location service backed by a map of monitored regions
#[derive(Debug)]
pub struct SimulatedLocationService {
    state: Mutex<LocationState>,
}

impl SimulatedLocationService {
    /// Fully authorized service with the given maximum radius
    pub fn new(max_radius: f64) -> Self {
        Self {
            state: Mutex::new(LocationState {
                services_enabled: true,
                authorization: AuthorizationState::Always,
                grant_on_request: AuthorizationState::Always,
                monitoring_available: true,
                max_radius,
                regions: HashMap::new(),
                start_calls: 0,
                stop_calls: 0,
            }),
        }
    }

    pub fn set_authorization(&self, authorization: AuthorizationState) {
        lock(&self.state).authorization = authorization;
    }

    pub fn set_grant_on_request(&self, authorization: AuthorizationState) {
        lock(&self.state).grant_on_request = authorization;
    }

    pub fn set_services_enabled(&self, enabled: bool) {
        lock(&self.state).services_enabled = enabled;
    }

    pub fn set_monitoring_available(&self, available: bool) {
        lock(&self.state).monitoring_available = available;
    }

    pub fn set_max_radius(&self, max_radius: f64) {
        lock(&self.state).max_radius = max_radius;
    }

    pub fn monitored_region(&self, identifier: &str) -> Option<CircularRegion> {
        lock(&self.state).regions.get(identifier).cloned()
    }

    pub fn monitored_count(&self) -> usize {
        lock(&self.state).regions.len()
    }

    pub fn start_calls(&self) -> usize {
        lock(&self.state).start_calls
    }

    pub fn stop_calls(&self) -> usize {
        lock(&self.state).stop_calls
    }
}

impl Default for SimulatedLocationService {
    fn default() -> Self {
        Self::new(crate::config::MAX_MONITORING_RADIUS_METERS)
    }
}

impl LocationService for SimulatedLocationService {
    fn location_services_enabled(&self) -> bool {
        lock(&self.state).services_enabled
    }

    fn authorization_state(&self) -> AuthorizationState {
        lock(&self.state).authorization
    }

    fn request_authorization(&self) {
        let mut state = lock(&self.state);
        if state.authorization == AuthorizationState::NotDetermined {
            state.authorization = state.grant_on_request;
        }
    }

    fn is_monitoring_available(&self) -> bool {
        lock(&self.state).monitoring_available
    }

    fn max_monitorable_radius(&self) -> f64 {
        lock(&self.state).max_radius
    }

    fn start_monitoring(&self, region: &CircularRegion) {
        let mut state = lock(&self.state);
        state.start_calls += 1;
        state
            .regions
            .insert(region.identifier.clone(), region.clone());
    }

    fn stop_monitoring(&self, identifier: &str) {
        let mut state = lock(&self.state);
        state.stop_calls += 1;
        state.regions.remove(identifier);
    }
}

#[derive(Debug, Default)]
struct NotificationState {
    permission_granted: bool,
    fail_scheduling: bool,
    categories: Vec<NotificationCategory>,
    scheduled: Vec<NotificationRequest>,
    badge: i64,
}

/// Notification service that keeps every scheduled request
#[derive(Debug)]
pub struct SimulatedNotificationService {
    state: Mutex<NotificationState>,
}

impl SimulatedNotificationService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(NotificationState {
                permission_granted: true,
                ..NotificationState::default()
            }),
        }
    }

    pub fn set_permission_granted(&self, granted: bool) {
        lock(&self.state).permission_granted = granted;
    }

    /// Make every subsequent `schedule` call fail
    pub fn set_fail_scheduling(&self, fail: bool) {
        lock(&self.state).fail_scheduling = fail;
    }

    pub fn scheduled(&self) -> Vec<NotificationRequest> {
        lock(&self.state).scheduled.clone()
    }

    pub fn categories(&self) -> Vec<NotificationCategory> {
        lock(&self.state).categories.clone()
    }

    pub fn badge(&self) -> i64 {
        lock(&self.state).badge
    }
}

impl Default for SimulatedNotificationService {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationService for SimulatedNotificationService {
    fn register_categories(&self, categories: &[NotificationCategory]) {
        lock(&self.state).categories = categories.to_vec();
    }

    fn request_permission(&self) -> Result<bool> {
        Ok(lock(&self.state).permission_granted)
    }

    fn schedule(&self, request: &NotificationRequest) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_scheduling {
            return Err(AppError::Notification(format!(
                "Delivery refused for {}",
                request.identifier
            )));
        }

        tracing::info!("Notification: {} ({})", request.title, request.identifier);
        state.scheduled.push(request.clone());
        Ok(())
    }

    fn set_badge(&self, count: i64) {
        lock(&self.state).badge = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Coordinate;

    fn region(identifier: &str) -> CircularRegion {
        CircularRegion {
            identifier: identifier.to_string(),
            center: Coordinate::new(40.0, -75.0),
            radius_meters: 50.0,
            notify_on_entry: true,
            notify_on_exit: false,
        }
    }

    #[test]
    fn test_authorization_request_resolves_once() {
        let service = SimulatedLocationService::new(100.0);
        service.set_authorization(AuthorizationState::NotDetermined);
        service.set_grant_on_request(AuthorizationState::WhenInUse);

        service.request_authorization();
        assert_eq!(service.authorization_state(), AuthorizationState::WhenInUse);

        // Already decided; asking again changes nothing
        service.set_grant_on_request(AuthorizationState::Always);
        service.request_authorization();
        assert_eq!(service.authorization_state(), AuthorizationState::WhenInUse);
    }

    #[test]
    fn test_monitoring_replaces_by_identifier() {
        let service = SimulatedLocationService::new(100.0);

        service.start_monitoring(&region("a"));
        service.start_monitoring(&region("a"));
        assert_eq!(service.monitored_count(), 1);
        assert_eq!(service.start_calls(), 2);

        service.stop_monitoring("a");
        assert_eq!(service.monitored_count(), 0);
    }

    #[test]
    fn test_scheduling_failure_is_reported() {
        let service = SimulatedNotificationService::new();
        service.set_fail_scheduling(true);

        let request = NotificationRequest {
            identifier: "a".to_string(),
            title: "Buy milk".to_string(),
            category: "Reminder".to_string(),
            sound: None,
            badge: 1,
        };

        assert!(service.schedule(&request).is_err());
        assert!(service.scheduled().is_empty());
    }
}
