//! Reminders service
//!
//! Reconciles stored reminders with the geofence monitor and the
//! notification channel, and owns the outstanding-reminder counter shown on
//! the app badge.
//!
//! Every mutation of a reminder runs under that reminder's own async lock,
//! so a completion from the list and a region event arriving at the same
//! moment are applied one after the other. Persistence comes first: when a
//! write fails, neither the watches nor the counter change.

use crate::database::{
    Coordinate, CreateReminderRequest, Perimeter, Reminder, Repository, UpdateReminderRequest,
};
use crate::error::{AppError, Result};
use crate::platform::{AuthorizationState, NotificationRequest};
use crate::services::geofence::{GeofenceMonitor, RegionEvent, WatchOutcome};
use crate::services::notifications::{NotificationDispatcher, ReminderAction};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// Held while a reminder is being mutated.
///
/// On release the map entry is dropped unless another task is already
/// waiting on it, so the map only holds identifiers in use.
struct ReminderLock {
    id: String,
    locks: Arc<LockMap>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ReminderLock {
    fn drop(&mut self) {
        self.guard.take();
        // Waiters hold their own clone; the map's is the last one otherwise
        self.locks.remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[derive(Clone)]
pub struct RemindersService {
    repo: Repository,
    monitor: GeofenceMonitor,
    notifications: NotificationDispatcher,
    radius_meters: f64,
    outstanding: Arc<AtomicI64>,
    locks: Arc<LockMap>,
}

impl RemindersService {
    pub fn new(
        repo: Repository,
        monitor: GeofenceMonitor,
        notifications: NotificationDispatcher,
        radius_meters: f64,
    ) -> Self {
        Self {
            repo,
            monitor,
            notifications,
            radius_meters,
            outstanding: Arc::new(AtomicI64::new(0)),
            locks: Arc::new(DashMap::new()),
        }
    }

    async fn lock_reminder(&self, id: &str) -> ReminderLock {
        let lock = self
            .locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        ReminderLock {
            id: id.to_string(),
            locks: self.locks.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Load the counter from storage and register every eligible watch
    pub async fn initialize(&self) -> Result<()> {
        self.refresh_badge().await?;
        let watching = self.restore_watches().await?;
        tracing::info!(
            "Reminders ready: {} outstanding, {} watched",
            self.outstanding_count(),
            watching
        );
        Ok(())
    }

    /// Reset the counter to the stored number of incomplete reminders
    pub async fn refresh_badge(&self) -> Result<i64> {
        let count = self.repo.count_incomplete_reminders().await?;
        self.outstanding.store(count, Ordering::SeqCst);
        self.notifications.set_badge(count);
        Ok(count)
    }

    pub fn outstanding_count(&self) -> i64 {
        self.outstanding.load(Ordering::SeqCst)
    }

    fn increment_outstanding(&self) {
        let count = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        self.notifications.set_badge(count);
    }

    fn decrement_outstanding(&self) {
        let count = self.outstanding.fetch_sub(1, Ordering::SeqCst) - 1;
        self.notifications.set_badge(count);
    }

    pub async fn get_reminder(&self, id: &str) -> Result<Reminder> {
        self.repo.get_reminder(id).await
    }

    /// All reminders, outstanding ones first
    pub async fn list_reminders(&self) -> Result<Vec<Reminder>> {
        self.repo.list_reminders().await
    }

    /// Create a reminder and start watching it when it has a location
    pub async fn create_reminder(
        &self,
        description: String,
        location: Option<Coordinate>,
        perimeter: Perimeter,
    ) -> Result<Reminder> {
        tracing::info!("Creating reminder: {}", description);

        let reminder = self
            .repo
            .create_reminder(CreateReminderRequest {
                description,
                location,
                perimeter,
            })
            .await?;

        let _guard = self.lock_reminder(&reminder.id).await;
        self.increment_outstanding();
        self.on_reminder_saved(&reminder);

        Ok(reminder)
    }

    /// Edit description, location or perimeter, then re-sync the watch
    pub async fn update_reminder(&self, req: UpdateReminderRequest) -> Result<Reminder> {
        let _guard = self.lock_reminder(&req.id).await;

        let reminder = self.repo.update_reminder(req).await?;
        self.on_reminder_saved(&reminder);

        Ok(reminder)
    }

    /// Bring the watch for a just-saved reminder in line with its state.
    ///
    /// Incomplete reminders with coordinates are watched; anything else has
    /// its watch stopped. Returns `None` when no watch was requested.
    pub fn on_reminder_saved(&self, reminder: &Reminder) -> Option<WatchOutcome> {
        if !reminder.is_eligible_for_watch() {
            self.monitor.stop_watching(&reminder.id);
            return None;
        }

        let center = reminder.coordinate()?;
        Some(self.monitor.start_watching(
            &reminder.id,
            center,
            self.radius_meters,
            reminder.entrance,
        ))
    }

    /// A watched region was crossed.
    ///
    /// Schedules one notification for the matching reminder. The watch
    /// stays in place until the reminder is completed. Events for completed
    /// reminders are stale and return `Ok(None)`.
    pub async fn on_region_triggered(&self, identifier: &str) -> Result<Option<NotificationRequest>> {
        let _guard = self.lock_reminder(identifier).await;

        let reminder = self
            .repo
            .find_reminder(identifier)
            .await?
            .ok_or_else(|| AppError::LookupMiss(identifier.to_string()))?;

        if reminder.is_completed {
            tracing::debug!("Ignoring region event for completed reminder {}", identifier);
            return Ok(None);
        }

        let request = self
            .notifications
            .notify(&reminder, self.outstanding_count())?;

        Ok(Some(request))
    }

    /// Complete a reminder and stop watching it
    pub async fn on_mark_completed(&self, identifier: &str) -> Result<Reminder> {
        self.set_completion(identifier, true).await
    }

    /// Manual toggle from the list. `false` re-activates the reminder.
    pub async fn on_toggle_completion(&self, identifier: &str, new_value: bool) -> Result<Reminder> {
        self.set_completion(identifier, new_value).await
    }

    async fn set_completion(&self, identifier: &str, completed: bool) -> Result<Reminder> {
        let _guard = self.lock_reminder(identifier).await;

        let current = self.repo.get_reminder(identifier).await?;
        let was_completed = current.is_completed;

        if was_completed == completed {
            // Counter already reflects this state; only re-assert the watch
            self.on_reminder_saved(&current);
            return Ok(current);
        }

        let reminder = self.repo.set_completed(identifier, completed).await?;

        if completed {
            self.monitor.stop_watching(identifier);
            self.decrement_outstanding();
            tracing::info!("Reminder {} completed", identifier);
        } else {
            self.increment_outstanding();
            self.on_reminder_saved(&reminder);
            tracing::info!("Reminder {} reactivated", identifier);
        }

        Ok(reminder)
    }

    /// Delete a reminder, stopping its watch
    pub async fn delete_reminder(&self, identifier: &str) -> Result<()> {
        let _guard = self.lock_reminder(identifier).await;

        let reminder = self.repo.get_reminder(identifier).await?;
        self.repo.delete_reminder(identifier).await?;

        self.monitor.stop_watching(identifier);
        if !reminder.is_completed {
            self.decrement_outstanding();
        }

        tracing::info!("Reminder {} deleted", identifier);
        Ok(())
    }

    /// Store the reverse-geocoded address. Monitoring is unaffected.
    pub async fn record_address(&self, identifier: &str, address: Option<String>) -> Result<Reminder> {
        let _guard = self.lock_reminder(identifier).await;
        self.repo.set_address(identifier, address.as_deref()).await
    }

    /// Register a watch for every incomplete reminder with a location.
    /// Returns the number of reminders now watched.
    pub async fn restore_watches(&self) -> Result<usize> {
        let mut watching = 0;

        for candidate in self.repo.list_incomplete_reminders().await? {
            let _guard = self.lock_reminder(&candidate.id).await;

            // Re-read under the lock; the list may be stale by now
            let Some(reminder) = self.repo.find_reminder(&candidate.id).await? else {
                continue;
            };

            if self
                .on_reminder_saved(&reminder)
                .is_some_and(|outcome| outcome.is_active())
            {
                watching += 1;
            }
        }

        Ok(watching)
    }

    /// Ask for location access.
    ///
    /// Disabled location services and a refused authorization are reported
    /// as errors; an undecided state triggers the platform prompt.
    pub fn request_location_authorization(&self) -> Result<AuthorizationState> {
        let location = self.monitor.location();

        if !location.location_services_enabled() {
            return Err(AppError::ServiceUnavailable(
                crate::config::LOCATION_UNAVAILABLE_ALERT_TEXT.to_string(),
            ));
        }

        let state = location.authorization_state();
        if state.is_refused() {
            return Err(AppError::PermissionDenied(
                crate::config::LOCATION_DENIED_ALERT_TEXT.to_string(),
            ));
        }

        if state == AuthorizationState::NotDetermined {
            location.request_authorization();
        }

        Ok(location.authorization_state())
    }

    /// Authorization changed on the platform side. Once "always" access is
    /// granted, every eligible reminder gets its watch.
    pub async fn on_authorization_changed(&self, state: AuthorizationState) -> Result<usize> {
        if !state.allows_region_monitoring() {
            tracing::info!("Location authorization now {:?}; watches not restored", state);
            return Ok(0);
        }

        let watching = self.restore_watches().await?;
        tracing::info!("Location authorization granted; {} reminders watched", watching);
        Ok(watching)
    }

    /// Response to a delivered notification
    pub async fn handle_notification_action(
        &self,
        action_id: &str,
        identifier: &str,
    ) -> Result<Option<Reminder>> {
        match ReminderAction::from_action_id(action_id) {
            Some(ReminderAction::Complete) => {
                let reminder = self.on_mark_completed(identifier).await?;
                Ok(Some(reminder))
            }
            None => {
                tracing::debug!("Ignoring notification action {}", action_id);
                Ok(None)
            }
        }
    }

    async fn handle_region_event(&self, event: RegionEvent) {
        tracing::debug!("Region {:?} for {}", event.kind, event.identifier);

        match self.on_region_triggered(&event.identifier).await {
            Ok(_) => {}
            Err(AppError::LookupMiss(id)) => {
                tracing::warn!("Dropping region event for unknown reminder {}", id);
            }
            Err(e) => {
                tracing::error!("Error handling region event for {}: {}", event.identifier, e);
            }
        }
    }

    /// Process region events in a background task.
    ///
    /// The service keeps a monitor handle, so the channel never closes on
    /// its own; abort the returned handle to stop the loop.
    pub fn start_event_loop(self, mut events: mpsc::UnboundedReceiver<RegionEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("Starting region event loop");

            while let Some(event) = events.recv().await {
                self.handle_region_event(event).await;
            }

            tracing::info!("Region event loop stopped");
        })
    }
}
