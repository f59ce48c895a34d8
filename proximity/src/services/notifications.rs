//! Notification dispatcher
//!
//! Builds reminder notifications and maps notification actions back to
//! reminder operations.

use crate::config;
use crate::database::Reminder;
use crate::error::{AppError, Result};
use crate::platform::{
    NotificationAction, NotificationCategory, NotificationRequest, NotificationService,
};
use crate::services::settings::NotificationSettings;
use std::sync::Arc;

/// What the user asked for from a delivered notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderAction {
    Complete,
}

impl ReminderAction {
    pub fn from_action_id(action_id: &str) -> Option<Self> {
        match action_id {
            config::COMPLETE_ACTION_ID => Some(ReminderAction::Complete),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    service: Arc<dyn NotificationService>,
    settings: NotificationSettings,
}

impl NotificationDispatcher {
    pub fn new(service: Arc<dyn NotificationService>, settings: NotificationSettings) -> Self {
        Self { service, settings }
    }

    /// The reminder category with its "Completed" action
    pub fn reminder_category() -> NotificationCategory {
        NotificationCategory {
            identifier: config::REMINDER_CATEGORY.to_string(),
            actions: vec![NotificationAction {
                identifier: config::COMPLETE_ACTION_ID.to_string(),
                title: config::COMPLETE_ACTION_TITLE.to_string(),
            }],
        }
    }

    /// Register categories and ask for permission.
    ///
    /// A refusal comes back as `PermissionDenied` carrying the text of the
    /// settings prompt.
    pub fn configure(&self) -> Result<()> {
        self.service
            .register_categories(&[Self::reminder_category()]);

        if !self.service.request_permission()? {
            tracing::warn!("Notification permission refused");
            return Err(AppError::PermissionDenied(format!(
                "{}: {}",
                config::NOTIFICATION_SETTINGS_ALERT_TITLE,
                config::NOTIFICATION_SETTINGS_ALERT_TEXT
            )));
        }

        Ok(())
    }

    /// Title shown for a reminder. Never written back to the reminder.
    pub fn title_for(&self, description: &str) -> String {
        if description.trim().is_empty() {
            self.settings.fallback_title.clone()
        } else {
            description.to_string()
        }
    }

    /// Schedule an immediate notification for `reminder`
    pub fn notify(&self, reminder: &Reminder, badge: i64) -> Result<NotificationRequest> {
        let request = NotificationRequest {
            identifier: reminder.id.clone(),
            title: self.title_for(&reminder.description),
            category: config::REMINDER_CATEGORY.to_string(),
            sound: self.settings.sound_name.clone(),
            badge,
        };

        self.service.schedule(&request)?;

        tracing::info!("Notification scheduled for reminder {}", reminder.id);
        Ok(request)
    }

    pub fn set_badge(&self, count: i64) {
        self.service.set_badge(count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::SimulatedNotificationService;
    use chrono::Utc;

    fn create_test_dispatcher() -> (NotificationDispatcher, Arc<SimulatedNotificationService>) {
        let service = Arc::new(SimulatedNotificationService::new());
        let dispatcher = NotificationDispatcher::new(service.clone(), NotificationSettings::default());
        (dispatcher, service)
    }

    fn reminder(description: &str) -> Reminder {
        Reminder {
            id: "r1".to_string(),
            description: description.to_string(),
            latitude: Some(40.0),
            longitude: Some(-75.0),
            address: None,
            entrance: true,
            is_completed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_action_mapping() {
        assert_eq!(
            ReminderAction::from_action_id("Completed"),
            Some(ReminderAction::Complete)
        );
        assert_eq!(ReminderAction::from_action_id("com.apple.dismiss"), None);
    }

    #[test]
    fn test_configure_registers_completion_action() {
        let (dispatcher, service) = create_test_dispatcher();

        dispatcher.configure().unwrap();

        let categories = service.categories();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].identifier, "Reminder");
        assert_eq!(categories[0].actions[0].identifier, "Completed");
    }

    #[test]
    fn test_configure_surfaces_refusal() {
        let (dispatcher, service) = create_test_dispatcher();
        service.set_permission_granted(false);

        let err = dispatcher.configure().unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
        assert!(err.needs_settings_redirect());
    }

    #[test]
    fn test_notification_content() {
        let (dispatcher, service) = create_test_dispatcher();

        let request = dispatcher.notify(&reminder("Buy milk"), 3).unwrap();

        assert_eq!(request.identifier, "r1");
        assert_eq!(request.title, "Buy milk");
        assert_eq!(request.category, "Reminder");
        assert_eq!(request.sound.as_deref(), Some("reminder.caf"));
        assert_eq!(request.badge, 3);
        assert_eq!(service.scheduled(), vec![request]);
    }

    #[test]
    fn test_placeholder_for_empty_description() {
        let (dispatcher, _service) = create_test_dispatcher();

        let request = dispatcher.notify(&reminder("   "), 1).unwrap();
        assert_eq!(request.title, "No title");
    }
}
