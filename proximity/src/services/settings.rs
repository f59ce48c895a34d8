//! Settings service
//!
//! Manages application settings persistence using JSON file storage.

use crate::config;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Region monitoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringSettings {
    /// Radius requested for every reminder watch, in meters
    #[serde(default = "default_radius_meters")]
    pub radius_meters: f64,
    /// Concurrent region watches before the monitor reports over-capacity
    #[serde(default = "default_max_regions")]
    pub max_regions: usize,
}

fn default_radius_meters() -> f64 {
    config::DEFAULT_MONITORING_RADIUS_METERS
}

fn default_max_regions() -> usize {
    config::DEFAULT_MAX_MONITORED_REGIONS
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            radius_meters: default_radius_meters(),
            max_regions: default_max_regions(),
        }
    }
}

impl MonitoringSettings {
    pub fn validate(&self) -> Result<()> {
        if !(config::MIN_MONITORING_RADIUS_METERS..=config::MAX_MONITORING_RADIUS_METERS)
            .contains(&self.radius_meters)
        {
            return Err(AppError::Validation(format!(
                "Monitoring radius must be between {} and {} meters",
                config::MIN_MONITORING_RADIUS_METERS,
                config::MAX_MONITORING_RADIUS_METERS
            )));
        }

        if self.max_regions == 0 || self.max_regions > config::MAX_MONITORED_REGIONS_LIMIT {
            return Err(AppError::Validation(format!(
                "Region capacity must be between 1 and {}",
                config::MAX_MONITORED_REGIONS_LIMIT
            )));
        }

        Ok(())
    }
}

/// Notification content settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Sound file name; `None` delivers silently
    #[serde(default = "default_sound_name")]
    pub sound_name: Option<String>,
    /// Title used when a reminder has no description
    #[serde(default = "default_fallback_title")]
    pub fallback_title: String,
}

fn default_sound_name() -> Option<String> {
    Some(config::DEFAULT_NOTIFICATION_SOUND.to_string())
}

fn default_fallback_title() -> String {
    config::MISSING_DESCRIPTION_PLACEHOLDER.to_string()
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            sound_name: default_sound_name(),
            fallback_title: default_fallback_title(),
        }
    }
}

impl NotificationSettings {
    pub fn validate(&self) -> Result<()> {
        if self.fallback_title.trim().is_empty() {
            return Err(AppError::Validation(
                "Fallback notification title cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub monitoring: MonitoringSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            settings_path: app_data_dir.join(config::SETTINGS_FILE_NAME),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let mut settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        // A hand-edited file must not leave the monitor without usable values
        if let Err(e) = settings.monitoring.validate() {
            tracing::warn!("Ignoring stored monitoring settings: {}", e);
            settings.monitoring = MonitoringSettings::default();
        }
        if let Err(e) = settings.notifications.validate() {
            tracing::warn!("Ignoring stored notification settings: {}", e);
            settings.notifications = NotificationSettings::default();
        }

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)?;

        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    pub async fn get_monitoring(&self) -> Result<MonitoringSettings> {
        Ok(self.load().await?.monitoring)
    }

    /// Validate and store monitoring settings
    pub async fn update_monitoring(&self, monitoring: MonitoringSettings) -> Result<()> {
        monitoring.validate()?;
        let mut settings = self.load().await?;
        settings.monitoring = monitoring;
        self.save(&settings).await
    }

    pub async fn get_notifications(&self) -> Result<NotificationSettings> {
        Ok(self.load().await?.notifications)
    }

    /// Validate and store notification settings
    pub async fn update_notifications(&self, notifications: NotificationSettings) -> Result<()> {
        notifications.validate()?;
        let mut settings = self.load().await?;
        settings.notifications = notifications;
        self.save(&settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (SettingsService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path().to_path_buf());
        (service, temp_dir)
    }

    #[tokio::test]
    async fn test_default_settings_created_on_load() {
        let (service, temp) = create_test_service();

        let settings = service.load().await.unwrap();

        assert_eq!(settings.monitoring.radius_meters, 50.0);
        assert_eq!(settings.monitoring.max_regions, 20);
        assert_eq!(settings.notifications.fallback_title, "No title");
        assert_eq!(
            settings.notifications.sound_name.as_deref(),
            Some("reminder.caf")
        );
        assert!(temp.path().join("settings.json").exists());
    }

    #[tokio::test]
    async fn test_missing_sections_fall_back_to_defaults() {
        let (service, temp) = create_test_service();

        std::fs::write(
            temp.path().join("settings.json"),
            r#"{"monitoring":{"radius_meters":120.0}}"#,
        )
        .unwrap();

        let settings = service.load().await.unwrap();
        assert_eq!(settings.monitoring.radius_meters, 120.0);
        assert_eq!(settings.monitoring.max_regions, 20);
        assert_eq!(settings.notifications, NotificationSettings::default());
    }

    #[tokio::test]
    async fn test_invalid_stored_sections_replaced_by_defaults() {
        let (service, temp) = create_test_service();

        std::fs::write(
            temp.path().join("settings.json"),
            r#"{"monitoring":{"radius_meters":0.0,"max_regions":0},
                "notifications":{"sound_name":null,"fallback_title":"  "}}"#,
        )
        .unwrap();

        let settings = service.load().await.unwrap();
        assert_eq!(settings.monitoring, MonitoringSettings::default());
        assert_eq!(settings.notifications, NotificationSettings::default());
    }

    #[tokio::test]
    async fn test_invalid_monitoring_keeps_valid_notifications() {
        let (service, temp) = create_test_service();

        std::fs::write(
            temp.path().join("settings.json"),
            r#"{"monitoring":{"radius_meters":50000.0,"max_regions":5},
                "notifications":{"sound_name":null,"fallback_title":"Reminder"}}"#,
        )
        .unwrap();

        let settings = service.load().await.unwrap();
        assert_eq!(settings.monitoring.radius_meters, 50.0);
        assert_eq!(settings.monitoring.max_regions, 20);
        assert_eq!(settings.notifications.fallback_title, "Reminder");
        assert!(settings.notifications.sound_name.is_none());
    }

    #[tokio::test]
    async fn test_monitoring_update_persists() {
        let temp_dir = TempDir::new().unwrap();

        {
            let service = SettingsService::new(temp_dir.path().to_path_buf());
            service
                .update_monitoring(MonitoringSettings {
                    radius_meters: 75.0,
                    max_regions: 10,
                })
                .await
                .unwrap();
        }

        let service = SettingsService::new(temp_dir.path().to_path_buf());
        let monitoring = service.get_monitoring().await.unwrap();
        assert_eq!(monitoring.radius_meters, 75.0);
        assert_eq!(monitoring.max_regions, 10);
    }

    #[tokio::test]
    async fn test_out_of_range_radius_rejected() {
        let (service, _temp) = create_test_service();

        let result = service
            .update_monitoring(MonitoringSettings {
                radius_meters: 1.0,
                max_regions: 20,
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(service.get_monitoring().await.unwrap().radius_meters, 50.0);
    }

    #[tokio::test]
    async fn test_notification_settings_preserve_monitoring() {
        let (service, _temp) = create_test_service();

        service
            .update_notifications(NotificationSettings {
                sound_name: None,
                fallback_title: "Reminder".to_string(),
            })
            .await
            .unwrap();

        let settings = service.load().await.unwrap();
        assert!(settings.notifications.sound_name.is_none());
        assert_eq!(settings.monitoring, MonitoringSettings::default());

        assert!(service
            .update_notifications(NotificationSettings {
                sound_name: None,
                fallback_title: "  ".to_string(),
            })
            .await
            .is_err());
    }
}
