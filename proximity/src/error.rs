//! Error types for Proximity Reminders
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized for whatever surface sits on top of the core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The user declined location or notification access
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Location services are off or region monitoring is restricted
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A region event referenced an identifier with no stored reminder
    #[error("No reminder matches region identifier: {0}")]
    LookupMiss(String),

    #[error("Reminder not found: {0}")]
    ReminderNotFound(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Errors the user resolves by visiting the system settings.
    pub fn needs_settings_redirect(&self) -> bool {
        matches!(
            self,
            AppError::PermissionDenied(_) | AppError::ServiceUnavailable(_)
        )
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
