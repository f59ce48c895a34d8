//! Repository layer for database operations
//!
//! Reads and writes of the `reminders` table. Identifiers are UUID v4,
//! assigned here on insert and never recomputed.

use super::models::*;
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new, not yet completed reminder
    pub async fn create_reminder(&self, req: CreateReminderRequest) -> Result<Reminder> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let reminder = sqlx::query_as::<_, Reminder>(
            r#"
            INSERT INTO reminders
                (id, description, latitude, longitude, address, entrance, is_completed, created_at, updated_at)
            VALUES (?, ?, ?, ?, NULL, ?, 0, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.description)
        .bind(req.location.map(|c| c.latitude))
        .bind(req.location.map(|c| c.longitude))
        .bind(req.perimeter.is_entrance())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created reminder: {}", id);
        Ok(reminder)
    }

    /// Get a reminder by ID
    pub async fn get_reminder(&self, id: &str) -> Result<Reminder> {
        self.find_reminder(id)
            .await?
            .ok_or_else(|| AppError::ReminderNotFound(id.to_string()))
    }

    /// Exact-match lookup; `None` when no row has this identifier
    pub async fn find_reminder(&self, id: &str) -> Result<Option<Reminder>> {
        let reminder = sqlx::query_as::<_, Reminder>("SELECT * FROM reminders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(reminder)
    }

    /// All reminders, outstanding ones first
    pub async fn list_reminders(&self) -> Result<Vec<Reminder>> {
        let reminders = sqlx::query_as::<_, Reminder>(
            r#"
            SELECT * FROM reminders
            ORDER BY is_completed ASC, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(reminders)
    }

    pub async fn list_incomplete_reminders(&self) -> Result<Vec<Reminder>> {
        let reminders = sqlx::query_as::<_, Reminder>(
            r#"
            SELECT * FROM reminders
            WHERE is_completed = 0
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(reminders)
    }

    pub async fn count_incomplete_reminders(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reminders WHERE is_completed = 0")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Apply an edit to description, location or perimeter
    pub async fn update_reminder(&self, req: UpdateReminderRequest) -> Result<Reminder> {
        let mut reminder = self.get_reminder(&req.id).await?;

        if let Some(description) = req.description {
            reminder.description = description;
        }

        if let Some(location) = req.location {
            reminder.latitude = location.map(|c| c.latitude);
            reminder.longitude = location.map(|c| c.longitude);
            // The old address no longer describes the new location
            reminder.address = None;
        }

        if let Some(perimeter) = req.perimeter {
            reminder.entrance = perimeter.is_entrance();
        }

        let updated = sqlx::query_as::<_, Reminder>(
            r#"
            UPDATE reminders
            SET description = ?, latitude = ?, longitude = ?, address = ?, entrance = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&reminder.description)
        .bind(reminder.latitude)
        .bind(reminder.longitude)
        .bind(&reminder.address)
        .bind(reminder.entrance)
        .bind(Utc::now())
        .bind(&req.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::ReminderNotFound(req.id.clone()))?;

        tracing::debug!("Updated reminder: {}", updated.id);
        Ok(updated)
    }

    /// Set the completion flag
    pub async fn set_completed(&self, id: &str, is_completed: bool) -> Result<Reminder> {
        let reminder = sqlx::query_as::<_, Reminder>(
            r#"
            UPDATE reminders SET is_completed = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(is_completed)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::ReminderNotFound(id.to_string()))?;

        tracing::debug!("Reminder {} completed = {}", id, is_completed);
        Ok(reminder)
    }

    /// Store the reverse-geocoded address
    pub async fn set_address(&self, id: &str, address: Option<&str>) -> Result<Reminder> {
        let reminder = sqlx::query_as::<_, Reminder>(
            r#"
            UPDATE reminders SET address = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(address)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::ReminderNotFound(id.to_string()))?;

        Ok(reminder)
    }

    /// Permanently delete a reminder
    pub async fn delete_reminder(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM reminders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::ReminderNotFound(id.to_string()));
        }

        tracing::debug!("Deleted reminder: {}", id);
        Ok(())
    }

    /// Close the underlying pool. Later calls fail with a database error.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
