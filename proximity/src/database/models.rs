//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A location-triggered reminder
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reminder {
    pub id: String,
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Human-readable address, filled in after reverse geocoding
    pub address: Option<String>,
    /// true = notify on arrival, false = notify on departure
    pub entrance: bool,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    /// Both coordinates, or nothing.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    /// Whether this reminder should currently hold a region watch
    pub fn is_eligible_for_watch(&self) -> bool {
        !self.is_completed && self.coordinate().is_some()
    }
}

/// A geographical location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// When the notification for a reminder should fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Perimeter {
    #[default]
    Arrive,
    Leave,
}

impl Perimeter {
    /// Stored as the `entrance` column
    pub fn is_entrance(self) -> bool {
        self == Perimeter::Arrive
    }
}

/// Create reminder request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateReminderRequest {
    pub description: String,
    pub location: Option<Coordinate>,
    #[serde(default)]
    pub perimeter: Perimeter,
}

/// Update reminder request
///
/// `location` replaces the stored coordinates as a whole; `Some(None)`
/// clears them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReminderRequest {
    pub id: String,
    pub description: Option<String>,
    pub location: Option<Option<Coordinate>>,
    pub perimeter: Option<Perimeter>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reminder(latitude: Option<f64>, longitude: Option<f64>, is_completed: bool) -> Reminder {
        Reminder {
            id: "r1".to_string(),
            description: "Buy milk".to_string(),
            latitude,
            longitude,
            address: None,
            entrance: true,
            is_completed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_coordinate_requires_both_axes() {
        assert!(reminder(Some(40.0), None, false).coordinate().is_none());
        assert!(reminder(None, Some(-75.0), false).coordinate().is_none());
        assert_eq!(
            reminder(Some(40.0), Some(-75.0), false).coordinate(),
            Some(Coordinate::new(40.0, -75.0))
        );
    }

    #[test]
    fn test_watch_eligibility() {
        assert!(reminder(Some(40.0), Some(-75.0), false).is_eligible_for_watch());
        assert!(!reminder(Some(40.0), Some(-75.0), true).is_eligible_for_watch());
        assert!(!reminder(None, None, false).is_eligible_for_watch());
    }

    #[test]
    fn test_perimeter_entrance_mapping() {
        assert!(Perimeter::Arrive.is_entrance());
        assert!(!Perimeter::Leave.is_entrance());
    }
}
