//! Proximity Reminders library
//!
//! Location-triggered reminders: the geofence lifecycle of each reminder
//! and its reconciliation with storage and notifications. Platform
//! services are injected through the traits in [`platform`].

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod platform;
pub mod services;
