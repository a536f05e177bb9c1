//! Domain layer for the Family Locator backend.
//!
//! This crate contains:
//! - Domain models (Device, LocationSample, Zone, TrackingEvent, TrackingSettings)
//! - Collaborator traits (notification dispatch, billing gate)
//! - Request/response payloads for the tracking API

pub mod models;
pub mod services;
