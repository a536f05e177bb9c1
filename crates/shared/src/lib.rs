//! Shared utilities and common types for the Family Locator backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (session token hashing)
//! - Geospatial helpers (haversine distance, polygon containment)
//! - Common validation logic

pub mod crypto;
pub mod geo;
pub mod validation;
