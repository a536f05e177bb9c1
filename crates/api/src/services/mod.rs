//! Request-scoped services used by the route handlers.

pub mod auth;
pub mod battery;
pub mod geofence;

pub use auth::Caller;
pub use battery::BatteryMonitor;
pub use geofence::GeofenceEvaluator;
