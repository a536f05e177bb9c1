//! Domain models for the Family Locator backend.

pub mod device;
pub mod location;
pub mod presence;
pub mod settings;
pub mod tracking_event;
pub mod zone;

pub use device::Device;
pub use location::{IngestLocationRequest, IngestLocationResponse, LocationSample};
pub use presence::{CurrentLocationsResponse, MemberPresence, PresenceStatus};
pub use settings::{SettingsError, TrackingSettings, UpdateSettingsRequest};
pub use tracking_event::{LogEventRequest, LogEventResponse, TrackingEvent, TrackingEventType};
pub use zone::{Zone, ZoneShape};
