//! Repository implementations for database operations.

pub mod device;
pub mod location;
pub mod session;
pub mod settings;
pub mod tracking_event;
pub mod user;
pub mod zone;

pub use device::DeviceRepository;
pub use location::{LocationInput, LocationRepository};
pub use session::SessionRepository;
pub use settings::SettingsRepository;
pub use tracking_event::{TrackingEventInput, TrackingEventRepository};
pub use user::UserRepository;
pub use zone::ZoneRepository;
