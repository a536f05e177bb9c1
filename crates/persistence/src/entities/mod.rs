//! Entity definitions (database row mappings).

pub mod device;
pub mod location;
pub mod session;
pub mod settings;
pub mod tracking_event;
pub mod user;
pub mod zone;

pub use device::DeviceEntity;
pub use location::{LocationEntity, MemberLatestRow};
pub use session::SessionEntity;
pub use settings::TrackingSettingsEntity;
pub use tracking_event::TrackingEventEntity;
pub use user::UserEntity;
pub use zone::ZoneEntity;
