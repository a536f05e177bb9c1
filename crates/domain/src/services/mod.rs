//! Collaborator interfaces consumed by the tracking pipeline.
//!
//! Delivery transports (push notifications, billing) live outside this
//! repository; these traits are the seams they plug into.

pub mod billing;
pub mod notification;

pub use billing::{BillingGate, MockBillingGate};
pub use notification::{
    MockNotificationDispatcher, NotificationDispatcher, NotificationResult, TrackingNotification,
};
