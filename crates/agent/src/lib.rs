//! Device-side tracking agent.
//!
//! The agent turns raw location fixes into uploads to the ingestion
//! API. A single worker task owns all mutable state; everything else
//! talks to it through a command mailbox. The pipeline per fix:
//! motion classification, mode re-check, upload gating, transmission.

pub mod config;
pub mod gate;
pub mod mode;
pub mod motion;
pub mod reporter;
pub mod wake;
pub mod worker;

pub use config::TrackingConfig;
pub use mode::TrackingMode;
pub use reporter::{HttpUploader, UploadOutcome, Uploader};
pub use worker::{spawn_agent, AgentCommand, AgentHandle, FixRequest, LocationFix};
