//! # PSB Common Library
//!
//! Shared code for the private-server board services including:
//! - Error types
//! - Root folder resolution and TOML bootstrap loading
//! - The submission record and status
//! - Board event types and the event bus
//! - Server-Sent Events helpers
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
pub use events::{BoardEvent, EventBus};
pub use model::{Submission, SubmissionStatus};
