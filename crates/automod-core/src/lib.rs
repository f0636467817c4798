//! Automod Core
//!
//! Shared types and error handling for the Automod moderation service:
//! - The moderation data model (`ContentRecord`, `FieldVerdict`,
//!   `ModerationResult`)
//! - The error taxonomy and `Result` alias

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{ContentRecord, FieldVerdict, Label, ModerationResult};
