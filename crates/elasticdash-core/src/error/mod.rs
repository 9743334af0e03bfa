//! Error types for ElasticDash
//!
//! Every failure the engine can report is a variant of [`DashError`]. Matchers
//! return these directly; user code usually returns `anyhow::Result<()>` and the
//! runner recovers the structured kind by downcasting.

mod constructors;
mod conversions;
mod types;
mod unified_error;

pub use conversions::classify_user_error;
pub use types::{DashError, DashResult, UnifiedError};
