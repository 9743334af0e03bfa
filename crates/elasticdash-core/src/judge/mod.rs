//! LLM judge used by the semantic and metric matchers
//!
//! Providers are table-driven: each [`JudgeProvider`] knows its request shape,
//! reply extraction, credential variables, default model and base URL.

pub mod client;
pub mod failure;
pub mod providers;

pub use client::{
    CredentialLookup, Judge, JudgeDefaults, JudgeOptions, judge_defaults, set_judge_defaults,
};
pub use failure::scrub;
pub use providers::JudgeProvider;
