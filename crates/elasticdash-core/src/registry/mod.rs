//! Test and hook registration
//!
//! Tests and lifecycle hooks are registered per source file into a [`Registry`]
//! owned by a [`Session`]. A session covers exactly one discovery-and-run pass;
//! create a new one (or call [`Session::clear`]) before running again.

pub mod hooks;
pub mod store;
pub mod session;

pub use hooks::{HookFn, HookKind, HookSet, SuiteFn, TestFn, TestFuture};
pub use store::{Registry, TestCase};
pub use session::{FileSuite, Session};
