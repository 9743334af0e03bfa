//! Lifecycle hook types

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::trace::TestContext;

/// Future returned by test bodies and hooks
pub type TestFuture = BoxFuture<'static, anyhow::Result<()>>;

/// A callable receiving the running test's context
pub type TestFn = Arc<dyn Fn(TestContext) -> TestFuture + Send + Sync>;

/// A callable without test context (file-level hooks)
pub type SuiteFn = Arc<dyn Fn() -> TestFuture + Send + Sync>;

/// Lifecycle points a hook can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookKind {
    /// Once per file, before its first test
    BeforeAll,
    /// Before every test body, with the test's trace bound
    BeforeEach,
    /// After every test body, whatever its outcome
    AfterEach,
    /// Once per file, after its last test
    AfterAll,
}

impl HookKind {
    /// Whether hooks of this kind run once per test
    pub fn is_per_test(&self) -> bool {
        matches!(self, HookKind::BeforeEach | HookKind::AfterEach)
    }

    pub fn all() -> &'static [HookKind] {
        &[
            HookKind::BeforeAll,
            HookKind::BeforeEach,
            HookKind::AfterEach,
            HookKind::AfterAll,
        ]
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::BeforeAll => write!(f, "beforeAll"),
            HookKind::BeforeEach => write!(f, "beforeEach"),
            HookKind::AfterEach => write!(f, "afterEach"),
            HookKind::AfterAll => write!(f, "afterAll"),
        }
    }
}

/// A registered hook callable
#[derive(Clone)]
pub enum HookFn {
    /// Hook that does not look at the test context
    Suite(SuiteFn),
    /// Hook that receives the running test's context
    Test(TestFn),
}

impl HookFn {
    /// Invoke the hook. Context-taking hooks are skipped when no test is running.
    pub fn call(&self, ctx: Option<&TestContext>) -> TestFuture {
        match (self, ctx) {
            (HookFn::Suite(f), _) => f(),
            (HookFn::Test(f), Some(ctx)) => f(ctx.clone()),
            (HookFn::Test(_), None) => Box::pin(async { Ok(()) }),
        }
    }
}

impl fmt::Debug for HookFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookFn::Suite(_) => f.write_str("HookFn::Suite"),
            HookFn::Test(_) => f.write_str("HookFn::Test"),
        }
    }
}

/// Hooks of one source file, each list in registration order
#[derive(Debug, Clone, Default)]
pub struct HookSet {
    pub before_all: Vec<HookFn>,
    pub before_each: Vec<HookFn>,
    pub after_each: Vec<HookFn>,
    pub after_all: Vec<HookFn>,
}

impl HookSet {
    pub fn get(&self, kind: HookKind) -> &[HookFn] {
        match kind {
            HookKind::BeforeAll => &self.before_all,
            HookKind::BeforeEach => &self.before_each,
            HookKind::AfterEach => &self.after_each,
            HookKind::AfterAll => &self.after_all,
        }
    }

    pub(crate) fn push(&mut self, kind: HookKind, hook: HookFn) {
        match kind {
            HookKind::BeforeAll => self.before_all.push(hook),
            HookKind::BeforeEach => self.before_each.push(hook),
            HookKind::AfterEach => self.after_each.push(hook),
            HookKind::AfterAll => self.after_all.push(hook),
        }
    }

    /// Number of registered hooks across all kinds
    pub fn count(&self) -> usize {
        self.before_all.len()
            + self.before_each.len()
            + self.after_each.len()
            + self.after_all.len()
    }
}
