//! Registry of tests and hooks keyed by source file

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::hooks::{HookFn, HookKind, HookSet, SuiteFn, TestFn, TestFuture};
use crate::error::{DashError, DashResult};
use crate::trace::TestContext;

/// A registered test
#[derive(Clone)]
pub struct TestCase {
    pub name: String,
    pub file: String,
    body: TestFn,
}

impl TestCase {
    pub fn new(name: impl Into<String>, file: impl Into<String>, body: TestFn) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            body,
        }
    }

    /// Start the test body
    pub fn run(&self, ctx: TestContext) -> TestFuture {
        (self.body)(ctx)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("file", &self.file)
            .finish()
    }
}

#[derive(Default)]
struct FileEntry {
    tests: Vec<TestCase>,
    hooks: HookSet,
}

#[derive(Default)]
struct RegistryState {
    /// Files in first-registration order
    order: Vec<String>,
    files: HashMap<String, FileEntry>,
}

impl RegistryState {
    fn entry(&mut self, file: &str) -> &mut FileEntry {
        if !self.files.contains_key(file) {
            self.order.push(file.to_string());
        }
        self.files.entry(file.to_string()).or_default()
    }
}

/// Registry of tests and lifecycle hooks, organized by source file
#[derive(Clone, Default)]
pub struct Registry {
    state: Arc<RwLock<RegistryState>>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a test. Names must be unique within a file.
    pub fn register_test(&self, name: &str, body: TestFn, file: &str) -> DashResult<()> {
        let mut state = self.state.write();
        let entry = state.entry(file);
        if entry.tests.iter().any(|t| t.name == name) {
            return Err(DashError::duplicate_name(name, file));
        }
        entry.tests.push(TestCase::new(name, file, body));
        debug!(test = name, file, "Registered test");
        Ok(())
    }

    /// Append a hook to the list for `kind`
    ///
    /// File-level hooks (`beforeAll`/`afterAll`) run outside any test and cannot
    /// take a test context.
    pub fn register_hook(&self, kind: HookKind, hook: HookFn, file: &str) -> DashResult<()> {
        if !kind.is_per_test() && matches!(hook, HookFn::Test(_)) {
            return Err(DashError::config_with_context(
                format!("{} hooks do not receive a test context", kind),
                format!("Registering hook for {}", file),
            ));
        }
        self.push_hook(kind, hook, file);
        Ok(())
    }

    /// Register a hook that takes no context; valid for every kind
    pub fn add_suite_hook(&self, kind: HookKind, hook: SuiteFn, file: &str) {
        self.push_hook(kind, HookFn::Suite(hook), file);
    }

    /// Register a `beforeEach` hook that receives the test context
    pub fn add_before_each(&self, hook: TestFn, file: &str) {
        self.push_hook(HookKind::BeforeEach, HookFn::Test(hook), file);
    }

    /// Register an `afterEach` hook that receives the test context
    pub fn add_after_each(&self, hook: TestFn, file: &str) {
        self.push_hook(HookKind::AfterEach, HookFn::Test(hook), file);
    }

    fn push_hook(&self, kind: HookKind, hook: HookFn, file: &str) {
        self.state.write().entry(file).hooks.push(kind, hook);
        debug!(%kind, file, "Registered hook");
    }

    /// Tests of a file in registration order
    pub fn tests_for_file(&self, file: &str) -> Vec<TestCase> {
        self.state
            .read()
            .files
            .get(file)
            .map(|entry| entry.tests.clone())
            .unwrap_or_default()
    }

    /// Hooks of a file, each list in registration order
    pub fn hooks_for_file(&self, file: &str) -> HookSet {
        self.state
            .read()
            .files
            .get(file)
            .map(|entry| entry.hooks.clone())
            .unwrap_or_default()
    }

    /// Files with registrations, in first-registration order
    pub fn files(&self) -> Vec<String> {
        self.state.read().order.clone()
    }

    pub fn contains_file(&self, file: &str) -> bool {
        self.state.read().files.contains_key(file)
    }

    /// Total number of registered tests
    pub fn test_count(&self) -> usize {
        self.state.read().files.values().map(|e| e.tests.len()).sum()
    }

    /// Drop every registration
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.order.clear();
        state.files.clear();
    }

    /// Drop the registrations of one file
    pub fn clear_file(&self, file: &str) {
        let mut state = self.state.write();
        state.order.retain(|f| f != file);
        state.files.remove(file);
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Registry")
            .field("files", &state.order)
            .finish()
    }
}
