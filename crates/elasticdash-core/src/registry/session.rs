//! Session and per-file registration builder

use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use super::hooks::{HookKind, SuiteFn, TestFn};
use super::store::Registry;
use crate::error::DashResult;
use crate::trace::TestContext;

/// One discovery-and-run pass
///
/// The session owns the registry that test files register into.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    registry: Registry,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            registry: Registry::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Registration builder for one source file, usually `session.file(file!())`
    pub fn file(&self, path: impl Into<String>) -> FileSuite {
        FileSuite {
            registry: self.registry.clone(),
            file: path.into(),
        }
    }

    /// Registered files in first-registration order
    pub fn files(&self) -> Vec<String> {
        self.registry.files()
    }

    /// Forget every registration so the session can be reused for a new pass
    pub fn clear(&self) {
        self.registry.clear();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Registers tests and hooks under a single source file key
#[derive(Debug, Clone)]
pub struct FileSuite {
    registry: Registry,
    file: String,
}

impl FileSuite {
    pub fn path(&self) -> &str {
        &self.file
    }

    /// Register a test; fails with `DuplicateName` if the file already has one by that name
    pub fn test<F, Fut>(&self, name: &str, body: F) -> DashResult<&Self>
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.registry
            .register_test(name, wrap_test(body), &self.file)?;
        Ok(self)
    }

    pub fn before_all<F, Fut>(&self, hook: F) -> &Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.push_suite(HookKind::BeforeAll, hook)
    }

    pub fn after_all<F, Fut>(&self, hook: F) -> &Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.push_suite(HookKind::AfterAll, hook)
    }

    /// Runs before every test, with that test's trace bound
    pub fn before_each<F, Fut>(&self, hook: F) -> &Self
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.registry.add_before_each(wrap_test(hook), &self.file);
        self
    }

    /// Runs after every test, even when the body or an earlier hook failed
    pub fn after_each<F, Fut>(&self, hook: F) -> &Self
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.registry.add_after_each(wrap_test(hook), &self.file);
        self
    }

    fn push_suite<F, Fut>(&self, kind: HookKind, hook: F) -> &Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let hook: SuiteFn = Arc::new(move || Box::pin(hook()));
        self.registry.add_suite_hook(kind, hook, &self.file);
        self
    }
}

fn wrap_test<F, Fut>(body: F) -> TestFn
where
    F: Fn(TestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(body(ctx)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashError;

    #[test]
    fn test_file_suite_registers_under_path() {
        let session = Session::new();
        let suite = session.file("flows/checkout.rs");
        suite
            .test("charges card", |_ctx| async { Ok(()) })
            .unwrap()
            .test("sends receipt", |_ctx| async { Ok(()) })
            .unwrap();
        suite
            .before_all(|| async { Ok(()) })
            .before_each(|_ctx| async { Ok(()) })
            .after_each(|_ctx| async { Ok(()) })
            .after_all(|| async { Ok(()) });

        assert_eq!(session.files(), vec!["flows/checkout.rs"]);
        let tests = session.registry().tests_for_file("flows/checkout.rs");
        assert_eq!(tests.len(), 2);
        assert_eq!(tests[1].name, "sends receipt");
        assert_eq!(
            session.registry().hooks_for_file("flows/checkout.rs").count(),
            4
        );
    }

    #[test]
    fn test_hooks_land_in_their_lists() {
        let session = Session::new();
        session
            .file("a.rs")
            .after_each(|_ctx| async { Ok(()) })
            .before_all(|| async { Ok(()) })
            .after_each(|_ctx| async { Ok(()) });

        let hooks = session.registry().hooks_for_file("a.rs");
        assert_eq!(hooks.get(HookKind::BeforeAll).len(), 1);
        assert!(hooks.get(HookKind::BeforeEach).is_empty());
        assert_eq!(hooks.get(HookKind::AfterEach).len(), 2);
        assert!(
            hooks
                .get(HookKind::AfterEach)
                .iter()
                .all(|hook| matches!(hook, crate::registry::HookFn::Test(_)))
        );
        assert!(matches!(
            hooks.get(HookKind::BeforeAll)[0],
            crate::registry::HookFn::Suite(_)
        ));
    }

    #[test]
    fn test_duplicate_test_name() {
        let session = Session::new();
        let suite = session.file("a.rs");
        suite.test("same", |_ctx| async { Ok(()) }).unwrap();
        let err = suite.test("same", |_ctx| async { Ok(()) }).unwrap_err();
        assert!(matches!(err, DashError::DuplicateName { .. }));
    }

    #[test]
    fn test_clear_resets_session() {
        let session = Session::new();
        session.file("a.rs").test("t", |_ctx| async { Ok(()) }).unwrap();
        session.clear();
        assert!(session.files().is_empty());
    }

    #[test]
    fn test_sessions_are_independent() {
        let first = Session::new();
        let second = Session::new();
        first.file("a.rs").test("t", |_ctx| async { Ok(()) }).unwrap();
        assert!(second.files().is_empty());
        assert_ne!(first.id(), second.id());
    }
}
