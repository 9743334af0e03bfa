//! Per-file test driver

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::observer::RunObserver;
use super::options::RunOptions;
use super::types::{FileResult, RunSummary, TestResult};
use crate::error::{DashError, classify_user_error};
use crate::registry::{HookFn, HookKind, HookSet, Registry, Session, TestCase};
use crate::trace::{TestContext, Trace, clear_current_trace, with_trace};

/// Runs registered tests file by file, one test at a time
pub struct Runner {
    registry: Registry,
    options: RunOptions,
    observers: Vec<Arc<dyn RunObserver>>,
}

impl Runner {
    pub fn new(session: &Session) -> Self {
        Self::from_registry(session.registry().clone())
    }

    pub fn from_registry(registry: Registry) -> Self {
        Self {
            registry,
            options: RunOptions::default(),
            observers: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run every registered file in registration order
    pub async fn run_all(&self) -> RunSummary {
        let files = self.registry.files();
        self.run_files(&files).await
    }

    /// Run the given files in the given order
    pub async fn run_files(&self, files: &[String]) -> RunSummary {
        let started = Instant::now();
        info!("Running {} file(s)", files.len());
        self.notify(|o| o.on_run_start(files));

        let mut results = Vec::with_capacity(files.len());
        for file in files {
            results.push(self.run_file(file).await);
        }

        let summary = RunSummary::new(results, started.elapsed());
        info!(
            total = summary.total(),
            passed = summary.passed(),
            failed = summary.failed(),
            "Run finished in {} ms",
            summary.elapsed_ms()
        );
        self.notify(|o| o.on_run_finish(&summary));
        summary
    }

    /// Run the tests of one file with its lifecycle hooks
    pub async fn run_file(&self, file: &str) -> FileResult {
        let started = Instant::now();
        self.notify(|o| o.on_file_start(file));

        let hooks = self.registry.hooks_for_file(file);
        let tests: Vec<TestCase> = self
            .registry
            .tests_for_file(file)
            .into_iter()
            .filter(|case| self.options.selects(&case.name))
            .collect();
        info!(file, tests = tests.len(), "Running file");

        let mut result = FileResult::new(file);
        result.before_all_error = run_before_all(&hooks).await;

        // The last result is emitted only after afterAll, which may still fail it
        let mut pending: Option<TestResult> = None;
        for case in &tests {
            let test_result = match &result.before_all_error {
                Some(err) => {
                    let trace = Trace::new();
                    trace.seal();
                    TestResult::failed(&case.name, file, Duration::ZERO, err.clone(), trace)
                }
                None => self.run_test(case, &hooks).await,
            };
            if let Some(previous) = pending.replace(test_result) {
                self.notify(|o| o.on_test_finish(&previous));
                result.tests.push(previous);
            }
        }

        let after_all_errors = run_after_all(&hooks).await;
        if !after_all_errors.is_empty() && pending.is_none() {
            let trace = Trace::new();
            trace.seal();
            pending = Some(TestResult::passed(
                format!("{} (afterAll)", file),
                file,
                Duration::ZERO,
                trace,
            ));
        }
        if let Some(mut last) = pending {
            last.attach_errors(after_all_errors.iter().cloned());
            self.notify(|o| o.on_test_finish(&last));
            result.tests.push(last);
        }
        result.after_all_errors = after_all_errors;
        result.duration = started.elapsed();

        self.notify(|o| o.on_file_finish(&result));
        result
    }

    async fn run_test(&self, case: &TestCase, hooks: &HookSet) -> TestResult {
        let trace = Trace::new();
        let ctx = TestContext::new(trace.clone(), &case.name, &case.file);
        let started = Instant::now();
        info!(test = %case.name, file = %case.file, "Running test");

        let (body_error, hook_errors) = with_trace(trace.clone(), async {
            let mut hook_errors = Vec::new();
            let mut body_error = None;

            let mut ready = true;
            for hook in &hooks.before_each {
                if let Err(err) = call_hook(hook, HookKind::BeforeEach, Some(&ctx)).await {
                    hook_errors.push(err);
                    ready = false;
                    break;
                }
            }

            if ready {
                body_error = self.run_body(case, ctx.clone()).await;
            } else {
                debug!(test = %case.name, "Skipping body after beforeEach failure");
            }

            for hook in &hooks.after_each {
                if let Err(err) = call_hook(hook, HookKind::AfterEach, Some(&ctx)).await {
                    hook_errors.push(err);
                }
            }

            clear_current_trace();
            (body_error, hook_errors)
        })
        .await;

        trace.seal();
        let duration = started.elapsed();

        let mut errors = body_error.into_iter().chain(hook_errors);
        match errors.next() {
            None => {
                info!(test = %case.name, "Test passed in {} ms", duration.as_millis());
                TestResult::passed(&case.name, &case.file, duration, trace)
            }
            Some(primary) => {
                error!(test = %case.name, "Test failed: {}", primary);
                let mut result =
                    TestResult::failed(&case.name, &case.file, duration, primary, trace);
                result.secondary_errors.extend(errors);
                result
            }
        }
    }

    async fn run_body(&self, case: &TestCase, ctx: TestContext) -> Option<DashError> {
        let body = AssertUnwindSafe(case.run(ctx)).catch_unwind();
        let outcome = match self.options.test_timeout {
            Some(limit) => match tokio::time::timeout(limit, body).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return Some(DashError::timeout_with_context(
                        limit.as_millis() as u64,
                        format!("test '{}'", case.name),
                    ));
                }
            },
            None => body.await,
        };

        match outcome {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(classify_user_error(err, DashError::body_failure)),
            Err(panic) => Some(DashError::body_failure(format!(
                "test panicked: {}",
                panic_message(panic.as_ref())
            ))),
        }
    }

    fn notify(&self, event: impl Fn(&dyn RunObserver)) {
        for observer in &self.observers {
            event(observer.as_ref());
        }
    }
}

async fn run_before_all(hooks: &HookSet) -> Option<DashError> {
    for hook in &hooks.before_all {
        if let Err(err) = call_hook(hook, HookKind::BeforeAll, None).await {
            return Some(err);
        }
    }
    None
}

async fn run_after_all(hooks: &HookSet) -> Vec<DashError> {
    let mut errors = Vec::new();
    for hook in &hooks.after_all {
        if let Err(err) = call_hook(hook, HookKind::AfterAll, None).await {
            errors.push(err);
        }
    }
    errors
}

async fn call_hook(
    hook: &HookFn,
    kind: HookKind,
    ctx: Option<&TestContext>,
) -> Result<(), DashError> {
    let outcome = AssertUnwindSafe(hook.call(ctx)).catch_unwind().await;
    let err = match outcome {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(err)) => classify_user_error(err, |message| {
            DashError::hook_failure(kind.to_string(), message)
        }),
        Err(panic) => DashError::hook_failure(
            kind.to_string(),
            format!("hook panicked: {}", panic_message(panic.as_ref())),
        ),
    };
    warn!(hook = %kind, "Hook failed: {}", err);
    Err(err)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
