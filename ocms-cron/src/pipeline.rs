//! Gated step pipeline
//!
//! Runs named steps strictly one after another. A step only runs when the
//! step before it succeeded; otherwise it is recorded as skipped without
//! being invoked. Errors and panics inside a step become `error` results, so
//! running a pipeline never fails.

use async_trait::async_trait;
use futures::FutureExt;
use ocms_core::domain::job::JobResult;
use ocms_core::domain::step::{StepResult, StepStatus};
use serde_json::{Map, Value, json};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::job::panic_message;

/// Results gathered so far, handed to the next step
#[derive(Debug, Clone, Default)]
pub struct StepContext {
    results: Vec<StepResult>,
}

impl StepContext {
    pub fn new(results: Vec<StepResult>) -> Self {
        Self { results }
    }

    /// Result of the step that ran immediately before
    pub fn previous(&self) -> Option<&StepResult> {
        self.results.last()
    }

    /// Payload of the previous step, empty for the first step
    pub fn previous_json(&self) -> Map<String, Value> {
        self.previous().map(|r| r.json.clone()).unwrap_or_default()
    }

    /// Every earlier result, in execution order
    pub fn results(&self) -> &[StepResult] {
        &self.results
    }

    pub fn result_of(&self, step_name: &str) -> Option<&StepResult> {
        self.results.iter().find(|r| r.step_name == step_name)
    }
}

/// One named unit of a pipeline
#[async_trait]
pub trait PipelineStep: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, ctx: StepContext) -> anyhow::Result<StepResult>;
}

/// Step backed by an async closure
pub struct FnStep<F> {
    name: String,
    func: F,
}

impl<F> FnStep<F> {
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F, Fut> PipelineStep for FnStep<F>
where
    F: Fn(StepContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<StepResult>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: StepContext) -> anyhow::Result<StepResult> {
        (self.func)(ctx).await
    }
}

/// Ordered, gated sequence of steps
pub struct StepPipeline {
    name: String,
    steps: Vec<Box<dyn PipelineStep>>,
    step_delay: Duration,
}

impl StepPipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            step_delay: Duration::ZERO,
        }
    }

    /// Pause inserted before each step after the first one that runs
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn step(mut self, step: impl PipelineStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn step_fn<F, Fut>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<StepResult>> + Send + 'static,
    {
        self.step(FnStep::new(name, func))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Runs every step in order and returns one result per configured step
    pub async fn run(&self) -> Vec<StepResult> {
        info!(
            "Starting pipeline {} with {} step(s)",
            self.name,
            self.steps.len()
        );

        let mut results: Vec<StepResult> = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            if let Some(previous) = results.last() {
                if !previous.is_success() {
                    info!(
                        "Skipping step {} of pipeline {}: {} did not succeed",
                        step.name(),
                        self.name,
                        previous.step_name
                    );
                    results.push(StepResult::skipped(step.name()));
                    continue;
                }

                if !self.step_delay.is_zero() {
                    debug!("Waiting {:?} before step {}", self.step_delay, step.name());
                    tokio::time::sleep(self.step_delay).await;
                }
            }

            let result = self.run_step(step.as_ref(), &results).await;
            results.push(result);
        }

        info!(
            "Pipeline {} finished: {}",
            self.name,
            if all_succeeded(&results) {
                "success"
            } else {
                "failure"
            }
        );

        results
    }

    /// Runs the pipeline and folds the step results into a job result
    pub async fn run_to_job_result(&self) -> JobResult {
        let results = self.run().await;
        into_job_result(&self.name, &results)
    }

    async fn run_step(&self, step: &dyn PipelineStep, results: &[StepResult]) -> StepResult {
        let name = step.name();
        debug!("Executing step {} of pipeline {}", name, self.name);

        let ctx = StepContext::new(results.to_vec());
        let mut result = match AssertUnwindSafe(step.execute(ctx)).catch_unwind().await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => StepResult::error(name, format!("{:#}", e)),
            Err(panic) => StepResult::error(name, format!("Step panicked: {}", panic_message(panic))),
        };
        result.step_name = name.to_string();

        match result.status {
            StepStatus::Success => info!("Step {} succeeded: {}", name, result.message),
            StepStatus::Error => warn!("Step {} failed: {}", name, result.message),
            StepStatus::Skipped => info!("Step {} skipped itself: {}", name, result.message),
        }

        result
    }
}

/// True when every step succeeded
pub fn all_succeeded(results: &[StepResult]) -> bool {
    results.iter().all(StepResult::is_success)
}

/// One line per step: `name [status] message`
pub fn summarize(results: &[StepResult]) -> String {
    results
        .iter()
        .map(|r| format!("{} [{}] {}", r.step_name, r.status, r.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Job result for a finished pipeline, carrying the steps as payload
///
/// A failed pipeline's message names the failing step, followed by the
/// per-step summary so the audit log text shows the whole run.
pub fn into_job_result(pipeline_name: &str, results: &[StepResult]) -> JobResult {
    let data = json!({ "steps": results });

    let first_failure = results.iter().find(|r| !r.is_success());
    let result = match first_failure {
        None => JobResult::succeeded(format!(
            "Pipeline {} completed: {} step(s) succeeded",
            pipeline_name,
            results.len()
        )),
        Some(failed) => JobResult::failed(format!(
            "Pipeline {} failed at {}: {}\n{}",
            pipeline_name,
            failed.step_name,
            failed.message,
            summarize(results)
        )),
    };

    result.with_data(data)
}
