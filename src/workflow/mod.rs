//! Durable multi-step workflow engine.
//!
//! A workflow is an ordered list of named steps over a job context. The
//! engine persists a progress record to an expiring keyed store on entry
//! to every step and once more on completion or failure, so any process
//! can poll job status mid-flight. States move strictly forward on
//! success; `failed` is reachable from every state.
//!
//! The engine provides no mutual exclusion across runs sharing a key:
//! concurrent runs race on the progress record, and callers must dedupe
//! triggers. TTL expiry is the sole cleanup mechanism — records are
//! never deleted explicitly.

pub mod brand;
pub mod fetch;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn, Instrument};

use crate::{AppError, Result};

/// Terminal status written after the last step succeeds.
pub const STATUS_COMPLETED: &str = "completed";
/// Terminal status written when a step raises.
pub const STATUS_FAILED: &str = "failed";

/// Expiring snapshot of a workflow's state, polled by callers outside
/// this core. Field names match the dashboard's wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowProgress {
    /// Current step name, `completed`, or `failed`.
    pub status: String,
    /// 1-based index of the most recently entered step.
    pub current_step: u32,
    /// Total number of steps in the job.
    pub total_steps: u32,
    /// Error message, present only when `status` is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowProgress {
    fn step(status: &str, current_step: u32, total_steps: u32) -> Self {
        Self {
            status: status.to_owned(),
            current_step,
            total_steps,
            error: None,
        }
    }

    fn failed(current_step: u32, total_steps: u32, error: String) -> Self {
        Self {
            status: STATUS_FAILED.to_owned(),
            current_step,
            total_steps,
            error: Some(error),
        }
    }
}

/// Keyed progress store with per-record expiry (`set`-only from the
/// engine's side; status is read by a separate query path).
pub trait ProgressStore: Send + Sync {
    /// Upsert the record for `key` with the given time-to-live.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`](crate::AppError::Store) if the write
    /// fails.
    fn set(
        &self,
        key: &str,
        progress: &WorkflowProgress,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// A step body: borrows the job context for the duration of the step.
pub type StepFn<C> = Box<
    dyn for<'c> Fn(&'c mut C) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'c>>
        + Send
        + Sync,
>;

/// One named unit of a workflow, executed exactly once per run.
pub struct WorkflowStep<C> {
    name: &'static str,
    run: StepFn<C>,
}

/// Ordered list of named steps over a job context `C`.
///
/// Steps share no mutable state besides what they thread through the
/// context explicitly.
pub struct Workflow<C> {
    steps: Vec<WorkflowStep<C>>,
}

impl<C> Default for Workflow<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Workflow<C> {
    /// Create an empty workflow.
    #[must_use]
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a named step.
    #[must_use]
    pub fn step(
        mut self,
        name: &'static str,
        run: impl for<'c> Fn(&'c mut C) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'c>>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.steps.push(WorkflowStep {
            name,
            run: Box::new(run),
        });
        self
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the workflow has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step names in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name).collect()
    }
}

/// Runs workflows, publishing progress through a [`ProgressStore`].
pub struct WorkflowEngine<'a> {
    store: &'a dyn ProgressStore,
    ttl: Duration,
}

impl<'a> WorkflowEngine<'a> {
    /// Create an engine writing progress records with the given TTL.
    #[must_use]
    pub fn new(store: &'a dyn ProgressStore, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Execute every step in order against `context`.
    ///
    /// On entry to each step the progress record is overwritten with the
    /// step name and counters (any prior error cleared). A step error is
    /// persisted as `failed` with its message and re-raised; steps are
    /// never retried by the engine, and partial side effects of earlier
    /// steps are not rolled back.
    ///
    /// # Errors
    ///
    /// Returns the failing step's error, or
    /// [`AppError::Store`](crate::AppError::Store) if a progress write
    /// fails.
    pub async fn run<C>(&self, key: &str, workflow: &Workflow<C>, context: &mut C) -> Result<()> {
        let total_steps = u32::try_from(workflow.steps.len())
            .map_err(|_| AppError::Workflow("workflow has too many steps".into()))?;

        let span = info_span!("workflow", key, total_steps);
        async move {
            for (index, step) in workflow.steps.iter().enumerate() {
                #[allow(clippy::cast_possible_truncation)] // bounded by total_steps above
                let current_step = index as u32 + 1;

                self.store
                    .set(
                        key,
                        &WorkflowProgress::step(step.name, current_step, total_steps),
                        self.ttl,
                    )
                    .await?;
                info!(step = step.name, current_step, "workflow step starting");

                if let Err(err) = (step.run)(context).await {
                    let failed =
                        WorkflowProgress::failed(current_step, total_steps, err.to_string());
                    if let Err(store_err) = self.store.set(key, &failed, self.ttl).await {
                        warn!(%store_err, "failed to persist workflow failure");
                    }
                    return Err(err);
                }
            }

            self.store
                .set(
                    key,
                    &WorkflowProgress::step(STATUS_COMPLETED, total_steps, total_steps),
                    self.ttl,
                )
                .await?;
            info!("workflow completed");
            Ok(())
        }
        .instrument(span)
        .await
    }
}
