// src/engine/runtime.rs

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::tasks::{TaskContext, TaskName, TaskSet};

/// Result of one task invocation, as seen by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

/// Events sent into the runtime from the watcher, finished task
/// invocations, and the Ctrl-C handler.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// One debounced change batch; each listed task re-runs once.
    TasksTriggered { tasks: Vec<TaskName> },
    TaskFinished {
        task: TaskName,
        outcome: TaskOutcome,
    },
    ShutdownRequested,
}

/// Watch-mode event loop.
///
/// Re-invokes the bound task for each trigger, isolating failures per
/// invocation: a broken stylesheet is reported, the previous output stays in
/// place, and the watcher and server keep running.
///
/// A trigger for a task that is currently running is remembered and the task
/// re-runs once after the current invocation finishes, so rapid consecutive
/// batches coalesce instead of stacking up.
pub struct Runtime {
    tasks: Arc<TaskSet>,
    ctx: Arc<TaskContext>,

    events_rx: mpsc::Receiver<RuntimeEvent>,
    /// Cloned into every spawned invocation so it can report completion.
    events_tx: mpsc::Sender<RuntimeEvent>,

    running: HashSet<TaskName>,
    pending: HashSet<TaskName>,
}

impl Runtime {
    pub fn new(
        tasks: Arc<TaskSet>,
        ctx: Arc<TaskContext>,
        events_rx: mpsc::Receiver<RuntimeEvent>,
        events_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            tasks,
            ctx,
            events_rx,
            events_tx,
            running: HashSet::new(),
            pending: HashSet::new(),
        }
    }

    /// Main event loop; returns when shutdown is requested or every sender
    /// has gone away.
    pub async fn run(mut self) -> Result<()> {
        info!("watch runtime started");

        while let Some(event) = self.events_rx.recv().await {
            debug!(?event, "runtime received event");

            match event {
                RuntimeEvent::TasksTriggered { tasks } => {
                    for task in tasks {
                        self.handle_trigger(task);
                    }
                }
                RuntimeEvent::TaskFinished { task, outcome } => {
                    self.handle_finished(task, outcome);
                }
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested, stopping runtime");
                    break;
                }
            }
        }

        info!("watch runtime exiting");
        Ok(())
    }

    fn handle_trigger(&mut self, task: TaskName) {
        if self.running.contains(&task) {
            debug!(task = %task, "task already running; coalescing re-trigger");
            self.pending.insert(task);
            return;
        }
        self.spawn_invocation(task);
    }

    fn handle_finished(&mut self, task: TaskName, outcome: TaskOutcome) {
        self.running.remove(&task);

        match outcome {
            TaskOutcome::Success => debug!(task = %task, "task invocation finished"),
            TaskOutcome::Failed => {
                // Already reported by the invocation; the loop carries on.
            }
        }

        if self.pending.remove(&task) {
            debug!(task = %task, "re-running task for coalesced trigger");
            self.spawn_invocation(task);
        }
    }

    fn spawn_invocation(&mut self, task: TaskName) {
        let Some(build_task) = self.tasks.get(&task) else {
            warn!(task = %task, "trigger for unknown task; ignoring");
            return;
        };

        info!(task = %task, "task triggered");
        self.running.insert(task.clone());

        let ctx = Arc::clone(&self.ctx);
        let events_tx = self.events_tx.clone();

        tokio::spawn(async move {
            let outcome = match build_task.run(&ctx).await {
                Ok(report) => {
                    info!(
                        task = %build_task.name(),
                        files = report.files_written,
                        "rebuild finished"
                    );
                    TaskOutcome::Success
                }
                Err(err) => {
                    warn!(task = %build_task.name(), error = %err, "rebuild failed");
                    TaskOutcome::Failed
                }
            };

            let _ = events_tx
                .send(RuntimeEvent::TaskFinished { task, outcome })
                .await;
        });
    }
}
