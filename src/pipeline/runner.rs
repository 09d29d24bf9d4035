// src/pipeline/runner.rs

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::pipeline::graph::StageGraph;
use crate::tasks::{TaskContext, TaskName, TaskSet};

/// What to do when a stage fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop launching anything further and fail the run. Used by the
    /// one-shot production pipeline.
    Halt,
    /// Skip only the failed stage's dependents; independent stages still
    /// run, and the run itself reports rather than fails. Used by the
    /// development pipeline so the watcher and server still come up.
    Isolate,
}

/// Per-run state of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageState {
    Pending,
    Running,
    Done,
    Failed,
    Skipped,
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub failed: Vec<TaskName>,
    pub skipped: Vec<TaskName>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Generic stage-graph executor.
///
/// Stages whose dependencies have all completed are launched concurrently;
/// a stage with an incomplete dependency waits. The run is over when every
/// stage is in a terminal state. The runner only knows task names, so it can
/// be exercised with stand-in tasks in tests.
pub struct Runner {
    graph: StageGraph,
    policy: FailurePolicy,
}

impl Runner {
    pub fn new(graph: StageGraph, policy: FailurePolicy) -> Self {
        Self { graph, policy }
    }

    pub async fn run(&self, tasks: &TaskSet, ctx: Arc<TaskContext>) -> Result<RunSummary> {
        let mut state: HashMap<TaskName, StageState> = self
            .graph
            .stages()
            .iter()
            .map(|s| (s.name.clone(), StageState::Pending))
            .collect();

        let mut join: JoinSet<(TaskName, Result<(), String>)> = JoinSet::new();

        loop {
            self.propagate_skips(&mut state);
            self.launch_ready(&mut state, &mut join, tasks, &ctx)?;

            if join.is_empty() {
                break;
            }

            let (name, result) = join
                .join_next()
                .await
                .expect("join set was checked non-empty")
                .map_err(|e| anyhow!("stage panicked: {e}"))?;

            match result {
                Ok(()) => {
                    state.insert(name, StageState::Done);
                }
                Err(message) => {
                    error!(stage = %name, error = %message, "stage failed");
                    state.insert(name, StageState::Failed);

                    if self.policy == FailurePolicy::Halt {
                        for st in state.values_mut() {
                            if *st == StageState::Pending {
                                *st = StageState::Skipped;
                            }
                        }
                    }
                }
            }
        }

        let summary = RunSummary {
            failed: terminal(&state, StageState::Failed),
            skipped: terminal(&state, StageState::Skipped),
        };

        if self.policy == FailurePolicy::Halt && !summary.failed.is_empty() {
            return Err(anyhow!(
                "pipeline failed at stage(s): {}",
                summary.failed.join(", ")
            ));
        }

        Ok(summary)
    }

    /// Launch every pending stage whose dependencies are all done.
    fn launch_ready(
        &self,
        state: &mut HashMap<TaskName, StageState>,
        join: &mut JoinSet<(TaskName, Result<(), String>)>,
        tasks: &TaskSet,
        ctx: &Arc<TaskContext>,
    ) -> Result<()> {
        let ready: Vec<TaskName> = self
            .graph
            .stages()
            .iter()
            .filter(|s| {
                state.get(&s.name) == Some(&StageState::Pending)
                    && s.deps
                        .iter()
                        .all(|d| state.get(d) == Some(&StageState::Done))
            })
            .map(|s| s.name.clone())
            .collect();

        for name in ready {
            let task = tasks
                .get(&name)
                .ok_or_else(|| anyhow!("no task registered for stage '{name}'"))?;
            let ctx = Arc::clone(ctx);

            debug!(stage = %name, "launching stage");
            state.insert(name.clone(), StageState::Running);

            join.spawn(async move {
                let result = match task.run(&ctx).await {
                    Ok(report) => {
                        info!(
                            stage = %task.name(),
                            files = report.files_written,
                            "stage finished"
                        );
                        Ok(())
                    }
                    Err(e) => Err(e.to_string()),
                };
                (name, result)
            });
        }

        Ok(())
    }

    /// Mark pending stages with a failed or skipped dependency as skipped,
    /// transitively.
    fn propagate_skips(&self, state: &mut HashMap<TaskName, StageState>) {
        loop {
            let to_skip: Vec<TaskName> = self
                .graph
                .stages()
                .iter()
                .filter(|s| {
                    state.get(&s.name) == Some(&StageState::Pending)
                        && s.deps.iter().any(|d| {
                            matches!(
                                state.get(d),
                                Some(StageState::Failed) | Some(StageState::Skipped)
                            )
                        })
                })
                .map(|s| s.name.clone())
                .collect();

            if to_skip.is_empty() {
                break;
            }
            for name in to_skip {
                debug!(stage = %name, "skipping stage: upstream failure");
                state.insert(name, StageState::Skipped);
            }
        }
    }
}

fn terminal(state: &HashMap<TaskName, StageState>, which: StageState) -> Vec<TaskName> {
    let mut names: Vec<TaskName> = state
        .iter()
        .filter(|(_, st)| **st == which)
        .map(|(name, _)| name.clone())
        .collect();
    names.sort();
    names
}
