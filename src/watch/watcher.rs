// src/watch/watcher.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEvent, Debouncer};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::fileset::relative_str;
use crate::tasks::TaskName;
use crate::watch::bindings::WatchBinding;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying debouncer (and with it the `notify` watcher) alive;
/// dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: Debouncer<RecommendedWatcher>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a debounced filesystem watcher over `root`.
///
/// Each debounced change batch is mapped to the set of bound tasks whose
/// patterns match a changed path, and the runtime receives one
/// `TasksTriggered` event per batch — so a task re-runs exactly once per
/// batch no matter how many of its files changed.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    bindings: Vec<WatchBinding>,
    debounce_ms: u64,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone()); // best-effort

    // Channel from the debouncer's callback thread into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Vec<DebouncedEvent>>();

    let mut debouncer = new_debouncer(
        Duration::from_millis(debounce_ms),
        move |res: DebounceEventResult| match res {
            Ok(events) => {
                if let Err(err) = event_tx.send(events) {
                    eprintln!("sitepipe: failed to forward debounced events: {err}");
                }
            }
            Err(err) => {
                eprintln!("sitepipe: file watch error: {err:?}");
            }
        },
    )?;

    debouncer.watcher().watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);

    let async_root = root.clone();
    tokio::spawn(async move {
        while let Some(events) = event_rx.recv().await {
            let tasks = tasks_for_batch(&async_root, &bindings, &events);
            if tasks.is_empty() {
                continue;
            }

            debug!(?tasks, changes = events.len(), "debounced batch matched bindings");

            if let Err(err) = runtime_tx
                .send(RuntimeEvent::TasksTriggered {
                    tasks: tasks.into_iter().collect(),
                })
                .await
            {
                warn!("failed to send RuntimeEvent::TasksTriggered: {err}");
                // Runtime channel closed; no point keeping this loop alive.
                return;
            }
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: debouncer })
}

/// Map one debounced batch to the set of tasks to re-invoke.
fn tasks_for_batch(
    root: &Path,
    bindings: &[WatchBinding],
    events: &[DebouncedEvent],
) -> BTreeSet<TaskName> {
    let mut tasks = BTreeSet::new();

    for event in events {
        let Some(rel) = relative_str(root, &event.path) else {
            warn!(
                "could not relativize path {:?} against root {:?}",
                event.path, root
            );
            continue;
        };
        for binding in bindings {
            if binding.matches(&rel) {
                debug!(task = %binding.name(), path = %rel, "watch match");
                tasks.insert(binding.name().to_string());
            }
        }
    }

    tasks
}
