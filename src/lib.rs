// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fileset;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod tasks;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::{ConfigFile, Mode};
use crate::engine::{Runtime, RuntimeEvent};
use crate::pipeline::{development_graph, production_graph, FailurePolicy, Runner, StageGraph};
use crate::server::ReloadHub;
use crate::tasks::{build_task_set, TaskContext};
use crate::watch::build_watch_bindings;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the task registry and pipeline runner
/// - (development only) file watcher, dev server, and the watch runtime
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let mode = if args.production {
        Mode::Production
    } else {
        Mode::Development
    };

    if args.dry_run {
        print_dry_run(&cfg, mode)?;
        return Ok(());
    }

    let reload = ReloadHub::new();
    let ctx = Arc::new(TaskContext {
        mode,
        paths: cfg.paths.clone(),
        browsers: cfg.styles.browsers.clone(),
        reload: reload.clone(),
    });
    let tasks = Arc::new(build_task_set());

    match mode {
        Mode::Production => {
            // One-shot, fully sequential; the first failure fails the run.
            let runner = Runner::new(production_graph()?, FailurePolicy::Halt);
            runner.run(&tasks, ctx).await?;
            info!("production build complete");
            Ok(())
        }
        Mode::Development => {
            // Initial build with failures isolated, so a syntax error at
            // startup still brings up the watcher and server.
            let runner = Runner::new(development_graph()?, FailurePolicy::Isolate);
            let summary = runner.run(&tasks, Arc::clone(&ctx)).await?;
            if !summary.all_succeeded() {
                warn!(
                    failed = ?summary.failed,
                    skipped = ?summary.skipped,
                    "initial build had failures; watching anyway"
                );
            }

            // Runtime event channel.
            let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

            // File watcher over the source root.
            let bindings = build_watch_bindings(&cfg.paths)?;
            let _watcher_handle = watch::spawn_watcher(
                cfg.paths.source_root.clone(),
                bindings,
                cfg.watch.debounce_ms,
                rt_tx.clone(),
            )?;

            // Dev server; best-effort, its death should not kill the watch loop.
            {
                let root = cfg.paths.build_root.clone();
                let section = cfg.server.clone();
                let hub = reload.clone();
                tokio::spawn(async move {
                    if let Err(err) = server::serve(root, section, hub).await {
                        error!(error = %err, "dev server stopped");
                    }
                });
            }

            // Ctrl-C -> graceful shutdown.
            {
                let tx = rt_tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        eprintln!("failed to listen for Ctrl+C: {e}");
                        return;
                    }
                    let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
                });
            }

            let runtime = Runtime::new(tasks, ctx, rt_rx, rt_tx);
            runtime.run().await
        }
    }
}

/// Simple dry-run output: print mode, layout and the stage graph.
fn print_dry_run(cfg: &ConfigFile, mode: Mode) -> Result<()> {
    let graph = match mode {
        Mode::Production => production_graph()?,
        Mode::Development => development_graph()?,
    };

    println!("sitepipe dry-run");
    println!("  mode: {:?}", mode);
    println!("  source root: {:?}", cfg.paths.source_root);
    println!("  output root: {:?}", cfg.paths.build_root);
    println!("  server: port {} (external: {})", cfg.server.port, cfg.server.external);
    println!("  watch debounce: {}ms", cfg.watch.debounce_ms);
    println!();
    print_stages(&graph);

    Ok(())
}

fn print_stages(graph: &StageGraph) {
    println!("stages ({}):", graph.stages().len());
    for stage in graph.stages() {
        println!("  - {}", stage.name);
        if !stage.deps.is_empty() {
            println!("      after: {:?}", stage.deps);
        }
    }
}
