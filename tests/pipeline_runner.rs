use std::error::Error;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sitepipe::config::model::{Mode, PathsConfig};
use sitepipe::errors::TaskError;
use sitepipe::pipeline::{FailurePolicy, Runner, Stage, StageGraph};
use sitepipe::server::ReloadHub;
use sitepipe::tasks::{BuildTask, TaskContext, TaskReport, TaskSet};

type TestResult = Result<(), Box<dyn Error>>;

/// Stand-in stage that records its name into a shared log, optionally
/// failing instead.
struct RecordingTask {
    name: String,
    fail: bool,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl BuildTask for RecordingTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _ctx: &TaskContext) -> Result<TaskReport, TaskError> {
        if self.fail {
            return Err(TaskError::transform(
                std::path::Path::new(&self.name),
                "synthetic failure",
            ));
        }
        self.log.lock().unwrap().push(self.name.clone());
        Ok(TaskReport::new(1))
    }
}

fn ctx() -> Arc<TaskContext> {
    Arc::new(TaskContext {
        mode: Mode::Development,
        paths: PathsConfig::default(),
        browsers: Vec::new(),
        reload: ReloadHub::new(),
    })
}

fn task_set(names: &[&str], failing: &[&str], log: &Arc<Mutex<Vec<String>>>) -> TaskSet {
    let mut set = TaskSet::new();
    for name in names {
        set.insert(Arc::new(RecordingTask {
            name: name.to_string(),
            fail: failing.contains(name),
            log: Arc::clone(log),
        }));
    }
    set
}

#[tokio::test]
async fn chain_runs_in_dependency_order() -> TestResult {
    let log = Arc::new(Mutex::new(Vec::new()));
    let tasks = task_set(&["a", "b", "c"], &[], &log);

    let graph = StageGraph::new(vec![
        Stage::new("a", &[]),
        Stage::new("b", &["a"]),
        Stage::new("c", &["b"]),
    ])?;

    let summary = Runner::new(graph, FailurePolicy::Halt)
        .run(&tasks, ctx())
        .await?;

    assert!(summary.all_succeeded());
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    Ok(())
}

#[tokio::test]
async fn fan_out_runs_after_shared_dependency() -> TestResult {
    let log = Arc::new(Mutex::new(Vec::new()));
    let tasks = task_set(&["root", "x", "y", "z"], &[], &log);

    let graph = StageGraph::new(vec![
        Stage::new("root", &[]),
        Stage::new("x", &["root"]),
        Stage::new("y", &["root"]),
        Stage::new("z", &["root"]),
    ])?;

    Runner::new(graph, FailurePolicy::Halt)
        .run(&tasks, ctx())
        .await?;

    let ran = log.lock().unwrap().clone();
    assert_eq!(ran[0], "root");
    let mut rest = ran[1..].to_vec();
    rest.sort();
    assert_eq!(rest, vec!["x", "y", "z"]);
    Ok(())
}

#[tokio::test]
async fn halt_fails_the_run_and_skips_downstream() -> TestResult {
    let log = Arc::new(Mutex::new(Vec::new()));
    let tasks = task_set(&["a", "b", "c"], &["b"], &log);

    let graph = StageGraph::new(vec![
        Stage::new("a", &[]),
        Stage::new("b", &["a"]),
        Stage::new("c", &["b"]),
    ])?;

    let err = Runner::new(graph, FailurePolicy::Halt)
        .run(&tasks, ctx())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("b"));
    assert_eq!(*log.lock().unwrap(), vec!["a"]);
    Ok(())
}

#[tokio::test]
async fn isolate_keeps_independent_stages_running() -> TestResult {
    let log = Arc::new(Mutex::new(Vec::new()));
    let tasks = task_set(&["root", "broken", "dependent", "independent"], &["broken"], &log);

    let graph = StageGraph::new(vec![
        Stage::new("root", &[]),
        Stage::new("broken", &["root"]),
        Stage::new("dependent", &["broken"]),
        Stage::new("independent", &["root"]),
    ])?;

    let summary = Runner::new(graph, FailurePolicy::Isolate)
        .run(&tasks, ctx())
        .await?;

    assert_eq!(summary.failed, vec!["broken"]);
    assert_eq!(summary.skipped, vec!["dependent"]);

    let ran = log.lock().unwrap().clone();
    assert!(ran.contains(&"independent".to_string()));
    assert!(!ran.contains(&"dependent".to_string()));
    Ok(())
}

#[tokio::test]
async fn missing_task_registration_is_an_error() -> TestResult {
    let log = Arc::new(Mutex::new(Vec::new()));
    let tasks = task_set(&["a"], &[], &log);

    let graph = StageGraph::new(vec![
        Stage::new("a", &[]),
        Stage::new("unregistered", &["a"]),
    ])?;

    let err = Runner::new(graph, FailurePolicy::Halt)
        .run(&tasks, ctx())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("unregistered"));
    Ok(())
}
