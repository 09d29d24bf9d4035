// src/pipeline/graph.rs

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::tasks::{names, TaskName};

/// A named pipeline stage with its declared dependencies.
#[derive(Debug, Clone)]
pub struct Stage {
    pub name: TaskName,
    pub deps: Vec<TaskName>,
}

impl Stage {
    pub fn new(name: &str, deps: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Validated DAG of stages.
///
/// Construction checks that stage names are unique, every dependency refers
/// to a declared stage, and a topological order exists.
#[derive(Debug, Clone)]
pub struct StageGraph {
    stages: Vec<Stage>,
    dependents: HashMap<TaskName, Vec<TaskName>>,
}

impl StageGraph {
    pub fn new(stages: Vec<Stage>) -> Result<Self> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for stage in &stages {
            if graph.contains_node(stage.name.as_str()) {
                return Err(anyhow!("duplicate stage '{}'", stage.name));
            }
            graph.add_node(stage.name.as_str());
        }

        for stage in &stages {
            for dep in &stage.deps {
                if !stages.iter().any(|s| &s.name == dep) {
                    return Err(anyhow!(
                        "stage '{}' depends on unknown stage '{}'",
                        stage.name,
                        dep
                    ));
                }
                if dep == &stage.name {
                    return Err(anyhow!("stage '{}' cannot depend on itself", stage.name));
                }
                graph.add_edge(dep.as_str(), stage.name.as_str(), ());
            }
        }

        if let Err(cycle) = toposort(&graph, None) {
            return Err(anyhow!(
                "cycle detected in stage graph involving '{}'",
                cycle.node_id()
            ));
        }

        let mut dependents: HashMap<TaskName, Vec<TaskName>> = HashMap::new();
        for stage in &stages {
            for dep in &stage.deps {
                dependents
                    .entry(dep.clone())
                    .or_default()
                    .push(stage.name.clone());
            }
        }

        Ok(Self { stages, dependents })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.stages
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.deps.as_slice())
            .unwrap_or(&[])
    }

    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.dependents
            .get(name)
            .map(|d| d.as_slice())
            .unwrap_or(&[])
    }
}

/// Production pipeline: fully sequential, chosen for reproducible
/// deployment artifacts over speed.
///
/// clean -> sprites -> server-config -> templates -> styles -> images
pub fn production_graph() -> Result<StageGraph> {
    StageGraph::new(vec![
        Stage::new(names::CLEAN, &[]),
        Stage::new(names::SPRITES, &[names::CLEAN]),
        Stage::new(names::SERVER_CONFIG, &[names::SPRITES]),
        Stage::new(names::TEMPLATES, &[names::SERVER_CONFIG]),
        Stage::new(names::STYLES, &[names::TEMPLATES]),
        Stage::new(names::IMAGES, &[names::STYLES]),
    ])
}

/// Development pipeline: clean -> sprites, then templates, styles, and
/// images in parallel. The watch/server phase follows outside the graph.
pub fn development_graph() -> Result<StageGraph> {
    StageGraph::new(vec![
        Stage::new(names::CLEAN, &[]),
        Stage::new(names::SPRITES, &[names::CLEAN]),
        Stage::new(names::TEMPLATES, &[names::SPRITES]),
        Stage::new(names::STYLES, &[names::SPRITES]),
        Stage::new(names::IMAGES, &[names::SPRITES]),
    ])
}
