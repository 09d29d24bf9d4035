// src/pipeline/mod.rs

//! Pipeline composition and execution.
//!
//! Pipelines are explicit directed acyclic graphs of named stages with
//! declared dependencies, executed by a generic runner. The runner knows
//! nothing about the concrete tasks, so ordering and failure semantics are
//! unit-testable on their own.

pub mod graph;
pub mod runner;

pub use graph::{development_graph, production_graph, Stage, StageGraph};
pub use runner::{FailurePolicy, RunSummary, Runner};
