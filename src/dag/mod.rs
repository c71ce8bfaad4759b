// src/dag/mod.rs

//! Task prerequisite graph.
//!
//! [`graph`] validates that prerequisites form a DAG and resolves the
//! order in which a requested set of tasks has to run.

pub mod graph;

pub use graph::TaskGraph;
