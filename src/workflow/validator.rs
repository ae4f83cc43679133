//! Structural workflow validation.
//!
//! These checks decide whether a workflow may be marked runnable. They do
//! not simulate execution and do not check whether any event would ever be
//! admitted by the trigger.

use std::collections::HashSet;

use serde::Serialize;

use super::types::WorkflowDefinition;
use crate::error::{Error, Result};

/// Outcome of validating a workflow: a list of human-readable problems.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// A workflow is runnable only when no problems were found.
    pub fn is_runnable(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Turn a failing report into a single validation error.
    pub fn into_result(self) -> Result<()> {
        if self.is_runnable() {
            Ok(())
        } else {
            Err(Error::Validation(self.errors.join("; ")))
        }
    }
}

/// Validate the structure of a workflow graph.
///
/// Checks for:
/// - At least one action node
/// - Every action node has a non-empty config
/// - Every action node is attached to at least one edge
/// - Unique node IDs
/// - Edges only reference existing nodes
pub fn validate_workflow(workflow: &WorkflowDefinition) -> ValidationReport {
    let mut report = ValidationReport::default();

    let actions: Vec<_> = workflow.action_nodes().collect();
    if actions.is_empty() {
        report.push("Workflow must have at least one action node");
    }

    let unconfigured: Vec<&str> = actions
        .iter()
        .filter(|n| !n.is_configured())
        .map(|n| n.display_label())
        .collect();
    if !unconfigured.is_empty() {
        report.push(format!(
            "{} node(s) not configured: {}",
            unconfigured.len(),
            unconfigured.join(", ")
        ));
    }

    let connected: HashSet<&str> = workflow
        .edges
        .iter()
        .flat_map(|e| [e.source.as_str(), e.target.as_str()])
        .collect();
    let disconnected = actions
        .iter()
        .filter(|n| !connected.contains(n.id.as_str()))
        .count();
    if disconnected > 0 {
        report.push(format!("{} node(s) not connected", disconnected));
    }

    let mut ids = HashSet::new();
    for node in &workflow.nodes {
        if !ids.insert(node.id.as_str()) {
            report.push(format!("Duplicate node ID: {}", node.id));
        }
    }

    for edge in &workflow.edges {
        for endpoint in [&edge.source, &edge.target] {
            if !ids.contains(endpoint.as_str()) {
                report.push(format!(
                    "Edge '{}' references unknown node '{}'",
                    edge.id, endpoint
                ));
            }
        }
    }

    report
}

impl WorkflowDefinition {
    /// Structural validation plus trigger configuration validation.
    ///
    /// This is the check to run before saving or activating a workflow.
    pub fn validate(&self) -> ValidationReport {
        let mut report = validate_workflow(self);
        if let Err(e) = self.compile_trigger() {
            report.push(format!("Trigger configuration invalid: {}", e));
        }
        report
    }
}
