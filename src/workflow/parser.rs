//! Workflow definition parser.
//!
//! Accepts the persisted JSON form as well as YAML, since every JSON
//! document is valid YAML.

use std::path::Path;

use super::types::WorkflowDefinition;
use crate::error::{Error, Result};

/// Parse a workflow definition from a JSON or YAML string.
pub fn parse_workflow(text: &str) -> Result<WorkflowDefinition> {
    if text.trim().is_empty() {
        return Err(Error::Parse("Empty workflow definition".to_string()));
    }

    let workflow: WorkflowDefinition = serde_yaml::from_str(text).map_err(|e| {
        let msg = e.to_string();
        if let Some(field) = extract_missing_field(&msg) {
            Error::Parse(format!("Missing required field: {}", field))
        } else {
            Error::Parse(format!("Invalid workflow definition: {}", msg))
        }
    })?;
    Ok(workflow)
}

/// Parse a workflow definition from a file path.
pub fn parse_workflow_file(path: &Path) -> Result<WorkflowDefinition> {
    let content = std::fs::read_to_string(path)?;
    parse_workflow(&content)
}

fn extract_missing_field(error_message: &str) -> Option<&str> {
    let marker = "missing field `";
    let start = error_message.find(marker)? + marker.len();
    let rest = &error_message[start..];
    let end = rest.find('`')?;
    Some(&rest[..end])
}
