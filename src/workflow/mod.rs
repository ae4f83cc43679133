//! Workflow definitions built in the visual builder.
//!
//! A workflow consists of:
//! - A trigger: the event type (plus filters) that starts it
//! - Nodes: the trigger node and the action nodes
//! - Edges: directed connections that define execution order

mod parser;
mod types;
mod validator;

pub use parser::{parse_workflow, parse_workflow_file};
pub use types::*;
pub use validator::{validate_workflow, ValidationReport};
