//! Workflow definition types.
//!
//! These mirror the persisted shape written by the visual builder: a
//! workflow-level trigger plus a graph of nodes and edges.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::triggers::{self, EventContext, RawTriggerConfig, TriggerConfig, TriggerType};

/// A complete workflow definition.
///
/// # Example
///
/// ```json
/// {
///   "id": "wf-1",
///   "name": "Welcome new hires",
///   "is_active": true,
///   "trigger_type": "EMPLOYEE_CREATED",
///   "trigger_config": { "department_ids": ["sales"] },
///   "nodes": [
///     { "id": "t", "type": "trigger", "position": {"x": 0, "y": 0},
///       "data": { "label": "Employee created", "triggerType": "EMPLOYEE_CREATED" } },
///     { "id": "a", "type": "action", "position": {"x": 0, "y": 120},
///       "data": { "label": "Welcome mail", "type": "SEND_EMAIL",
///                 "config": { "template": "welcome" } } }
///   ],
///   "edges": [ { "id": "e1", "source": "t", "target": "a" } ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub is_active: bool,

    pub trigger_type: TriggerType,

    #[serde(default, deserialize_with = "null_as_default")]
    pub trigger_config: RawTriggerConfig,

    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,

    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Kind of a node on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Trigger,
    Action,
}

/// Canvas coordinates. Not interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A node in the workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Unique within the owning workflow
    pub id: String,

    #[serde(rename = "type")]
    pub kind: NodeKind,

    #[serde(default)]
    pub position: Position,

    #[serde(default, deserialize_with = "null_as_default")]
    pub data: NodeData,
}

/// Node payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default)]
    pub label: String,

    /// Action type identifier (e.g. `SEND_EMAIL`) for action nodes
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,

    /// Trigger type for trigger nodes
    #[serde(
        rename = "triggerType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub trigger_type: Option<TriggerType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Node-specific configuration; `null` reads as empty
    #[serde(default, deserialize_with = "null_as_default")]
    pub config: Map<String, Value>,

    /// UI-only fields (icon, color, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Directed connection between two nodes. Defines execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEdge {
    #[serde(default)]
    pub id: String,

    pub source: String,

    pub target: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The builder writes `null` for configs it never filled in.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl WorkflowEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("{}-{}", source, target),
            source,
            target,
            extra: Map::new(),
        }
    }
}

impl WorkflowNode {
    /// Create a trigger node.
    pub fn trigger(id: impl Into<String>, trigger_type: TriggerType) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Trigger,
            position: Position::default(),
            data: NodeData {
                label: trigger_type.label().to_string(),
                trigger_type: Some(trigger_type),
                ..NodeData::default()
            },
        }
    }

    /// Create an action node with an empty configuration.
    pub fn action(
        id: impl Into<String>,
        action_type: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Action,
            position: Position::default(),
            data: NodeData {
                label: label.into(),
                action_type: Some(action_type.into()),
                ..NodeData::default()
            },
        }
    }

    /// Set a configuration value.
    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.config.insert(key.into(), value);
        self
    }

    pub fn is_action(&self) -> bool {
        self.kind == NodeKind::Action
    }

    pub fn is_trigger(&self) -> bool {
        self.kind == NodeKind::Trigger
    }

    /// An action counts as configured once its config object has any key.
    pub fn is_configured(&self) -> bool {
        !self.data.config.is_empty()
    }

    /// Label for messages; blank labels render as "unnamed".
    pub fn display_label(&self) -> &str {
        let label = self.data.label.trim();
        if label.is_empty() {
            "unnamed"
        } else {
            label
        }
    }
}

impl WorkflowDefinition {
    /// Create an empty, inactive workflow.
    pub fn new(id: impl Into<String>, name: impl Into<String>, trigger_type: TriggerType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            is_active: false,
            trigger_type,
            trigger_config: RawTriggerConfig::default(),
            nodes: Vec::new(),
            edges: Vec::new(),
            updated_at: None,
        }
    }

    /// Get a node by ID.
    pub fn get_node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The trigger node, if the canvas has one.
    pub fn trigger_node(&self) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.is_trigger())
    }

    pub fn action_nodes(&self) -> impl Iterator<Item = &WorkflowNode> {
        self.nodes.iter().filter(|n| n.is_action())
    }

    /// Immediate successors of a node, in edge order.
    pub fn next_nodes(&self, id: &str) -> Vec<&WorkflowNode> {
        self.edges
            .iter()
            .filter(|e| e.source == id)
            .filter_map(|e| self.get_node(&e.target))
            .collect()
    }

    /// Node IDs in breadth-first order from the trigger node.
    ///
    /// Each node appears once. Nodes unreachable from the trigger are
    /// omitted; an empty list means there is no trigger node.
    pub fn execution_order(&self) -> Vec<&str> {
        let Some(start) = self.trigger_node() else {
            return Vec::new();
        };

        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(node) = queue.pop_front() {
            if !visited.insert(node.id.as_str()) {
                continue;
            }
            order.push(node.id.as_str());
            queue.extend(self.next_nodes(&node.id));
        }

        order
    }

    /// Compile the workflow's trigger configuration.
    ///
    /// The trigger node's config is used when it is non-empty; otherwise
    /// the workflow-level `trigger_config`.
    pub fn compile_trigger(&self) -> Result<TriggerConfig> {
        if let Some(node) = self.trigger_node() {
            if let Some(node_type) = node.data.trigger_type {
                if node_type != self.trigger_type {
                    return Err(crate::Error::Validation(format!(
                        "Trigger node '{}' is {} but workflow trigger is {}",
                        node.id, node_type, self.trigger_type
                    )));
                }
            }
            if node.is_configured() {
                return TriggerConfig::from_value(
                    self.trigger_type,
                    &Value::Object(node.data.config.clone()),
                );
            }
        }

        TriggerConfig::compile(self.trigger_type, &self.trigger_config)
    }

    /// Local preview of whether `event` would start this workflow.
    ///
    /// Inactive workflows never match. The execution engine's decision is
    /// authoritative; this is an approximation for builder feedback.
    pub fn matches(&self, trigger_type: TriggerType, event: &EventContext) -> Result<bool> {
        if !self.is_active {
            return Ok(false);
        }
        let config = self.compile_trigger()?;
        Ok(triggers::matches(trigger_type, &config, event))
    }

    /// Distinct action type identifiers used by this workflow.
    pub fn action_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self
            .action_nodes()
            .filter_map(|n| n.data.action_type.as_deref())
            .collect();
        types.sort();
        types.dedup();
        types
    }
}
