//! Trigger dispatch client.
//!
//! Forwards `(trigger type, event context)` pairs to the external execution
//! engine and reports how many workflows it started. Filter evaluation
//! happens on the engine side; this client only relays.
//!
//! `dispatch` and `dispatch_batch` never fail: transport and engine errors
//! are carried in the returned [`DispatchReport`] so the code path that
//! raised the event is never blocked by automation problems.

mod http;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::triggers::{EventContext, TriggerType};

pub use http::HttpExecutionEngine;

/// Body POSTed to the execution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRequest {
    pub trigger_type: TriggerType,
    pub context: EventContext,
}

/// Body returned by the execution engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub triggered_workflows: u64,

    #[serde(default)]
    pub workflows: Vec<WorkflowRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EngineResponse {
    pub fn triggered(workflows: Vec<WorkflowRef>) -> Self {
        Self {
            success: true,
            triggered_workflows: workflows.len() as u64,
            workflows,
            error: None,
        }
    }
}

/// A workflow started by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRef {
    pub id: String,
    pub name: String,
}

/// Successful dispatch outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Triggered {
    pub count: u64,
    pub workflows: Vec<WorkflowRef>,
}

/// Why a dispatch did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("engine returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("engine reported failure: {0}")]
    Rejected(String),

    #[error("invalid engine response: {0}")]
    InvalidResponse(String),
}

/// Per-trigger dispatch result.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub trigger_type: TriggerType,
    pub outcome: Result<Triggered, DispatchError>,
}

impl DispatchReport {
    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Number of workflows started; zero on failure.
    pub fn triggered_count(&self) -> u64 {
        self.outcome.as_ref().map(|t| t.count).unwrap_or(0)
    }

    pub fn workflows(&self) -> &[WorkflowRef] {
        match &self.outcome {
            Ok(t) => &t.workflows,
            Err(_) => &[],
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.outcome.as_ref().err().map(|e| e.to_string())
    }

    /// `{success, trigger_type, triggered_workflows, workflows, error?}`
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::json!({
            "success": self.success(),
            "trigger_type": self.trigger_type,
            "triggered_workflows": self.triggered_count(),
            "workflows": self.workflows(),
        });
        if let Some(error) = self.error_message() {
            value["error"] = serde_json::Value::String(error);
        }
        value
    }
}

/// One entry of a batch file: `{"type": "...", "context": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchItem {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,

    #[serde(default)]
    pub context: EventContext,
}

/// Transport to the execution engine.
#[async_trait]
pub trait ExecutionEngine: Send + Sync + 'static {
    /// Send one trigger. A response with `success: false` is returned as-is.
    async fn trigger(&self, request: &TriggerRequest) -> Result<EngineResponse, DispatchError>;
}

/// Client used by event producers to fire workflow triggers.
#[derive(Clone)]
pub struct DispatchClient {
    engine: Arc<dyn ExecutionEngine>,
}

impl DispatchClient {
    pub fn new(engine: impl ExecutionEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Client backed by the HTTP engine described in `config`.
    pub fn from_config(config: &EngineConfig) -> crate::Result<Self> {
        Ok(Self::new(HttpExecutionEngine::from_config(config)?))
    }

    /// Dispatch a single trigger. Never fails; see [`DispatchReport`].
    pub async fn dispatch(&self, trigger_type: TriggerType, context: EventContext) -> DispatchReport {
        let outcome = self.send(trigger_type, context).await;
        match &outcome {
            Ok(triggered) => info!(
                "Dispatched {}: {} workflow(s) triggered",
                trigger_type, triggered.count
            ),
            Err(e) => warn!("Dispatch of {} failed: {}", trigger_type, e),
        }
        DispatchReport {
            trigger_type,
            outcome,
        }
    }

    /// Dispatch several triggers concurrently.
    ///
    /// Each call is independent; a failure is recorded in its own report and
    /// does not cancel the others. Reports are returned in input order.
    pub async fn dispatch_batch(
        &self,
        items: impl IntoIterator<Item = (TriggerType, EventContext)>,
    ) -> Vec<DispatchReport> {
        let reports = join_all(
            items
                .into_iter()
                .map(|(trigger_type, context)| self.dispatch(trigger_type, context)),
        )
        .await;

        let failed = reports.iter().filter(|r| !r.success()).count();
        info!(
            "Batch dispatch finished: {} succeeded, {} failed",
            reports.len() - failed,
            failed
        );
        reports
    }

    /// Dispatch and surface failures as errors.
    pub async fn dispatch_strict(
        &self,
        trigger_type: TriggerType,
        context: EventContext,
    ) -> crate::Result<Triggered> {
        Ok(self.send(trigger_type, context).await?)
    }

    async fn send(
        &self,
        trigger_type: TriggerType,
        context: EventContext,
    ) -> Result<Triggered, DispatchError> {
        if trigger_type.is_deprecated() {
            debug!("Dispatching deprecated trigger type {}", trigger_type);
        }
        let request = TriggerRequest {
            trigger_type,
            context,
        };
        let response = self.engine.trigger(&request).await?;
        if !response.success {
            return Err(DispatchError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| "no error message".to_string()),
            ));
        }
        Ok(Triggered {
            count: response.triggered_workflows,
            workflows: response.workflows,
        })
    }
}
