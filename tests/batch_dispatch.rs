//! Batch dispatch through the public API with an in-memory engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hrflow::dispatch::{
    DispatchClient, DispatchError, EngineResponse, ExecutionEngine, TriggerRequest, WorkflowRef,
};
use hrflow::triggers::{EventContext, TriggerType};

/// Fails every request for one user; slow for everyone else.
struct FlakyEngine {
    failing_user: &'static str,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ExecutionEngine for FlakyEngine {
    async fn trigger(&self, request: &TriggerRequest) -> Result<EngineResponse, DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.context.user_id.as_deref() == Some(self.failing_user) {
            return Err(DispatchError::Transport("connection refused".to_string()));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        let workflows = (0..request.context.level.unwrap_or(1))
            .map(|i| WorkflowRef {
                id: format!("{}-{}", request.trigger_type, i),
                name: format!("Workflow {}", i),
            })
            .collect();
        Ok(EngineResponse::triggered(workflows))
    }
}

#[tokio::test]
async fn test_one_failure_does_not_affect_siblings() {
    let calls = Arc::new(AtomicUsize::new(0));
    let client = DispatchClient::new(FlakyEngine {
        failing_user: "broken",
        calls: calls.clone(),
    });

    let reports = client
        .dispatch_batch(vec![
            (
                TriggerType::LevelUp,
                EventContext::for_user("u1").with_level(2),
            ),
            (TriggerType::LevelUp, EventContext::for_user("broken")),
            (
                TriggerType::LevelUp,
                EventContext::for_user("u3").with_level(3),
            ),
        ])
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(reports.len(), 3);

    assert!(reports[0].success());
    assert_eq!(reports[0].triggered_count(), 2);

    assert!(!reports[1].success());
    let error = reports[1].error_message().unwrap();
    assert!(!error.is_empty());
    assert_eq!(reports[1].to_json()["success"], false);

    assert!(reports[2].success());
    assert_eq!(reports[2].triggered_count(), 3);
}

#[tokio::test]
async fn test_batch_runs_concurrently() {
    let client = DispatchClient::new(FlakyEngine {
        failing_user: "nobody",
        calls: Arc::new(AtomicUsize::new(0)),
    });

    let items: Vec<_> = (0..20)
        .map(|i| {
            (
                TriggerType::TaskCompleted,
                EventContext::for_user(format!("u{}", i)),
            )
        })
        .collect();

    let started = tokio::time::Instant::now();
    let reports = client.dispatch_batch(items).await;
    assert!(reports.iter().all(|r| r.success()));
    assert!(started.elapsed() < Duration::from_millis(20 * 50));
}

#[tokio::test]
async fn test_empty_batch() {
    let client = DispatchClient::new(FlakyEngine {
        failing_user: "nobody",
        calls: Arc::new(AtomicUsize::new(0)),
    });
    assert!(client.dispatch_batch(Vec::new()).await.is_empty());
}
