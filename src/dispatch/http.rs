//! HTTP transport to the execution engine.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{DispatchError, EngineResponse, ExecutionEngine, TriggerRequest};
use crate::config::EngineConfig;

/// Longest error body excerpt kept in a status error.
const MAX_ERROR_BODY: usize = 200;

/// POSTs trigger requests to the engine endpoint with bearer auth.
///
/// Each call has a fixed timeout and is never retried.
pub struct HttpExecutionEngine {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpExecutionEngine {
    pub fn from_config(config: &EngineConfig) -> crate::Result<Self> {
        config.validate()?;
        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            timeout,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> DispatchError {
        if e.is_timeout() {
            DispatchError::Timeout(self.timeout)
        } else {
            DispatchError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl ExecutionEngine for HttpExecutionEngine {
    async fn trigger(&self, request: &TriggerRequest) -> Result<EngineResponse, DispatchError> {
        debug!("POST {} ({})", self.endpoint, request.trigger_type);

        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<EngineResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY).collect());
            return Err(DispatchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| DispatchError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchClient;
    use crate::triggers::{EventContext, TriggerType};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TRIGGER_PATH: &str = "/functions/v1/workflows/trigger";

    fn config(base_url: &str) -> EngineConfig {
        EngineConfig {
            endpoint: format!("{}{}", base_url, TRIGGER_PATH),
            api_key: Some("test-key".to_string()),
            timeout_seconds: 2,
            connect_timeout_seconds: 1,
        }
    }

    #[tokio::test]
    async fn test_posts_request_with_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(TRIGGER_PATH))
            .and(header("authorization", "Bearer test-key"))
            .and(body_json(json!({
                "trigger_type": "EMPLOYEE_CREATED",
                "context": { "user_id": "u1", "department_id": "d1" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "triggered_workflows": 1,
                "workflows": [{ "id": "w1", "name": "Welcome" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = DispatchClient::from_config(&config(&server.uri())).unwrap();
        let report = client
            .dispatch(
                TriggerType::EmployeeCreated,
                EventContext::for_user("u1").with_department("d1"),
            )
            .await;

        assert!(report.success(), "{:?}", report.outcome);
        assert_eq!(report.triggered_count(), 1);
        assert_eq!(report.workflows()[0].name, "Welcome");
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(TRIGGER_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
            .mount(&server)
            .await;

        let client = DispatchClient::from_config(&config(&server.uri())).unwrap();
        let report = client.dispatch(TriggerType::Manual, EventContext::new()).await;
        assert_eq!(
            report.outcome,
            Err(DispatchError::Status {
                status: 500,
                message: "boom".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_invalid_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = DispatchClient::from_config(&config(&server.uri())).unwrap();
        let report = client.dispatch(TriggerType::Manual, EventContext::new()).await;
        assert!(matches!(
            report.outcome,
            Err(DispatchError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_does_not_escape() {
        // Nothing listens on a port released right after binding
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let client = DispatchClient::from_config(&config(&format!("http://{}", addr))).unwrap();

        let report = client.dispatch(TriggerType::Manual, EventContext::new()).await;
        assert!(!report.success());
        assert!(matches!(report.outcome, Err(DispatchError::Transport(_))));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = config(&server.uri());
        config.timeout_seconds = 1;
        let client = DispatchClient::from_config(&config).unwrap();

        let report = client.dispatch(TriggerType::Manual, EventContext::new()).await;
        assert_eq!(
            report.outcome,
            Err(DispatchError::Timeout(Duration::from_secs(1)))
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = config("http://127.0.0.1:9");
        config.timeout_seconds = 0;
        let err = HttpExecutionEngine::from_config(&config).err().unwrap();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
