//! Replays a fixed script of model responses. Used by tests and demos that
//! must not touch the network.

use std::collections::VecDeque;

use async_trait::async_trait;
use medcoord_common::{MedcoordError, Result};
use parking_lot::Mutex;

use crate::client::{LlmClient, LlmRequest, LlmResponse};

pub struct ScriptedClient {
    model: String,
    script: Mutex<VecDeque<Result<LlmResponse>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            model: "scripted".to_string(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response.
    pub fn push(&self, response: LlmResponse) -> &Self {
        self.script.lock().push_back(Ok(response));
        self
    }

    /// Queue a failure, reported as an `Llm` error with this message.
    pub fn push_error(&self, message: impl Into<String>) -> &Self {
        self.script
            .lock()
            .push_back(Err(MedcoordError::Llm(message.into())));
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().push(request);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(MedcoordError::Llm("script exhausted".to_string())))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatMessage;

    #[tokio::test]
    async fn replays_in_order_and_records_requests() {
        let client = ScriptedClient::new();
        client.push(LlmResponse::text("satu")).push_error("boom");

        let first = client
            .complete(LlmRequest {
                messages: vec![ChatMessage::user("a")],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(first.content, "satu");

        let second = client.complete(LlmRequest::default()).await;
        assert!(matches!(second, Err(MedcoordError::Llm(ref m)) if m == "boom"));

        assert_eq!(client.requests().len(), 2);
        assert_eq!(client.requests()[0].messages[0].content, "a");
        assert_eq!(client.remaining(), 0);
    }

    #[tokio::test]
    async fn exhausted_script_errors() {
        let client = ScriptedClient::new();
        assert!(client.complete(LlmRequest::default()).await.is_err());
    }
}
