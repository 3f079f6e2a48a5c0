//! Two-phase conversation mediator.
//!
//! ```text
//! AwaitingDecision ──text──────────────────────────────▶ Done
//!        │
//!        └─one tool call─▶ handler ─▶ AwaitingConfirmation ─▶ Done
//! ```
//!
//! The decision call carries the tool catalog. The confirmation call
//! replays the tool call and its result without the catalog and asks the
//! model for a natural-language reply.

use std::sync::Arc;

use medcoord_agents::{HospitalDb, NewRecord, ToolOutcome, execute_invocation, tool_catalog};
use medcoord_common::{AgentKind, MedcoordError, Result, ToolInvocation};
use medcoord_llm::{ChatMessage, LlmClient, LlmRequest, LlmResponse};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::prompt::SYSTEM_INSTRUCTION;

/// Reply when the decision call returned neither text nor a tool call.
pub const EMPTY_DECISION_REPLY: &str = "Maaf, terjadi kesalahan sistem.";
/// Reply when the confirmation call returned no text.
pub const EMPTY_CONFIRMATION_REPLY: &str = "Proses selesai.";

/// A tool that ran during an exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolRun {
    pub invocation: ToolInvocation,
    pub outcome: ToolOutcome,
}

/// Result of one successful mediator run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exchange {
    pub reply: String,
    pub agent: AgentKind,
    pub tool: Option<ToolRun>,
}

impl Exchange {
    pub fn tool_name(&self) -> Option<&str> {
        self.tool.as_ref().map(|run| run.invocation.name.as_str())
    }

    /// System log line from the handler, empty when no tool ran.
    pub fn log(&self) -> &str {
        self.tool
            .as_ref()
            .map(|run| run.outcome.log.as_str())
            .unwrap_or_default()
    }

    /// Take the record the handler staged, if any.
    pub fn take_record(&mut self) -> Option<NewRecord> {
        self.tool.as_mut().and_then(|run| run.outcome.record.take())
    }
}

enum Phase {
    AwaitingDecision,
    AwaitingConfirmation(ToolRun),
    Done(Exchange),
}

pub struct Mediator {
    client: Arc<dyn LlmClient>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl Mediator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Run one exchange. `history` must end with the new user message.
    ///
    /// Handlers see `db` read-only; any record they create is returned
    /// staged inside the [`Exchange`].
    pub async fn run(&self, history: &[ChatMessage], db: &HospitalDb) -> Result<Exchange> {
        let mut phase = Phase::AwaitingDecision;
        loop {
            phase = match phase {
                Phase::AwaitingDecision => self.decide(history, db).await?,
                Phase::AwaitingConfirmation(run) => self.confirm(history, run).await?,
                Phase::Done(exchange) => return Ok(exchange),
            };
        }
    }

    fn request(&self, messages: Vec<ChatMessage>, with_tools: bool) -> LlmRequest {
        LlmRequest {
            system_prompt: Some(SYSTEM_INSTRUCTION.to_string()),
            messages,
            tools: if with_tools {
                tool_catalog().to_vec()
            } else {
                Vec::new()
            },
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    async fn decide(&self, history: &[ChatMessage], db: &HospitalDb) -> Result<Phase> {
        let response = self
            .client
            .complete(self.request(history.to_vec(), true))
            .await?;

        let LlmResponse {
            content,
            mut tool_calls,
            ..
        } = response;

        if tool_calls.len() > 1 {
            warn!(
                count = tool_calls.len(),
                tools = ?tool_calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                "Model requested more than one tool"
            );
            return Err(MedcoordError::MultipleToolCalls(tool_calls.len()));
        }

        let Some(invocation) = tool_calls.pop() else {
            let reply = if content.trim().is_empty() {
                warn!("Decision response had neither text nor a tool call");
                EMPTY_DECISION_REPLY.to_string()
            } else {
                content
            };
            debug!("Coordinator answered directly");
            return Ok(Phase::Done(Exchange {
                reply,
                agent: AgentKind::Coordinator,
                tool: None,
            }));
        };

        info!(tool = %invocation.name, call_id = %invocation.id, "Delegating to sub-agent");
        let outcome = execute_invocation(&invocation, db);
        Ok(Phase::AwaitingConfirmation(ToolRun {
            invocation,
            outcome,
        }))
    }

    async fn confirm(&self, history: &[ChatMessage], run: ToolRun) -> Result<Phase> {
        let mut messages = history.to_vec();
        messages.push(ChatMessage::assistant_tool_call(run.invocation.clone()));
        messages.push(ChatMessage::tool_result(&run.invocation, &run.outcome.output));

        let response = self.client.complete(self.request(messages, false)).await?;
        if !response.tool_calls.is_empty() {
            debug!(
                count = response.tool_calls.len(),
                "Ignoring tool calls in confirmation response"
            );
        }

        let reply = if response.content.trim().is_empty() {
            EMPTY_CONFIRMATION_REPLY.to_string()
        } else {
            response.content
        };

        Ok(Phase::Done(Exchange {
            reply,
            agent: run.outcome.agent,
            tool: Some(run),
        }))
    }
}
