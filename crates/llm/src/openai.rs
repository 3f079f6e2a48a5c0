use async_trait::async_trait;
use medcoord_common::{MedcoordError, Result, ToolDescriptor, ToolInvocation};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::client::{LlmClient, LlmRequest, LlmResponse, Role, TokenUsage};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OpenAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    tool_calls: Vec<OpenAiToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// Compatible servers send `"tool_calls": null` on plain-text turns.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<OpenAiToolCall>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<OpenAiToolCall>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: OpenAiFunctionCall,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OpenAiFunctionCall {
    name: String,
    /// JSON-encoded argument object
    arguments: String,
}

#[derive(Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OpenAiFunction,
}

#[derive(Serialize)]
struct OpenAiFunction {
    name: &'static str,
    description: &'static str,
    parameters: serde_json::Value,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    model: String,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

fn function_type() -> String {
    "function".to_string()
}

/// Client for OpenAI-compatible chat completion endpoints with function
/// calling (OpenAI, Ollama, vLLM, ...).
pub struct OpenAiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(base_url: Option<String>, model: String, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model,
            api_key,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    fn role_to_string(role: &Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    fn build_messages(request: &LlmRequest) -> Vec<OpenAiMessage> {
        let mut messages = Vec::new();
        if let Some(ref system) = request.system_prompt {
            messages.push(OpenAiMessage {
                role: "system".to_string(),
                content: Some(system.clone()),
                tool_calls: Vec::new(),
                tool_call_id: None,
            });
        }
        for msg in &request.messages {
            let tool_calls: Vec<OpenAiToolCall> = msg
                .tool_calls
                .iter()
                .map(|call| OpenAiToolCall {
                    id: call.id.clone(),
                    call_type: function_type(),
                    function: OpenAiFunctionCall {
                        name: call.name.clone(),
                        arguments: serde_json::Value::Object(call.arguments.clone()).to_string(),
                    },
                })
                .collect();
            // Assistant tool-call messages carry null content.
            let content = if msg.content.is_empty() && !tool_calls.is_empty() {
                None
            } else {
                Some(msg.content.clone())
            };
            messages.push(OpenAiMessage {
                role: Self::role_to_string(&msg.role).to_string(),
                content,
                tool_calls,
                tool_call_id: msg.tool_call_id.clone(),
            });
        }
        messages
    }

    fn build_tools(tools: &[ToolDescriptor]) -> Vec<OpenAiTool> {
        tools
            .iter()
            .map(|tool| OpenAiTool {
                tool_type: "function",
                function: OpenAiFunction {
                    name: tool.name,
                    description: tool.description,
                    parameters: tool.parameters_schema(),
                },
            })
            .collect()
    }

    fn build_request_body(&self, request: &LlmRequest) -> OpenAiRequest {
        OpenAiRequest {
            model: self.model.clone(),
            messages: Self::build_messages(request),
            tools: Self::build_tools(&request.tools),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn parse_tool_calls(calls: Vec<OpenAiToolCall>) -> Vec<ToolInvocation> {
        calls
            .into_iter()
            .map(|call| {
                let arguments = match serde_json::from_str(&call.function.arguments) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(
                            tool = %call.function.name,
                            error = %e,
                            "Tool arguments are not valid JSON, passing none"
                        );
                        serde_json::Value::Null
                    }
                };
                ToolInvocation::new(call.id, call.function.name, arguments)
            })
            .collect()
    }

    fn into_llm_response(oai_response: OpenAiResponse) -> Result<LlmResponse> {
        let choice = oai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| MedcoordError::Llm("No choices in OpenAI response".to_string()))?;

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls: Self::parse_tool_calls(choice.message.tool_calls),
            model: oai_response.model,
            usage: oai_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let body = self.build_request_body(&request);

        let mut http_req = self.http_client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            http_req = http_req.bearer_auth(key);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| MedcoordError::Llm(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(MedcoordError::Llm(format!(
                "OpenAI API error {status}: {body_text}"
            )));
        }

        let oai_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| MedcoordError::Llm(format!("Failed to parse OpenAI response: {e}")))?;

        Self::into_llm_response(oai_response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatMessage;
    use medcoord_common::{ParamKind, ParamSpec};
    use serde_json::json;

    fn scheduler_tool() -> ToolDescriptor {
        ToolDescriptor {
            name: "appointmentScheduler",
            description: "Jadwal",
            params: vec![ParamSpec {
                name: "patient_id",
                kind: ParamKind::String,
                description: "ID Pasien.",
                required: true,
            }],
        }
    }

    #[test]
    fn request_body_includes_tools() {
        let client = OpenAiClient::new(None, "gpt-4o-mini".to_string(), Some("sk-test".to_string()));
        let request = LlmRequest {
            system_prompt: Some("Koordinator".to_string()),
            messages: vec![ChatMessage::user("Jadwalkan P12345")],
            tools: vec![scheduler_tool()],
            temperature: Some(0.2),
            max_tokens: Some(512),
        };

        let json = serde_json::to_value(client.build_request_body(&request)).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 512);
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "Jadwalkan P12345");

        let tools = json["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["type"], "function");
        assert_eq!(tools[0]["function"]["name"], "appointmentScheduler");
        assert_eq!(
            tools[0]["function"]["parameters"]["required"],
            json!(["patient_id"])
        );
    }

    #[test]
    fn request_body_omits_tools_and_options_when_absent() {
        let client = OpenAiClient::new(None, "gpt-4o-mini".to_string(), None);
        let request = LlmRequest {
            messages: vec![ChatMessage::user("Halo")],
            ..Default::default()
        };

        let json = serde_json::to_value(client.build_request_body(&request)).unwrap();
        assert!(json.get("tools").is_none());
        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn tool_exchange_serializes_openai_shape() {
        let call = ToolInvocation::new("call_1", "appointmentScheduler", json!({"patient_id": "P12345"}));
        let request = LlmRequest {
            messages: vec![
                ChatMessage::user("Jadwalkan"),
                ChatMessage::assistant_tool_call(call.clone()),
                ChatMessage::tool_result(&call, "Janji temu berhasil"),
            ],
            ..Default::default()
        };

        let messages = OpenAiClient::build_messages(&request);
        let json = serde_json::to_value(&messages).unwrap();

        assert!(json[1]["content"].is_null());
        assert_eq!(json[1]["tool_calls"][0]["id"], "call_1");
        assert_eq!(json[1]["tool_calls"][0]["type"], "function");
        let args: serde_json::Value =
            serde_json::from_str(json[1]["tool_calls"][0]["function"]["arguments"].as_str().unwrap())
                .unwrap();
        assert_eq!(args["patient_id"], "P12345");

        assert_eq!(json[2]["role"], "tool");
        assert_eq!(json[2]["tool_call_id"], "call_1");
        assert_eq!(json[2]["content"], "Janji temu berhasil");
    }

    #[test]
    fn parses_tool_call_response() {
        let raw = json!({
            "model": "gpt-4o-mini",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "appointmentScheduler",
                            "arguments": "{\"action\":\"schedule\",\"patient_id\":\"P12345\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 100, "completion_tokens": 20}
        });

        let parsed: OpenAiResponse = serde_json::from_value(raw).unwrap();
        let response = OpenAiClient::into_llm_response(parsed).unwrap();

        assert!(response.content.is_empty());
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "call_abc");
        assert_eq!(response.tool_calls[0].str_arg("patient_id"), "P12345");
        assert_eq!(response.usage.unwrap().prompt_tokens, 100);
    }

    #[test]
    fn parses_text_response_with_null_tool_calls() {
        let raw = json!({
            "model": "mistral-small",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Mohon sebutkan ID pasien.",
                    "tool_calls": null
                },
                "finish_reason": "stop"
            }]
        });

        let parsed: OpenAiResponse = serde_json::from_value(raw).unwrap();
        let response = OpenAiClient::into_llm_response(parsed).unwrap();

        assert_eq!(response.content, "Mohon sebutkan ID pasien.");
        assert!(response.tool_calls.is_empty());
        assert_eq!(response.model, "mistral-small");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn parses_text_response_without_tool_calls_field() {
        let raw = json!({
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": "Halo"}}]
        });
        let parsed: OpenAiResponse = serde_json::from_value(raw).unwrap();
        let response = OpenAiClient::into_llm_response(parsed).unwrap();
        assert_eq!(response.content, "Halo");
        assert!(response.tool_calls.is_empty());
    }

    #[test]
    fn malformed_arguments_become_empty() {
        let calls = OpenAiClient::parse_tool_calls(vec![OpenAiToolCall {
            id: "c".to_string(),
            call_type: function_type(),
            function: OpenAiFunctionCall {
                name: "technicalSupport".to_string(),
                arguments: "{not json".to_string(),
            },
        }]);
        assert_eq!(calls.len(), 1);
        assert!(calls[0].arguments.is_empty());
    }

    #[test]
    fn empty_choices_is_an_error() {
        let parsed: OpenAiResponse =
            serde_json::from_value(json!({"model": "m", "choices": []})).unwrap();
        assert!(OpenAiClient::into_llm_response(parsed).is_err());
    }

    #[test]
    fn default_base_url_is_openai() {
        let client = OpenAiClient::new(None, "gpt-4o-mini".to_string(), None);
        assert_eq!(client.base_url, "https://api.openai.com");
    }
}
