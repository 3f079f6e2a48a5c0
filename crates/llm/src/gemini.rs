//! Google Gemini `generateContent` client with function calling.

use async_trait::async_trait;
use medcoord_common::{MedcoordError, Result, ToolDescriptor, ToolInvocation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::client::{LlmClient, LlmRequest, LlmResponse, Role, TokenUsage};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTools>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<GeminiFunctionResponse>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct GeminiFunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct GeminiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTools {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Serialize)]
struct FunctionDeclaration {
    name: &'static str,
    description: &'static str,
    parameters: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    model_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(base_url: Option<String>, model: String, api_key: String) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| GEMINI_API_URL.to_string()),
            model,
            api_key,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    fn text_part(text: impl Into<String>) -> GeminiPart {
        GeminiPart {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    fn build_contents(request: &LlmRequest) -> Vec<GeminiContent> {
        request
            .messages
            .iter()
            .map(|msg| match msg.role {
                // Gemini has no system role inside contents.
                Role::System | Role::User => GeminiContent {
                    role: Some("user".to_string()),
                    parts: vec![Self::text_part(msg.content.clone())],
                },
                Role::Assistant => {
                    let mut parts = Vec::new();
                    if !msg.content.is_empty() {
                        parts.push(Self::text_part(msg.content.clone()));
                    }
                    for call in &msg.tool_calls {
                        parts.push(GeminiPart {
                            function_call: Some(GeminiFunctionCall {
                                id: None,
                                name: call.name.clone(),
                                args: Value::Object(call.arguments.clone()),
                            }),
                            ..Default::default()
                        });
                    }
                    GeminiContent {
                        role: Some("model".to_string()),
                        parts,
                    }
                }
                Role::Tool => GeminiContent {
                    role: Some("user".to_string()),
                    parts: vec![GeminiPart {
                        function_response: Some(GeminiFunctionResponse {
                            name: msg.name.clone().unwrap_or_default(),
                            response: json!({ "result": msg.content }),
                        }),
                        ..Default::default()
                    }],
                },
            })
            .collect()
    }

    /// Gemini's OpenAPI subset uses upper-case type names.
    fn declaration_schema(tool: &ToolDescriptor) -> Value {
        let mut properties = Map::new();
        for param in &tool.params {
            properties.insert(
                param.name.to_string(),
                json!({
                    "type": param.kind.json_type().to_uppercase(),
                    "description": param.description,
                }),
            );
        }
        let required: Vec<&str> = tool
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();
        json!({
            "type": "OBJECT",
            "properties": properties,
            "required": required,
        })
    }

    fn build_request_body(request: &LlmRequest) -> GeminiRequest {
        let tools = if request.tools.is_empty() {
            Vec::new()
        } else {
            vec![GeminiTools {
                function_declarations: request
                    .tools
                    .iter()
                    .map(|tool| FunctionDeclaration {
                        name: tool.name,
                        description: tool.description,
                        parameters: Self::declaration_schema(tool),
                    })
                    .collect(),
            }]
        };

        let generation_config = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            })
        } else {
            None
        };

        GeminiRequest {
            contents: Self::build_contents(request),
            system_instruction: request.system_prompt.as_ref().map(|s| GeminiContent {
                role: None,
                parts: vec![Self::text_part(s.clone())],
            }),
            tools,
            generation_config,
        }
    }

    /// A response without candidates (e.g. blocked) becomes an empty reply.
    /// Function calls are only taken when the first part is not text.
    fn into_llm_response(&self, response: GeminiResponse) -> LlmResponse {
        let mut content = String::new();
        let mut tool_calls = Vec::new();
        let mut finish_reason = None;

        if let Some(candidate) = response.candidates.into_iter().next() {
            finish_reason = candidate.finish_reason;
            // A leading text part makes the whole candidate a plain reply.
            let text_first = candidate
                .content
                .parts
                .first()
                .and_then(|part| part.text.as_deref())
                .is_some_and(|text| !text.is_empty());
            for part in candidate.content.parts {
                if let Some(text) = part.text {
                    content.push_str(&text);
                }
                if text_first {
                    continue;
                }
                if let Some(call) = part.function_call {
                    let id = call
                        .id
                        .unwrap_or_else(|| format!("call_{}", tool_calls.len()));
                    tool_calls.push(ToolInvocation::new(id, call.name, call.args));
                }
            }
        }

        LlmResponse {
            content,
            tool_calls,
            model: response.model_version.unwrap_or_else(|| self.model.clone()),
            usage: response.usage_metadata.map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
            }),
            finish_reason,
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let body = Self::build_request_body(&request);

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MedcoordError::Llm(format!("Gemini request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(MedcoordError::Llm(format!(
                "Gemini API error {status}: {body_text}"
            )));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| MedcoordError::Llm(format!("Failed to parse Gemini response: {e}")))?;

        Ok(self.into_llm_response(gemini_response))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
