use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::error::ExtractionError;
use crate::services::prompts::Prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Text,
}

impl FieldKind {
    fn json_type(&self) -> &'static str {
        match self {
            FieldKind::Number => "number",
            FieldKind::Text => "string",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
    /// Text must contain something other than whitespace.
    pub non_empty: bool,
}

/// The forced output shape of a completion, sent as a single function tool.
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl OutputSchema {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            fields: Vec::new(),
        }
    }

    pub fn number(mut self, name: &'static str, description: &'static str) -> Self {
        self.fields.push(FieldSpec {
            name,
            kind: FieldKind::Number,
            description,
            non_empty: false,
        });
        self
    }

    pub fn text(mut self, name: &'static str, description: &'static str) -> Self {
        self.fields.push(FieldSpec {
            name,
            kind: FieldKind::Text,
            description,
            non_empty: false,
        });
        self
    }

    pub fn non_empty_text(mut self, name: &'static str, description: &'static str) -> Self {
        self.fields.push(FieldSpec {
            name,
            kind: FieldKind::Text,
            description,
            non_empty: true,
        });
        self
    }

    /// JSON-schema `parameters` object for the tool definition.
    pub fn parameters(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            properties.insert(
                field.name.to_string(),
                json!({
                    "type": field.kind.json_type(),
                    "description": field.description,
                }),
            );
        }
        // Every field is required.
        let required: Vec<&str> = self.fields.iter().map(|f| f.name).collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    fn tool(&self) -> Tool {
        Tool {
            tool_type: "function".to_string(),
            function: FunctionDef {
                name: self.name.to_string(),
                description: self.description.to_string(),
                parameters: self.parameters(),
            },
        }
    }

    fn tool_choice(&self) -> Value {
        json!({ "type": "function", "function": { "name": self.name } })
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "type")]
    tool_type: String,
    function: FunctionDef,
}

#[derive(Debug, Serialize)]
struct FunctionDef {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    tools: Vec<Tool>,
    tool_choice: Value,
}

/// An endpoint answer as received, before any structured payload is extracted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCompletion {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub id: Option<String>,
    /// Absent on some malformed gateway answers; such calls are skipped.
    #[serde(default)]
    pub function: Option<FunctionCall>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Usually a JSON-encoded string; some gateways inline the object.
    #[serde(default)]
    pub arguments: Value,
}

#[cfg(test)]
impl RawCompletion {
    /// Completion carrying one tool call, as an endpoint would send it.
    pub fn with_tool_call(name: &str, arguments: Value) -> Self {
        RawCompletion {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: None,
                    tool_calls: Some(vec![ToolCall {
                        id: Some("call_0".to_string()),
                        function: Some(FunctionCall {
                            name: name.to_string(),
                            arguments: Value::String(arguments.to_string()),
                        }),
                    }]),
                },
            }],
        }
    }
}

/// Sends one system/user pair to a chat-completion endpoint with the output forced to `schema`.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &Prompt,
        schema: &OutputSchema,
    ) -> Result<RawCompletion, ExtractionError>;
}

fn transport_error(e: reqwest::Error) -> ExtractionError {
    if e.is_timeout() {
        ExtractionError::Transport("completion request timed out".to_string())
    } else {
        ExtractionError::Transport(e.to_string())
    }
}

fn preview(body: &str) -> String {
    body.chars().take(500).collect()
}

/// Maps a non-2xx endpoint status to the error taxonomy.
pub fn error_for_status(status: u16, body: String) -> ExtractionError {
    match status {
        429 => ExtractionError::RateLimited,
        402 => ExtractionError::QuotaExceeded,
        _ => ExtractionError::Upstream { status, body },
    }
}

/// OpenAI-compatible chat completion gateway.
pub struct GatewayClient {
    api_key: Option<String>,
    model: String,
    url: String,
    client: reqwest::Client,
}

impl GatewayClient {
    pub fn new(
        api_key: Option<String>,
        model: String,
        url: String,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
            url,
            client: builder.build()?,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl CompletionClient for GatewayClient {
    async fn complete(
        &self,
        prompt: &Prompt,
        schema: &OutputSchema,
    ) -> Result<RawCompletion, ExtractionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ExtractionError::Configuration("AI_GATEWAY_API_KEY".to_string()))?;

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                },
            ],
            tools: vec![schema.tool()],
            tool_choice: schema.tool_choice(),
        };

        log::info!(
            "🤖 Sending completion request (model: {}, tool: {})",
            self.model,
            schema.name
        );
        log::debug!("📤 User prompt size: {} bytes", prompt.user.len());

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                log::error!("❌ Completion request failed: {}", e);
                transport_error(e)
            })?;

        let status = response.status();
        log::debug!("📥 Completion response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| {
                log::error!("❌ Completion body could not be read: {}", e);
                transport_error(e)
            })?;

        if !status.is_success() {
            let err = error_for_status(status.as_u16(), body);
            match &err {
                ExtractionError::Upstream { status, body } => {
                    log::error!(
                        "❌ AI gateway error ({}): {}",
                        status,
                        preview(body)
                    );
                }
                other => log::warn!("⚠️ AI gateway refused request: {}", other),
            }
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!(
                "❌ Completion body is not a chat response: {} - {}",
                e,
                preview(&body)
            );
            ExtractionError::MalformedPayload(format!("unreadable completion body: {}", e))
        })
    }
}
