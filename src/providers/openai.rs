use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::providers::http::{message_short, HttpConfig};
use crate::providers::{ModelProvider, OutputSchema, TextRequest};
use crate::types::Message;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const CHAT_MODEL: &str = "gpt-4.1-mini";

#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    http: HttpConfig,
}

impl OpenAiProvider {
    pub fn new(base_url: String, api_key: String, http: HttpConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(http.connect_timeout())
            .timeout(http.request_timeout())
            .build()
            .context("failed to build OpenAI HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http,
        })
    }

    async fn chat_completion(&self, payload: &ChatRequest<'_>) -> anyhow::Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .context("failed to call OpenAI endpoint")?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(anyhow!(
                "OpenAI endpoint returned HTTP {}: {}",
                status.as_u16(),
                message_short(&body, self.http.max_error_body_chars)
            ));
        }
        let resp: ChatResponse = response
            .json()
            .await
            .context("failed to parse OpenAI JSON response")?;
        let first = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("missing choices[0] in OpenAI response"))?;
        first
            .message
            .content
            .ok_or_else(|| anyhow!("OpenAI reply carried no content"))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'a str,
    json_schema: JsonSchemaSpec<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaSpec<'a> {
    name: &'a str,
    schema: &'a Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: ChatMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    async fn generate_text(&self, req: &TextRequest) -> anyhow::Result<String> {
        let payload = ChatRequest {
            model: &req.model,
            messages: &req.messages,
            response_format: None,
        };
        let content = self.chat_completion(&payload).await?;
        Ok(content.trim().to_string())
    }

    async fn generate_structured(
        &self,
        req: &TextRequest,
        schema: &OutputSchema,
    ) -> anyhow::Result<Value> {
        let payload = ChatRequest {
            model: &req.model,
            messages: &req.messages,
            response_format: Some(ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaSpec {
                    name: schema.name,
                    schema: &schema.schema,
                    strict: true,
                },
            }),
        };
        let content = self.chat_completion(&payload).await?;
        serde_json::from_str(&content).with_context(|| {
            format!(
                "structured reply for schema '{}' was not valid JSON",
                schema.name
            )
        })
    }
}
