pub mod http;
pub mod openai;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::Message;

#[derive(Debug, Clone)]
pub struct TextRequest {
    pub model: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub name: &'static str,
    pub schema: Value,
}

#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn generate_text(&self, req: &TextRequest) -> anyhow::Result<String>;

    async fn generate_structured(
        &self,
        req: &TextRequest,
        schema: &OutputSchema,
    ) -> anyhow::Result<Value>;
}

pub async fn generate_typed<T: DeserializeOwned>(
    provider: &dyn ModelProvider,
    req: &TextRequest,
    schema: &OutputSchema,
) -> anyhow::Result<T> {
    let value = provider.generate_structured(req, schema).await?;
    serde_json::from_value(value)
        .map_err(|e| anyhow::anyhow!("structured reply did not match schema '{}': {e}", schema.name))
}
