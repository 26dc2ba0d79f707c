//! HTTP-backed [`EmbeddingProvider`], calling a configurable embeddings
//! endpoint over `reqwest`. Embedding is an enhancement: callers are
//! expected to tolerate and log failures rather than let them block writes.

use async_trait::async_trait;
use dementia_domain::error::{Error, Result};
use dementia_domain::ports::embedding::EmbeddingProvider;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: EmbeddingInput<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum EmbeddingInput<'a> {
    Single(&'a str),
    Batch(&'a [String]),
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Calls an OpenAI-compatible `/embeddings` endpoint.
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpEmbeddingProvider {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_key,
        }
    }

    async fn request(&self, input: EmbeddingInput<'_>) -> Result<Vec<EmbeddingData>> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&EmbeddingRequest { input });

        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|err| Error::internal(format!("embedding request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::internal(format!("embedding endpoint returned {status}: {body}")));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| Error::internal(format!("invalid embedding response: {err}")))?;

        Ok(parsed.data)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let data = self.request(EmbeddingInput::Single(text)).await?;
        data.into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::internal("embedding endpoint returned no vectors"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut data = self.request(EmbeddingInput::Batch(texts)).await?;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_request_serializes_as_array() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let request = EmbeddingRequest {
            input: EmbeddingInput::Batch(&texts),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn single_request_serializes_as_string() {
        let request = EmbeddingRequest {
            input: EmbeddingInput::Single("hello"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input"], serde_json::json!("hello"));
    }
}
