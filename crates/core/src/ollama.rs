//! Blocking client for a local Ollama server, used both as the embedding
//! service and as the chat language model.

use crate::embeddings::Embedder;
use crate::traits::LanguageModel;
use crate::ServiceError;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::time::Duration;
use tracing::debug;
use url::Url;

const BACKEND: &str = "ollama";

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub temperature: Option<f32>,
    /// `None` lets inference run as long as the model needs.
    pub request_timeout_secs: Option<u64>,
    pub api_key: Option<String>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embedding_model: "all-minilm".to_string(),
            chat_model: "deepseek-r1:1.5b".to_string(),
            temperature: None,
            request_timeout_secs: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: Option<GenerateOptions>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    client: Client,
    api_key: Option<String>,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.request_timeout_secs.map(Duration::from_secs))
            .build()?;

        let api_key = config.api_key.as_ref().and_then(|value| {
            let key = value.trim().to_string();
            if key.is_empty() {
                None
            } else {
                Some(key)
            }
        });

        Ok(Self {
            base_url: normalize_base_url(&config.base_url)?,
            client,
            api_key,
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        Ok(self.base_url.join(path)?)
    }

    fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, ServiceError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let endpoint = self.endpoint(path)?;
        let mut request = self
            .client
            .post(endpoint.clone())
            .header("content-type", "application/json")
            .json(body);

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let details = response.text().unwrap_or_default();
            return Err(ServiceError::BackendResponse {
                backend: BACKEND.to_string(),
                details: format!("{endpoint} returned {status}: {}", details.trim()),
            });
        }

        Ok(response.json()?)
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, ServiceError> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl Embedder for OllamaEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        let response: EmbeddingResponse = self.client.post_json(
            "api/embeddings",
            &EmbeddingRequest {
                model: &self.model,
                prompt: text,
            },
        )?;

        if response.embedding.is_empty() {
            return Err(ServiceError::EmptyResponse {
                backend: BACKEND.to_string(),
                what: format!("embedding from {}", self.model),
            });
        }

        Ok(response.embedding)
    }
}

#[derive(Debug, Clone)]
pub struct OllamaModel {
    client: OllamaClient,
    model: String,
    temperature: Option<f32>,
}

impl OllamaModel {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    fn request<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: self.temperature.map(|temperature| GenerateOptions {
                temperature: Some(temperature),
            }),
        }
    }
}

impl LanguageModel for OllamaModel {
    fn name(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "calling language model");
        let response: GenerateResponse = self.client.post_json("api/generate", &self.request(prompt))?;

        if response.response.trim().is_empty() {
            return Err(ServiceError::EmptyResponse {
                backend: BACKEND.to_string(),
                what: format!("completion from {}", self.model),
            });
        }

        Ok(response.response)
    }
}
