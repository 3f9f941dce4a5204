use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAX_NEW_TOKENS: u32 = 60;

/// The text-generation capability behind the prediction and insight
/// endpoints. Handlers only see this trait, so the backing model can be
/// swapped without touching them.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("model returned no candidates")]
    EmptyResponse,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Serialize)]
struct GenerateParameters {
    max_new_tokens: u32,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// Calls a text-generation-inference style HTTP endpoint and returns the
/// first candidate.
pub struct HttpTextModel {
    inner: reqwest::Client,
    url: String,
}

impl HttpTextModel {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { inner: client, url }
    }
}

#[async_trait]
impl TextModel for HttpTextModel {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let request = GenerateRequest {
            inputs: prompt,
            parameters: GenerateParameters {
                max_new_tokens: MAX_NEW_TOKENS,
            },
        };

        let candidates: Vec<GeneratedText> = self
            .inner
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        candidates
            .into_iter()
            .next()
            .map(|c| c.generated_text)
            .ok_or(ModelError::EmptyResponse)
    }
}
