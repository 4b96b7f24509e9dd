use async_trait::async_trait;
use nlcal_core::extraction::{self, INSTRUCTION_MARKER};
use nlcal_core::{Config, ExtractionFailure, Extractor, RawExtraction};
use tracing::{debug, instrument};
use url::Url;

use crate::error::LlmError;
use crate::prompt::build_prompt;
use crate::types::{GenerationParameters, GenerationRequest, GenerationResponse};

/// Extractor backed by a Hugging Face text-generation inference endpoint.
pub struct HuggingFaceExtractor {
    http: reqwest::Client,
    url: Url,
    token: Option<String>,
    model: String,
}

impl HuggingFaceExtractor {
    /// Validates the model settings and builds the HTTP client.
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        let model = config.model.trim();
        if model.is_empty() {
            return Err(LlmError::Config("model name is empty".into()));
        }

        let base = config.inference_url.trim_end_matches('/');
        let url = Url::parse(&format!("{base}/{model}"))
            .map_err(|e| LlmError::Config(format!("invalid inference endpoint {base:?}: {e}")))?;

        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            url,
            token: config.inference_token.clone(),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Send the prompt and return the generated text.
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = GenerationRequest {
            inputs: prompt,
            parameters: GenerationParameters::default(),
        };

        debug!("Sending request to inference endpoint");

        let mut request = self.http.post(self.url.clone()).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or(text);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        match serde_json::from_str::<GenerationResponse>(&text)? {
            GenerationResponse::Batch(mut batch) if !batch.is_empty() => {
                Ok(batch.swap_remove(0).generated_text)
            }
            GenerationResponse::Batch(_) => Err(LlmError::EmptyResponse),
            GenerationResponse::Single(generated) => Ok(generated.generated_text),
            GenerationResponse::Error { error } => Err(LlmError::Api {
                status: status.as_u16(),
                message: error,
            }),
        }
    }
}

#[async_trait]
impl Extractor for HuggingFaceExtractor {
    async fn extract(&self, text: &str) -> Result<RawExtraction, ExtractionFailure> {
        let prompt = build_prompt(text);
        let mut output = self.generate(&prompt).await?;

        // Some servers ignore return_full_text and send only the continuation.
        if !output.contains(INSTRUCTION_MARKER) {
            output.insert_str(0, &prompt);
        }

        debug!(raw_output = %output, "Model output");
        extraction::parse(&output)
    }
}
