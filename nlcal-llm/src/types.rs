use serde::{Deserialize, Serialize};

pub const TEMPERATURE: f32 = 0.1;
pub const MAX_NEW_TOKENS: u32 = 250;

#[derive(Debug, Serialize)]
pub struct GenerationRequest<'a> {
    pub inputs: &'a str,
    pub parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
pub struct GenerationParameters {
    pub temperature: f32,
    pub max_new_tokens: u32,
    pub do_sample: bool,
    pub return_full_text: bool,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            temperature: TEMPERATURE,
            max_new_tokens: MAX_NEW_TOKENS,
            do_sample: true,
            return_full_text: true,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeneratedText {
    pub generated_text: String,
}

/// Inference servers answer with a list, a single object, or an error object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GenerationResponse {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
    Error { error: String },
}
