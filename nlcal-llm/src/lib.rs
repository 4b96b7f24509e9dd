//! Language-model extraction for nlcal.
//!
//! [`HuggingFaceExtractor`] sends the extraction prompt to a Hugging Face
//! text-generation endpoint and hands the generated text to
//! [`nlcal_core::extraction::parse`].

mod client;
mod error;
mod prompt;
mod types;

pub use client::HuggingFaceExtractor;
pub use error::LlmError;
pub use prompt::build_prompt;
