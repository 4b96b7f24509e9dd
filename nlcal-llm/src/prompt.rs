//! Instruction prompt for event extraction.
//!
//! Mistral-instruct template. The prompt ends by opening a ```` ```json ````
//! fence so the model continues straight into the object.

use nlcal_core::extraction::{INSTRUCTION_MARKER, OPEN_FENCE};

const INSTRUCTIONS: &str = "\
Your task is to extract event scheduling information from the user's request.
Identify the event title, date, start time, and end time.

Rules:
- Provide the output strictly in JSON format with the keys: \"title\", \"date\", \"start_time\", \"end_time\".
- If a value is not mentioned or unclear, use null for that key.
- For the date, try to capture it as specifically as possible (e.g., \"next Tuesday\", \"May 5th\", \"tomorrow\", \"April 10th 2025\").
- For times, include AM/PM if specified (e.g., \"3 PM\", \"14:00\").
- If an end time isn't specified, set \"end_time\" to null.";

pub fn build_prompt(request: &str) -> String {
    format!(
        "<s>[INST] {INSTRUCTIONS}\n\nUser request: {}\n\n{INSTRUCTION_MARKER}\n{OPEN_FENCE}\n",
        quote(request)
    )
}

/// Quote the request as a JSON string literal. Template markers are removed
/// so the request cannot end the instruction block early.
fn quote(request: &str) -> String {
    let cleaned = request
        .replace(INSTRUCTION_MARKER, "")
        .replace("[INST]", "");
    serde_json::Value::String(cleaned.trim().to_string()).to_string()
}
