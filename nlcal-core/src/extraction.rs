//! Parsing the language model's free-form answer into a [`RawExtraction`].
//!
//! The model is asked to answer with a JSON object inside a ```` ```json ````
//! fence, but small models regularly drop the closing fence or skip the
//! fence altogether. The JSON object is located with an ordered chain of
//! [`LocateStrategy`] values, then projected onto the four expected keys.
//! No date semantics happen here.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ExtractionFailure;
use crate::event::{Field, RawExtraction};

/// End of the instruction block in the prompt template. The answer starts after it.
pub const INSTRUCTION_MARKER: &str = "[/INST]";

/// Opening fence the model is primed with.
pub const OPEN_FENCE: &str = "```json";

const CLOSE_FENCE: &str = "```";

/// Ways of finding the JSON object in the model's answer, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateStrategy {
    /// Opening fence followed by a closing fence.
    ClosedFence,
    /// Opening fence with the closing fence missing or truncated.
    OpenFence,
    /// No fence at all.
    BareObject,
}

impl LocateStrategy {
    pub const CHAIN: [LocateStrategy; 3] = [
        LocateStrategy::ClosedFence,
        LocateStrategy::OpenFence,
        LocateStrategy::BareObject,
    ];

    /// Candidate JSON text within `answer`, or `None` if this strategy does not apply.
    pub fn locate(self, answer: &str) -> Option<&str> {
        let fenced_body = answer
            .find(OPEN_FENCE)
            .map(|idx| &answer[idx + OPEN_FENCE.len()..]);

        match self {
            LocateStrategy::ClosedFence => {
                let body = fenced_body?;
                let close = body.find(CLOSE_FENCE)?;
                Some(body[..close].trim())
            }
            LocateStrategy::OpenFence => {
                let body = fenced_body?;
                if body.contains(CLOSE_FENCE) {
                    return None;
                }
                let last_brace = body.rfind('}')?;
                Some(body[..=last_brace].trim())
            }
            LocateStrategy::BareObject => {
                if fenced_body.is_some() {
                    return None;
                }
                let open = answer.find('{')?;
                let close = answer.rfind('}')?;
                (open < close).then(|| &answer[open..=close])
            }
        }
    }
}

/// The part of the model output after the instruction marker, or all of it
/// when the marker is absent (some endpoints do not echo the prompt).
fn answer_section(model_output: &str) -> &str {
    match model_output.find(INSTRUCTION_MARKER) {
        Some(idx) => &model_output[idx + INSTRUCTION_MARKER.len()..],
        None => model_output,
    }
}

/// Parse raw model output into a [`RawExtraction`].
pub fn parse(model_output: &str) -> Result<RawExtraction, ExtractionFailure> {
    let answer = answer_section(model_output);

    let (strategy, span) = LocateStrategy::CHAIN
        .into_iter()
        .find_map(|strategy| strategy.locate(answer).map(|span| (strategy, span)))
        .ok_or_else(|| {
            ExtractionFailure::Unparseable("no JSON object found in the model output".into())
        })?;

    debug!(?strategy, span, "Located JSON in model output");

    let value: Value = serde_json::from_str(span)
        .map_err(|e| ExtractionFailure::Unparseable(format!("invalid JSON ({e}): {span}")))?;

    let object = value.as_object().ok_or_else(|| {
        ExtractionFailure::Unparseable(format!("expected a JSON object, got: {span}"))
    })?;

    let extraction = project(object);
    debug!(?extraction, "Normalized model extraction");

    Ok(extraction)
}

/// Keep exactly the four expected keys; anything else the model said is dropped.
fn project(object: &Map<String, Value>) -> RawExtraction {
    let field = |f: Field| field_value(object.get(f.key()));

    RawExtraction::new(
        field(Field::Title),
        field(Field::Date),
        field(Field::StartTime),
        field(Field::EndTime),
    )
}

fn field_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        // e.g. "date": 2025
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
