use serde::Deserialize;
use thiserror::Error;

use crate::model::ending::Ending;
use crate::model::scenario::{Choice, Scenario};
use crate::model::stats::StatDelta;

/// A decoded next-turn reply. `stat_updates` is already defaulted: the
/// generator omitting the triple means "no change", never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorReply {
    pub narrative: String,
    pub choices: Vec<Choice>,
    pub environment: String,
    pub stat_updates: StatDelta,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("generator reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("generator reply is empty")]
    Empty,
}

/// Raw wire shape, before default-filling.
#[derive(Deserialize)]
struct RawReply {
    narrative: String,
    #[serde(default)]
    choices: Vec<Choice>,
    environment: String,
    #[serde(default)]
    stat_updates: Option<StatDelta>,
}

/// Strip a Markdown code fence if the model wrapped its JSON in one.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

fn fenced_json(raw: &str) -> Result<&str, DecodeError> {
    let json = strip_fences(raw);
    if json.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(json)
}

/// Decode a next-turn reply, filling an absent delta with zeros.
pub fn decode_reply(raw: &str) -> Result<GeneratorReply, DecodeError> {
    let parsed: RawReply = serde_json::from_str(fenced_json(raw)?)?;
    Ok(GeneratorReply {
        narrative: parsed.narrative,
        choices: parsed.choices,
        environment: parsed.environment,
        stat_updates: parsed.stat_updates.unwrap_or_default(),
    })
}

/// Decode an initial-scenario reply. Same wire shape as a turn reply,
/// minus any stat movement.
pub fn decode_scenario(raw: &str) -> Result<Scenario, DecodeError> {
    let reply = decode_reply(raw)?;
    Ok(Scenario {
        narrative: reply.narrative,
        choices: reply.choices,
        environment: reply.environment,
    })
}

/// Decode an ending reply.
pub fn decode_ending(raw: &str) -> Result<Ending, DecodeError> {
    Ok(serde_json::from_str(fenced_json(raw)?)?)
}
