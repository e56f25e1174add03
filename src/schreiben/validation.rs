//! Shape check for correction requests.

use serde_json::{Map, Value};

use crate::http::validation::{
    optional_text, require_object, require_text, word_count, ValidationError,
};
use crate::schreiben::types::{CorrectionRequest, LetterPrompt, LetterType};

/// Turn a loose JSON body into a [`CorrectionRequest`].
///
/// Checks run in order: presence of `text`, `prompt`, `type`; then the shape
/// of each; then the word count against `min_words`.
pub fn validate_correction(
    body: &Map<String, Value>,
    min_words: usize,
) -> Result<CorrectionRequest, ValidationError> {
    let text = require_text(body, "text")?;
    let prompt = require_object(body, "prompt")?;
    let kind = require_text(body, "type")?;

    let letter_type = match kind {
        "formal" => LetterType::Formal,
        "informal" => LetterType::Informal,
        other => {
            return Err(ValidationError::invalid(
                "type",
                format!("expected 'formal' or 'informal', got '{}'", other),
            ))
        }
    };

    let prompt = parse_prompt(prompt)?;

    let count = word_count(text);
    if count < min_words {
        return Err(ValidationError::TooShort {
            word_count: count,
            minimum: min_words,
        });
    }

    Ok(CorrectionRequest {
        text: text.to_string(),
        word_count: count,
        prompt,
        letter_type,
        session_id: optional_text(body, "sessionId")?.map(str::to_string),
    })
}

fn parse_prompt(prompt: &Map<String, Value>) -> Result<LetterPrompt, ValidationError> {
    let situation = require_text(prompt, "situation")
        .map_err(|_| ValidationError::invalid("prompt", "situation must be a non-empty string"))?;
    let recipient = require_text(prompt, "recipient")
        .map_err(|_| ValidationError::invalid("prompt", "recipient must be a non-empty string"))?;
    let title = optional_text(prompt, "title")
        .map_err(|_| ValidationError::invalid("prompt", "title must be a string"))?;

    let content_points = match prompt.get("contentPoints") {
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ValidationError::invalid("prompt", "contentPoints must contain only strings"))?,
        _ => {
            return Err(ValidationError::invalid(
                "prompt",
                "contentPoints must be a non-empty array",
            ))
        }
    };

    Ok(LetterPrompt {
        title: title.map(str::to_string),
        situation: situation.to_string(),
        recipient: recipient.to_string(),
        content_points,
    })
}
