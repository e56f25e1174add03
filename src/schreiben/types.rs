//! Letter correction request and report types.

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Register the letter must be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterType {
    Formal,
    Informal,
}

impl LetterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LetterType::Formal => "formal",
            LetterType::Informal => "informal",
        }
    }

    /// German adjective used in the examiner instructions.
    pub fn adjective(&self) -> &'static str {
        match self {
            LetterType::Formal => "formellen",
            LetterType::Informal => "informellen",
        }
    }
}

/// The exam task the learner answered.
#[derive(Debug, Clone, PartialEq)]
pub struct LetterPrompt {
    pub title: Option<String>,
    pub situation: String,
    pub recipient: String,
    pub content_points: Vec<String>,
}

/// A validated correction request.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionRequest {
    pub text: String,
    pub word_count: usize,
    pub prompt: LetterPrompt,
    pub letter_type: LetterType,
    pub session_id: Option<String>,
}

/// One corrected mistake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterError {
    #[serde(rename = "type")]
    pub kind: String,
    pub original: String,
    pub corrected: String,
    #[serde(default)]
    pub explanation: String,
}

/// Points per DTZ criterion (0-5 each, 0-15 total), relayed exactly as the
/// examiner wrote them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub content: Number,
    pub communication: Number,
    pub accuracy: Number,
    pub total: Number,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// What the examiner model returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionReport {
    pub corrected: String,
    #[serde(default)]
    pub errors: Vec<LetterError>,
    pub score: Score,
    pub content_points: Vec<bool>,
    #[serde(default)]
    pub feedback: Feedback,
}

/// Body returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionResponse {
    pub original: String,
    pub word_count: usize,
    pub prompt_title: Option<String>,
    #[serde(rename = "type")]
    pub letter_type: LetterType,
    #[serde(flatten)]
    pub report: CorrectionReport,
    pub missing_points: Vec<String>,
}

impl CorrectionResponse {
    pub fn new(request: CorrectionRequest, report: CorrectionReport) -> Self {
        let missing_points = missing_points(&request.prompt.content_points, &report.content_points);
        Self {
            original: request.text,
            word_count: request.word_count,
            prompt_title: request.prompt.title,
            letter_type: request.letter_type,
            report,
            missing_points,
        }
    }
}

/// Content points the examiner did not mark as covered. A point without a
/// verdict counts as missing.
pub fn missing_points(points: &[String], covered: &[bool]) -> Vec<String> {
    points
        .iter()
        .enumerate()
        .filter(|(i, _)| !covered.get(*i).copied().unwrap_or(false))
        .map(|(_, p)| p.clone())
        .collect()
}
