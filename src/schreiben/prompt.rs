//! Examiner instructions for the correction model.

use std::fmt::Write;

use crate::config::SchreibenConfig;
use crate::schreiben::types::CorrectionRequest;
use crate::upstream::{ChatCompletionRequest, ChatMessage, ResponseFormat};

const RESPONSE_FORMAT: &str = r#"ANTWORT-FORMAT (JSON):
{
  "corrected": "Der komplett korrigierte Brief",
  "errors": [
    {
      "type": "grammar|vocabulary|structure|spelling",
      "original": "Der fehlerhafte Teil",
      "corrected": "Die Korrektur",
      "explanation": "Einfache Erklärung des Fehlers (B1-Niveau)"
    }
  ],
  "score": {
    "content": 0-5,
    "communication": 0-5,
    "accuracy": 0-5,
    "total": 0-15
  },
  "contentPoints": [true, false, true, false],
  "feedback": {
    "strengths": ["Positive Punkte"],
    "improvements": ["Was verbessert werden sollte"],
    "suggestions": ["Konkrete Tipps"]
  }
}"#;

/// Build the system prompt for a DTZ B1 letter evaluation.
pub fn system_prompt(request: &CorrectionRequest) -> String {
    let prompt = &request.prompt;
    let mut out = String::with_capacity(2048);

    let _ = writeln!(
        out,
        "Du bist ein DTZ B1 Prüfer für den Schreiben-Teil. Deine Aufgabe ist es, einen {} Brief \
         zu korrigieren und nach den offiziellen DTZ-Kriterien zu bewerten.\n",
        request.letter_type.adjective()
    );
    let _ = writeln!(out, "SITUATION:\n{}\n", prompt.situation);
    let _ = writeln!(out, "EMPFÄNGER:\n{}\n", prompt.recipient);

    out.push_str("INHALTSPUNKTE (alle müssen behandelt werden):\n");
    for (i, point) in prompt.content_points.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, point);
    }

    out.push_str(
        "\nBEWERTUNGSKRITERIEN:\n\
         1. Inhalt (5 Punkte): Sind alle Inhaltspunkte behandelt? Gibt es genug Details?\n\
         2. Kommunikative Gestaltung (5 Punkte): Ist die Form korrekt (formell/informell)? \
         Gibt es eine klare Struktur? Sind Anrede und Gruß passend?\n\
         3. Formale Richtigkeit (5 Punkte): Sind Grammatik, Wortschatz, Rechtschreibung und \
         Zeichensetzung korrekt?\n\n\
         DEINE AUFGABE:\n\
         1. Korrigiere alle Fehler im Text\n\
         2. Analysiere jeden Fehler und erkläre ihn einfach (B1-Niveau)\n\
         3. Bewerte den Brief nach den 3 Kriterien (jeweils 0-5 Punkte)\n\
         4. Gib konstruktives Feedback mit Stärken und Verbesserungsvorschlägen\n\
         5. Prüfe, welche Inhaltspunkte behandelt wurden (ein Eintrag pro Inhaltspunkt in \
         contentPoints)\n\n",
    );
    out.push_str(RESPONSE_FORMAT);
    out.push_str("\n\nSei konstruktiv und ermutigend! Erkläre Fehler klar und einfach auf B1-Niveau.");
    out
}

/// The full upstream request for a correction.
pub fn completion_request(request: &CorrectionRequest, config: &SchreibenConfig) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: vec![
            ChatMessage::system(system_prompt(request)),
            ChatMessage::user(format!(
                "Bitte korrigiere und bewerte diesen Brief:\n\n{}",
                request.text
            )),
        ],
        response_format: Some(ResponseFormat::JSON_OBJECT),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    }
}
