use serde::{Deserialize, Serialize};

/// Placeholder for `solution` when the model ignored the JSON instructions.
const FALLBACK_SOLUTION: &str =
    "（AI 没按要求分段输出，我先把它的回答放在“概念解释”里，你可以自己再整理一下。）";
/// Placeholder for the remaining fields on the degraded path.
const FALLBACK_PLACEHOLDER: &str = "（同上）";

/// A structured explanation for one question.
///
/// Ephemeral: lives only inside a single request/response cycle and is never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskAnswer {
    /// Plain-language explanation of the core concept.
    pub concept: String,
    /// Steps and reasoning toward a solution.
    pub solution: String,
    /// Common mistakes to watch for.
    pub pitfalls: String,
    /// Suggested next study steps.
    pub next: String,
}

/// What the model actually sent back, resolved exactly once.
///
/// `Structured` means the content parsed as JSON with exactly the four
/// expected string fields. Anything else is `Unstructured` and degrades into
/// an answer instead of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutput {
    Structured(AskAnswer),
    Unstructured(String),
}

/// Shape the model was instructed to produce. Extra fields are tolerated;
/// missing or non-string fields are not.
#[derive(Deserialize)]
struct RawAnswer {
    concept: String,
    solution: String,
    pitfalls: String,
    next: String,
}

impl ModelOutput {
    /// Classifies raw model content by attempting the strict four-field parse.
    pub fn classify(content: &str) -> Self {
        match serde_json::from_str::<RawAnswer>(content) {
            Ok(raw) => Self::Structured(AskAnswer {
                concept: raw.concept.trim().to_string(),
                solution: raw.solution.trim().to_string(),
                pitfalls: raw.pitfalls.trim().to_string(),
                next: raw.next.trim().to_string(),
            }),
            Err(_) => Self::Unstructured(content.trim().to_string()),
        }
    }

    /// Converts into the answer handed to the caller. The unstructured case
    /// puts the whole raw text under `concept` and fills the other fields
    /// with fixed placeholders.
    pub fn into_answer(self) -> AskAnswer {
        match self {
            Self::Structured(answer) => answer,
            Self::Unstructured(raw) => AskAnswer {
                concept: raw,
                solution: FALLBACK_SOLUTION.to_string(),
                pitfalls: FALLBACK_PLACEHOLDER.to_string(),
                next: FALLBACK_PLACEHOLDER.to_string(),
            },
        }
    }
}

/// Parses model content into an answer, degrading rather than failing.
pub fn resolve_answer(content: &str) -> AskAnswer {
    ModelOutput::classify(content).into_answer()
}
