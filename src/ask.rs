/// AI explanation endpoint: upstream chat-completion client and answer parsing.
///
/// A question goes out as one synchronous request to an OpenAI-compatible
/// API; the reply comes back as a four-field [`AskAnswer`], degrading to a
/// single-field answer when the model ignores the JSON instructions.
mod answer;
mod client;

pub use answer::{AskAnswer, ModelOutput, resolve_answer};
pub use client::{AskClient, AskConfig, AskError, DEFAULT_BASE_URL, DEFAULT_MODEL, http_client};
