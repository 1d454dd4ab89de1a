//! swot — a single-student study-notes service.
//!
//! Notes live in one JSON file and are grouped by school subject; an ask
//! endpoint forwards questions to an OpenAI-compatible model provider and
//! returns a structured four-part explanation. When the notes file cannot
//! be written (read-only deployments), note creation degrades to returning
//! copy-paste content instead of failing.

pub mod ask;
pub mod models;
pub mod query;
pub mod server;
pub mod store;

pub use ask::{AskAnswer, AskClient, AskConfig, AskError};
pub use models::{CreateNoteInput, Note, Subject};
pub use store::{CreateNoteResult, NoteStore, StoreError};
