use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Subject;

/// A persisted study note.
///
/// Notes are the unit of capture in the system. Each note is created once
/// through the store's append operation and never mutated or deleted after
/// that. Field names serialize in camelCase to match the on-disk layout of
/// `data/notes.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Opaque unique identifier, generated at creation.
    pub id: String,
    /// Trimmed, non-empty title.
    pub title: String,
    /// Which subject this note files under.
    pub subject: Subject,
    /// Markdown body; may span multiple lines.
    pub content: String,
    /// When this note was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When this note was last updated. Equals `created_at` for every note
    /// this system writes, since there is no update operation.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Caller-supplied fields for creating a note.
///
/// Everything else on [`Note`] (id, timestamps) is generated by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNoteInput {
    pub title: String,
    pub subject: String,
    pub content: String,
}
