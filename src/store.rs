//! JSON-file persistence for notes.
//!
//! The whole collection lives in a single array-of-records document
//! (`data/notes.json` by default). Reads validate and normalize every record,
//! silently dropping anything malformed. Appends rewrite the full document
//! through a temp file so readers never observe a partial write. When the
//! file cannot be written (read-only deployment or a failed write), the
//! append degrades to a manual-copy result instead of failing.

use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::models::{CreateNoteInput, Note, Subject};

/// Errors from note persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Caller input failed validation; names the offending field.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Unexpected I/O failure. A missing notes file is not an error; callers
    /// see an empty collection instead.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The notes file exists but is not parseable JSON. Surfaced rather than
    /// treated as empty so an append cannot rewrite (and lose) a corrupt but
    /// recoverable document.
    #[error("notes file {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn validation(field: &'static str, message: impl Into<String>) -> Self {
        StoreError::Validation {
            field,
            message: message.into(),
        }
    }

    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Outcome of appending a note.
///
/// `Written` means the note landed in the file. `Manual` means it could not
/// be persisted and the caller has to copy the serialized forms into the
/// collection by hand; the append itself still succeeds.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum CreateNoteResult {
    Written {
        note: Note,
    },
    #[serde(rename_all = "camelCase")]
    Manual {
        note: Note,
        /// Pretty-printed JSON of the note, suitable for pasting into the
        /// backing array. Parses back to a `Note` equal to `note`.
        insert_json: String,
        /// The same note as a front-matter-delimited markdown document.
        insert_markdown: String,
        /// Why the write did not happen.
        reason: String,
    },
}

impl CreateNoteResult {
    /// Returns the created note regardless of mode.
    pub fn note(&self) -> &Note {
        match self {
            Self::Written { note } | Self::Manual { note, .. } => note,
        }
    }
}

/// File-backed note collection.
///
/// The store keeps no in-memory state; every operation re-reads the file.
/// There is no cross-process locking, so concurrent appends can race on the
/// read-modify-write cycle. Accepted for the single-operator deployment this
/// serves.
#[derive(Debug, Clone)]
pub struct NoteStore {
    path: PathBuf,
    read_only: bool,
}

impl NoteStore {
    /// Creates a store backed by the file at `path`.
    ///
    /// With `read_only` set, [`NoteStore::append`] never touches the file and
    /// always returns the manual-copy result.
    pub fn new(path: impl Into<PathBuf>, read_only: bool) -> Self {
        Self {
            path: path.into(),
            read_only,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns all well-formed notes, most recently updated first.
    ///
    /// Ties keep their original file order. A missing file yields an empty
    /// list and malformed records are dropped, never reported; a file that
    /// is not valid JSON at all is an error, not an empty collection.
    pub fn list_all(&self) -> Result<Vec<Note>, StoreError> {
        let mut notes = self.read_notes()?;
        // Stable sort: equal timestamps keep file order.
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    /// Looks up a note by id.
    ///
    /// The id is trimmed first; an empty id returns `None` without touching
    /// the file. An unknown id is `None`, never an error.
    pub fn get_by_id(&self, id: &str) -> Result<Option<Note>, StoreError> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }
        let notes = self.read_notes()?;
        Ok(notes.into_iter().find(|n| n.id == id))
    }

    /// Validates the input, mints a new note, and persists it.
    ///
    /// Only validation produces an `Err`. If the store is read-only, or the
    /// persistence cycle fails at any point (including a corrupt existing
    /// file, which is left untouched), the result is
    /// [`CreateNoteResult::Manual`] with copyable serialized forms.
    pub fn append(&self, input: CreateNoteInput) -> Result<CreateNoteResult, StoreError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(StoreError::validation("title", "must not be empty"));
        }
        let subject: Subject = input
            .subject
            .trim()
            .parse()
            .map_err(|e: crate::models::UnknownSubject| {
                StoreError::validation("subject", e.to_string())
            })?;
        if input.content.trim().is_empty() {
            return Err(StoreError::validation("content", "must not be empty"));
        }

        let now = OffsetDateTime::now_utc();
        let note = Note {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            subject,
            content: input.content,
            created_at: now,
            updated_at: now,
        };

        if self.read_only {
            return Ok(manual_fallback(
                note,
                "this deployment is read-only, so the note was not written to disk".to_string(),
            ));
        }

        match self.write_prepended(&note) {
            Ok(()) => Ok(CreateNoteResult::Written { note }),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "note write failed, returning manual-copy result");
                Ok(manual_fallback(
                    note,
                    format!(
                        "writing {} failed ({err}), so the note was not persisted",
                        self.path.display()
                    ),
                ))
            }
        }
    }

    /// Reads and validates the backing collection in file order.
    fn read_notes(&self) -> Result<Vec<Note>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let doc: Value = serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            source: e,
        })?;
        let Value::Array(items) = doc else {
            tracing::debug!(path = %self.path.display(), "notes document is not an array, treating as empty");
            return Ok(Vec::new());
        };

        Ok(items.iter().filter_map(normalize_record).collect())
    }

    /// Rewrites the collection with `note` prepended.
    ///
    /// Writes go through a temp file in the same directory and an atomic
    /// rename, so a concurrent reader sees either the old or the new
    /// document, never a truncated one.
    fn write_prepended(&self, note: &Note) -> Result<(), StoreError> {
        let mut notes = self.read_notes()?;
        notes.insert(0, note.clone());

        let parent = self.path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;

        let mut raw = serde_json::to_string_pretty(&notes)
            .map_err(|e| StoreError::io(&self.path, io::Error::other(e)))?;
        raw.push('\n');

        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| StoreError::io(parent, e))?;
        tmp.write_all(raw.as_bytes())
            .map_err(|e| StoreError::io(&self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::io(&self.path, e.error))?;
        Ok(())
    }
}

/// Validates one raw record, normalizing what the original data was sloppy
/// about. Returns `None` (and logs) for anything unusable: missing id, title
/// or subject, a subject outside the fixed set, or a timestamp string that
/// does not parse.
fn normalize_record(value: &Value) -> Option<Note> {
    let obj = value.as_object().or_else(|| {
        tracing::debug!("dropping non-object entry in notes file");
        None
    })?;

    let id = trimmed_str(obj.get("id"))?;
    let title = trimmed_str(obj.get("title"))?;
    let subject: Subject = match trimmed_str(obj.get("subject"))?.parse() {
        Ok(subject) => subject,
        Err(e) => {
            tracing::debug!(%id, error = %e, "dropping note with unrecognized subject");
            return None;
        }
    };
    let content = obj
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let created_at = match parse_timestamp(obj.get("createdAt")) {
        Ok(Some(ts)) => ts,
        Ok(None) => OffsetDateTime::now_utc(),
        Err(e) => {
            tracing::debug!(%id, error = %e, "dropping note with unparseable createdAt");
            return None;
        }
    };
    let updated_at = match parse_timestamp(obj.get("updatedAt")) {
        Ok(Some(ts)) => ts,
        Ok(None) => created_at,
        Err(e) => {
            tracing::debug!(%id, error = %e, "dropping note with unparseable updatedAt");
            return None;
        }
    };

    Some(Note {
        id,
        title,
        subject,
        content,
        created_at,
        updated_at,
    })
}

fn trimmed_str(value: Option<&Value>) -> Option<String> {
    let s = value?.as_str()?.trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}

/// Reads an optional RFC 3339 timestamp field. Absent, non-string or blank
/// values are `Ok(None)` (the caller picks a default, as the original data
/// sometimes lacked these fields); a non-empty string that fails to parse is
/// an error, since sorting on a fabricated date would misfile the note.
fn parse_timestamp(value: Option<&Value>) -> Result<Option<OffsetDateTime>, time::error::Parse> {
    match value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        None => Ok(None),
        Some(s) => OffsetDateTime::parse(s, &Rfc3339).map(Some),
    }
}

/// Builds the manual-copy result. Both triggers (read-only deployment and a
/// failed write) go through here so the two outcomes differ only in `reason`.
fn manual_fallback(note: Note, reason: String) -> CreateNoteResult {
    let insert_json =
        serde_json::to_string_pretty(&note).expect("a Note always serializes to JSON");
    let insert_markdown = note_to_markdown(&note);
    CreateNoteResult::Manual {
        note,
        insert_json,
        insert_markdown,
        reason,
    }
}

/// Renders a note as a front-matter-delimited markdown document, the other
/// copyable form offered in manual mode.
fn note_to_markdown(note: &Note) -> String {
    let format_ts = |ts: &OffsetDateTime| {
        ts.format(&Rfc3339)
            .expect("UTC timestamps format as RFC 3339")
    };
    format!(
        "---\nid: {id}\ntitle: {title}\nsubject: {subject}\ncreatedAt: {created}\nupdatedAt: {updated}\n---\n\n{content}\n",
        id = note.id,
        title = note.title.replace('\n', " "),
        subject = note.subject,
        created = format_ts(&note.created_at),
        updated = format_ts(&note.updated_at),
        content = note.content.trim_end(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn input(title: &str, subject: &str, content: &str) -> CreateNoteInput {
        CreateNoteInput {
            title: title.to_string(),
            subject: subject.to_string(),
            content: content.to_string(),
        }
    }

    fn store_in(dir: &Path) -> NoteStore {
        NoteStore::new(dir.join("notes.json"), false)
    }

    #[test]
    fn list_all_returns_empty_when_file_missing() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn list_all_returns_empty_for_non_array_document() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::write(store.path(), r#"{"not": "an array"}"#).unwrap();
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn list_all_drops_malformed_records() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::write(
            store.path(),
            r#"[
                {"id": "ok", "title": "valid", "subject": "math", "content": "x"},
                {"title": "missing id", "subject": "math", "content": "x"},
                {"id": "t", "subject": "math", "content": "no title"},
                {"id": "s", "title": "bad subject", "subject": "biology", "content": "x"},
                {"id": "  ", "title": "blank id", "subject": "math", "content": "x"},
                "not an object",
                42
            ]"#,
        )
        .unwrap();

        let notes = store.list_all().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "ok");
        assert_eq!(notes[0].subject, Subject::Math);
    }

    #[test]
    fn list_all_sorts_by_updated_at_descending_with_stable_ties() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::write(
            store.path(),
            r#"[
                {"id": "old", "title": "a", "subject": "math", "content": "", "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z"},
                {"id": "tie1", "title": "b", "subject": "english", "content": "", "createdAt": "2024-02-01T00:00:00Z", "updatedAt": "2024-02-01T00:00:00Z"},
                {"id": "tie2", "title": "c", "subject": "physics", "content": "", "createdAt": "2024-02-01T00:00:00Z", "updatedAt": "2024-02-01T00:00:00Z"},
                {"id": "new", "title": "d", "subject": "chinese", "content": "", "createdAt": "2024-03-01T00:00:00Z", "updatedAt": "2024-03-01T00:00:00Z"}
            ]"#,
        )
        .unwrap();

        let ids: Vec<_> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["new", "tie1", "tie2", "old"]);
    }

    #[test]
    fn missing_timestamps_default_and_updated_falls_back_to_created() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::write(
            store.path(),
            r#"[{"id": "n", "title": "t", "subject": "math", "content": "", "createdAt": "2024-01-01T00:00:00Z"}]"#,
        )
        .unwrap();

        let notes = store.list_all().unwrap();
        assert_eq!(notes[0].updated_at, notes[0].created_at);
    }

    #[test]
    fn get_by_id_trims_and_returns_none_for_empty_id() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.get_by_id("   ").unwrap().is_none());
        assert!(store.get_by_id("").unwrap().is_none());
    }

    #[test]
    fn get_by_id_returns_none_for_unknown_id() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store
            .append(input("title", "math", "content"))
            .unwrap();
        assert!(store.get_by_id("nope").unwrap().is_none());
    }

    #[test]
    fn append_then_get_by_id_returns_equal_note() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let result = store
            .append(input("  勾股定理  ", "math", "a² + b² = c²"))
            .unwrap();
        let CreateNoteResult::Written { note } = result else {
            panic!("expected written mode");
        };
        assert_eq!(note.title, "勾股定理");

        let fetched = store.get_by_id(&note.id).unwrap().expect("note exists");
        assert_eq!(fetched, note);
    }

    #[test]
    fn append_prepends_new_notes_in_the_file() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        store.append(input("first", "math", "x")).unwrap();
        store.append(input("second", "english", "y")).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.ends_with('\n'));
        let doc: Vec<Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc[0]["title"], "second");
        assert_eq!(doc[1]["title"], "first");
    }

    #[test]
    fn append_rejects_empty_title() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let err = store.append(input("   ", "math", "content")).unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "title", .. }));
    }

    #[test]
    fn append_rejects_empty_content() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let err = store.append(input("title", "math", "  \n ")).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation {
                field: "content",
                ..
            }
        ));
    }

    #[test]
    fn append_rejects_unknown_subject() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let err = store.append(input("title", "biology", "content")).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation {
                field: "subject",
                ..
            }
        ));
        assert!(err.to_string().contains("biology"));
    }

    #[test]
    fn read_only_store_returns_manual_result_without_writing() {
        let dir = tempdir().unwrap();
        let store = NoteStore::new(dir.path().join("notes.json"), true);

        let result = store.append(input("title", "physics", "body")).unwrap();
        let CreateNoteResult::Manual {
            note,
            insert_json,
            reason,
            ..
        } = result
        else {
            panic!("expected manual mode");
        };

        assert!(reason.contains("read-only"));
        assert!(!store.path().exists(), "file must not be created");

        let parsed: Note = serde_json::from_str(&insert_json).unwrap();
        assert_eq!(parsed, note);
    }

    #[test]
    fn write_failure_degrades_to_manual_result() {
        let dir = tempdir().unwrap();
        // Make the would-be parent directory a regular file so the write
        // path fails regardless of process privileges.
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = NoteStore::new(blocker.join("notes.json"), false);

        let result = store.append(input("title", "chemistry", "body")).unwrap();
        let CreateNoteResult::Manual {
            note,
            insert_json,
            insert_markdown,
            reason,
        } = result
        else {
            panic!("expected manual mode");
        };

        assert!(reason.contains("failed"));
        let parsed: Note = serde_json::from_str(&insert_json).unwrap();
        assert_eq!(parsed, note);
        assert!(insert_markdown.starts_with("---\n"));
    }

    #[test]
    fn manual_markdown_has_front_matter_and_flattened_title() {
        let dir = tempdir().unwrap();
        let store = NoteStore::new(dir.path().join("notes.json"), true);

        let result = store
            .append(input("line one\nline two", "english", "body text\n\n"))
            .unwrap();
        let CreateNoteResult::Manual {
            insert_markdown, ..
        } = result
        else {
            panic!("expected manual mode");
        };

        assert!(insert_markdown.contains("title: line one line two\n"));
        assert!(insert_markdown.contains("subject: english\n"));
        assert!(insert_markdown.contains("\n---\n\nbody text\n"));
        assert!(insert_markdown.ends_with("body text\n"));
    }

    #[test]
    fn corrupt_json_file_is_an_error_not_an_empty_collection() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::write(store.path(), "{{{ definitely not json").unwrap();

        let err = store.list_all().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        let err = store.get_by_id("some-id").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn append_on_corrupt_file_degrades_to_manual_and_preserves_the_file() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        // A valid record followed by a stray brace: unparseable as a whole,
        // but the record is still recoverable by hand.
        let damaged = r#"[{"id": "keep-me", "title": "t", "subject": "math", "content": "irreplaceable"}] }"#;
        std::fs::write(store.path(), damaged).unwrap();

        let result = store.append(input("new", "math", "body")).unwrap();
        let CreateNoteResult::Manual { reason, .. } = result else {
            panic!("expected manual mode on a corrupt file");
        };
        assert!(reason.contains("not valid JSON"));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, damaged, "corrupt file must be left untouched");
    }

    #[test]
    fn records_with_unparseable_timestamps_are_dropped() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::write(
            store.path(),
            r#"[
                {"id": "bad-created", "title": "t", "subject": "math", "content": "", "createdAt": "yesterday-ish"},
                {"id": "bad-updated", "title": "t", "subject": "math", "content": "", "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "not a date"},
                {"id": "good", "title": "t", "subject": "math", "content": "", "createdAt": "2024-01-01T00:00:00Z"}
            ]"#,
        )
        .unwrap();

        let notes = store.list_all().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "good");
    }
}
