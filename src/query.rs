//! Read-side helpers over the note store.
//!
//! Nothing here is stateful; these functions just reshape what
//! [`crate::store::NoteStore::list_all`] returns for display.

use crate::models::{Note, Subject};

/// Groups notes by subject in fixed subject order.
///
/// Within each group the input order is preserved, so feeding this the
/// store's recency-sorted list keeps each group recency-sorted too.
/// Subjects with no notes are omitted.
pub fn group_by_subject(notes: Vec<Note>) -> Vec<(Subject, Vec<Note>)> {
    Subject::ALL
        .into_iter()
        .filter_map(|subject| {
            let group: Vec<Note> = notes
                .iter()
                .filter(|n| n.subject == subject)
                .cloned()
                .collect();
            if group.is_empty() {
                None
            } else {
                Some((subject, group))
            }
        })
        .collect()
}
