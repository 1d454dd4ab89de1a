mod note;
mod subject;

pub use note::{CreateNoteInput, Note};
pub use subject::{Subject, UnknownSubject};
