mod draft;
mod note;

pub use draft::{Draft, DraftField};
pub use note::{Note, NoteId};
