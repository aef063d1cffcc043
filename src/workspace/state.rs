use crate::entity::{Draft, Note, NoteId};
use crate::search::filter_notes;

/// Busy flags, one per kind of gateway call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InFlight {
    pub fetching: bool,
    pub creating: bool,
    pub updating: bool,
    pub deleting: bool,
}

impl InFlight {
    /// True while any write is outstanding; the form's submit stays disabled.
    pub fn mutating(&self) -> bool {
        self.creating || self.updating || self.deleting
    }
}

/// Whether the draft creates a new note or rewrites an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode<'a> {
    Create,
    Edit(&'a NoteId),
}

/// Everything the workspace view renders.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceState {
    pub(super) notes: Vec<Note>,
    pub(super) in_flight: InFlight,
    pub(super) draft: Draft,
    pub(super) editing_id: Option<NoteId>,
    pub(super) query: String,
    pub(super) fetch_error: Option<String>,
}

impl WorkspaceState {
    /// Mirror of the remote collection as of the last successful fetch.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn in_flight(&self) -> InFlight {
        self.in_flight
    }

    pub fn loading(&self) -> bool {
        self.in_flight.fetching
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn editing_id(&self) -> Option<&NoteId> {
        self.editing_id.as_ref()
    }

    pub fn mode(&self) -> EditorMode<'_> {
        match &self.editing_id {
            Some(id) => EditorMode::Edit(id),
            None => EditorMode::Create,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Message from the last fetch, when it failed.
    pub fn fetch_error(&self) -> Option<&str> {
        self.fetch_error.as_deref()
    }

    /// Notes matching the current query, recomputed on every call.
    pub fn visible_notes(&self) -> Vec<&Note> {
        filter_notes(&self.notes, &self.query)
    }

    pub fn find(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| &n.id == id)
    }

    pub fn heading(&self) -> &'static str {
        match self.mode() {
            EditorMode::Create => "Create New Note",
            EditorMode::Edit(_) => "Edit Note",
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self.mode() {
            EditorMode::Create => "Add Note",
            EditorMode::Edit(_) => "Update Note",
        }
    }

    /// Cancel only makes sense while editing.
    pub fn can_cancel(&self) -> bool {
        self.editing_id.is_some()
    }

    /// Text shown when the visible list is empty.
    pub fn empty_message(&self) -> &'static str {
        if self.query.is_empty() {
            "No notes yet. Create your first note!"
        } else {
            "No notes found"
        }
    }
}
