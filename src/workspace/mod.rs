//! The note workspace: the authenticated user's notes, the create/edit
//! draft and the search box.
//!
//! Every write goes through the note store and is followed by a full
//! refetch. The local list is never patched in place, so after any
//! successful write it equals the store's collection again.

mod state;

use std::sync::Arc;

use thiserror::Error;

use crate::entity::{DraftField, Note, NoteId};
use crate::gateway::{GatewayFailure, NoteStoreGateway, SessionGateway};

pub use state::{EditorMode, InFlight, WorkspaceState};

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this note?";

/// Why a workspace action did not go through.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Please fill in both title and content")]
    EmptyDraft,

    #[error("Another change is still being saved")]
    Busy,

    #[error("{0}")]
    Gateway(#[from] GatewayFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
}

/// The yes/no decision point in front of a delete.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

pub struct Workspace {
    store: Arc<dyn NoteStoreGateway>,
    state: WorkspaceState,
    initialized: bool,
}

impl Workspace {
    /// A workspace that has not fetched anything yet.
    pub fn new(store: Arc<dyn NoteStoreGateway>) -> Self {
        Self {
            store,
            state: WorkspaceState::default(),
            initialized: false,
        }
    }

    /// Create a workspace and run its initial fetch.
    pub async fn open(store: Arc<dyn NoteStoreGateway>) -> Self {
        let mut workspace = Self::new(store);
        workspace.initialize().await;
        workspace
    }

    pub fn state(&self) -> &WorkspaceState {
        &self.state
    }

    pub fn visible_notes(&self) -> Vec<&Note> {
        self.state.visible_notes()
    }

    /// First fetch of the session. Only the first call does anything.
    pub async fn initialize(&mut self) {
        if self.initialized {
            tracing::debug!("Workspace already initialized");
            return;
        }
        self.initialized = true;
        // Failures are logged and recorded in `fetch_error`
        let _ = self.refresh().await;
    }

    /// Replace the local list with the store's current collection.
    ///
    /// On failure the list keeps its previous contents.
    pub async fn refresh(&mut self) -> Result<(), GatewayFailure> {
        self.state.in_flight.fetching = true;
        let result = self.store.list_notes().await;
        self.state.in_flight.fetching = false;

        match result {
            Ok(notes) => {
                tracing::debug!(count = notes.len(), "Notes refreshed");
                self.state.notes = notes;
                self.state.fetch_error = None;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error fetching notes: {}", e);
                self.state.fetch_error = Some(e.message.clone());
                Err(e)
            }
        }
    }

    /// Refetch after a successful write. A failed refetch does not undo the
    /// write; it only shows up in `fetch_error`.
    async fn reconcile(&mut self) {
        let _ = self.refresh().await;
    }

    /// Switch to edit mode for `note`, seeding the draft from it.
    pub fn begin_edit(&mut self, note: &Note) {
        self.state.draft.title = note.title.clone();
        self.state.draft.content = note.content.clone();
        self.state.editing_id = Some(note.id.clone());
        tracing::debug!(id = %note.id, "Editing note");
    }

    /// Back to create mode with an empty draft.
    pub fn cancel_edit(&mut self) {
        self.state.draft.clear();
        self.state.editing_id = None;
    }

    pub fn update_draft(&mut self, field: DraftField, value: String) {
        self.state.draft.set(field, value);
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.state.query = text.into();
    }

    /// Create or update, depending on the mode.
    pub async fn submit_draft(&mut self) -> Result<SubmitOutcome, ActionError> {
        if self.state.in_flight.mutating() {
            return Err(ActionError::Busy);
        }
        let (title, content) = match self.state.draft.trimmed() {
            Some((title, content)) => (title.to_string(), content.to_string()),
            None => return Err(ActionError::EmptyDraft),
        };

        match self.state.editing_id.clone() {
            Some(id) => {
                self.state.in_flight.updating = true;
                let result = self.store.update_note(&id, &title, &content).await;
                self.state.in_flight.updating = false;

                if let Err(e) = result {
                    tracing::warn!(id = %id, "Update failed: {}", e);
                    return Err(e.into());
                }
                self.state.editing_id = None;
                self.state.draft.clear();
                self.reconcile().await;
                Ok(SubmitOutcome::Updated)
            }
            None => {
                self.state.in_flight.creating = true;
                let result = self.store.create_note(&title, &content).await;
                self.state.in_flight.creating = false;

                if let Err(e) = result {
                    tracing::warn!("Create failed: {}", e);
                    return Err(e.into());
                }
                self.state.draft.clear();
                self.reconcile().await;
                Ok(SubmitOutcome::Created)
            }
        }
    }

    /// Delete after an explicit yes from `confirm`.
    pub async fn delete_note(
        &mut self,
        id: &NoteId,
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome, ActionError> {
        if !confirm.confirm(DELETE_PROMPT) {
            return Ok(DeleteOutcome::Declined);
        }
        if self.state.in_flight.mutating() {
            return Err(ActionError::Busy);
        }

        self.state.in_flight.deleting = true;
        let result = self.store.delete_note(id).await;
        self.state.in_flight.deleting = false;

        if let Err(e) = result {
            tracing::warn!(id = %id, "Delete failed: {}", e);
            return Err(e.into());
        }
        if self.state.editing_id.as_ref() == Some(id) {
            self.cancel_edit();
        }
        self.reconcile().await;
        Ok(DeleteOutcome::Deleted)
    }

    /// End the session. The workspace is consumed so none of its state
    /// survives the sign-out.
    pub async fn sign_out(self, session: &dyn SessionGateway) {
        session.sign_out().await;
        tracing::debug!(notes = self.state.notes.len(), "Workspace closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Draft;
    use crate::gateway::memory::{Call, Operation};
    use crate::gateway::MemoryBackend;

    const OWNER: &str = "ada@example.com";

    fn yes() -> impl Fn(&str) -> bool {
        |_: &str| true
    }

    fn no() -> impl Fn(&str) -> bool {
        |_: &str| false
    }

    /// Signed-in backend seeded with `notes` (oldest first) and an opened
    /// workspace, with the call journal cleared.
    async fn workspace_with(notes: &[(&str, &str)]) -> (Arc<MemoryBackend>, Workspace) {
        let backend = Arc::new(MemoryBackend::new());
        for (title, content) in notes {
            backend.seed_note(OWNER, title, content);
        }
        backend.restore_session(OWNER);
        let workspace = Workspace::open(backend.clone()).await;
        backend.clear_calls();
        (backend, workspace)
    }

    fn list_calls(backend: &MemoryBackend) -> usize {
        backend.count_calls(|c| matches!(c, Call::ListNotes))
    }

    fn titles(workspace: &Workspace) -> Vec<String> {
        workspace
            .state()
            .notes()
            .iter()
            .map(|n| n.title.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_open_fetches_newest_first() {
        let (backend, workspace) = workspace_with(&[("old", "a"), ("new", "b")]).await;
        assert_eq!(titles(&workspace), vec!["new", "old"]);
        assert!(!workspace.state().loading());
        assert_eq!(workspace.state().notes(), backend.notes_of(OWNER).as_slice());
    }

    #[tokio::test]
    async fn test_initialize_runs_once() {
        let (backend, mut workspace) = workspace_with(&[("a", "b")]).await;
        workspace.initialize().await;
        assert_eq!(list_calls(&backend), 0);
    }

    #[tokio::test]
    async fn test_initial_fetch_failure_leaves_list_empty() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed_note(OWNER, "a", "b");
        backend.restore_session(OWNER);
        backend.fail_next(Operation::ListNotes, "network error");

        let workspace = Workspace::open(backend.clone()).await;
        assert!(workspace.state().notes().is_empty());
        assert!(!workspace.state().loading());
        assert_eq!(workspace.state().fetch_error(), Some("network error"));
    }

    #[tokio::test]
    async fn test_begin_then_cancel_restores_create_mode() {
        let (_backend, mut workspace) = workspace_with(&[("Groceries", "milk")]).await;
        let note = workspace.state().notes()[0].clone();

        workspace.begin_edit(&note);
        assert_eq!(workspace.state().mode(), EditorMode::Edit(&note.id));
        assert_eq!(workspace.state().draft(), &Draft::new("Groceries", "milk"));

        workspace.cancel_edit();
        assert_eq!(workspace.state().mode(), EditorMode::Create);
        assert_eq!(workspace.state().editing_id(), None);
        assert_eq!(workspace.state().draft(), &Draft::default());
    }

    #[tokio::test]
    async fn test_blank_title_never_reaches_gateway() {
        let (backend, mut workspace) = workspace_with(&[("a", "b")]).await;
        let before = workspace.state().notes().to_vec();

        workspace.update_draft(DraftField::Title, "  ".to_string());
        workspace.update_draft(DraftField::Content, "something".to_string());

        assert_eq!(workspace.submit_draft().await, Err(ActionError::EmptyDraft));
        assert_eq!(
            ActionError::EmptyDraft.to_string(),
            "Please fill in both title and content"
        );
        assert!(backend.calls().is_empty());
        assert_eq!(workspace.state().notes(), before.as_slice());
    }

    #[tokio::test]
    async fn test_create_sends_trimmed_values_then_refreshes_once() {
        let (backend, mut workspace) = workspace_with(&[]).await;

        workspace.update_draft(DraftField::Title, " Groceries ".to_string());
        workspace.update_draft(DraftField::Content, "milk, eggs\n".to_string());

        assert_eq!(workspace.submit_draft().await, Ok(SubmitOutcome::Created));
        assert_eq!(
            backend.calls(),
            vec![
                Call::CreateNote {
                    title: "Groceries".to_string(),
                    content: "milk, eggs".to_string(),
                },
                Call::ListNotes,
            ]
        );
        assert_eq!(workspace.state().draft(), &Draft::default());
        assert_eq!(titles(&workspace), vec!["Groceries"]);
    }

    #[tokio::test]
    async fn test_create_failure_keeps_draft() {
        let (backend, mut workspace) = workspace_with(&[]).await;
        backend.fail_next(Operation::CreateNote, "network error");

        workspace.update_draft(DraftField::Title, "Groceries".to_string());
        workspace.update_draft(DraftField::Content, "milk".to_string());

        let err = workspace.submit_draft().await.unwrap_err();
        assert_eq!(err.to_string(), "network error");
        assert_eq!(workspace.state().draft(), &Draft::new("Groceries", "milk"));
        assert_eq!(list_calls(&backend), 0);
        assert!(!workspace.state().in_flight().creating);
    }

    #[tokio::test]
    async fn test_update_returns_to_create_mode() {
        let (backend, mut workspace) = workspace_with(&[("Groceries", "milk")]).await;
        let note = workspace.state().notes()[0].clone();

        workspace.begin_edit(&note);
        workspace.update_draft(DraftField::Content, "milk, eggs".to_string());

        assert_eq!(workspace.submit_draft().await, Ok(SubmitOutcome::Updated));
        assert_eq!(workspace.state().mode(), EditorMode::Create);
        assert_eq!(workspace.state().draft(), &Draft::default());
        assert_eq!(workspace.state().notes()[0].content, "milk, eggs");
        assert_eq!(workspace.state().notes()[0].id, note.id);
        assert_eq!(list_calls(&backend), 1);
    }

    #[tokio::test]
    async fn test_update_failure_keeps_edit_state() {
        let (backend, mut workspace) = workspace_with(&[("Groceries", "milk")]).await;
        let note = workspace.state().notes()[0].clone();
        let before = workspace.state().notes().to_vec();

        workspace.begin_edit(&note);
        workspace.update_draft(DraftField::Title, "Shopping".to_string());
        backend.fail_next(Operation::UpdateNote, "network error");

        let err = workspace.submit_draft().await.unwrap_err();
        assert_eq!(err.to_string(), "network error");
        assert_eq!(workspace.state().editing_id(), Some(&note.id));
        assert_eq!(workspace.state().draft(), &Draft::new("Shopping", "milk"));
        assert_eq!(workspace.state().notes(), before.as_slice());
        assert_eq!(list_calls(&backend), 0);
    }

    #[tokio::test]
    async fn test_declined_delete_does_nothing() {
        let (backend, mut workspace) = workspace_with(&[("a", "b")]).await;
        let before = workspace.state().notes().to_vec();

        let outcome = workspace
            .delete_note(&NoteId::from(42), &no())
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Declined);
        assert!(backend.calls().is_empty());
        assert_eq!(workspace.state().notes(), before.as_slice());
    }

    #[tokio::test]
    async fn test_confirmed_delete_refreshes() {
        let (backend, mut workspace) = workspace_with(&[("a", "1"), ("b", "2")]).await;
        let id = workspace.state().notes()[0].id.clone();

        let asked = std::cell::Cell::new(None::<String>);
        let confirm = |prompt: &str| {
            asked.set(Some(prompt.to_string()));
            true
        };
        let outcome = workspace.delete_note(&id, &confirm).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(asked.take().as_deref(), Some(DELETE_PROMPT));
        assert_eq!(titles(&workspace), vec!["a"]);
        assert_eq!(
            backend.calls(),
            vec![Call::DeleteNote { id }, Call::ListNotes]
        );
    }

    #[tokio::test]
    async fn test_delete_failure_surfaces_message() {
        let (backend, mut workspace) = workspace_with(&[("a", "1")]).await;
        let id = workspace.state().notes()[0].id.clone();
        backend.fail_next(Operation::DeleteNote, "permission denied");

        let err = workspace.delete_note(&id, &yes()).await.unwrap_err();
        assert_eq!(err.to_string(), "permission denied");
        assert_eq!(titles(&workspace), vec!["a"]);
        assert!(!workspace.state().in_flight().deleting);
    }

    #[tokio::test]
    async fn test_deleting_edited_note_cancels_edit() {
        let (_backend, mut workspace) = workspace_with(&[("a", "1")]).await;
        let note = workspace.state().notes()[0].clone();
        workspace.begin_edit(&note);

        workspace.delete_note(&note.id, &yes()).await.unwrap();
        assert_eq!(workspace.state().mode(), EditorMode::Create);
        assert!(workspace.state().draft().is_empty());
    }

    #[tokio::test]
    async fn test_search_is_a_projection() {
        let (_backend, mut workspace) = workspace_with(&[
            ("Shopping", "milk"),
            ("Work", "review"),
            ("Weekend", "go shopping"),
        ])
        .await;

        assert_eq!(workspace.visible_notes().len(), 3);

        workspace.set_query("shopping");
        let visible: Vec<_> = workspace
            .visible_notes()
            .iter()
            .map(|n| n.title.clone())
            .collect();
        assert_eq!(visible, vec!["Weekend", "Shopping"]);
        assert_eq!(workspace.state().notes().len(), 3);

        workspace.set_query("");
        assert_eq!(workspace.visible_notes().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_refetch_does_not_fail_the_write() {
        let (backend, mut workspace) = workspace_with(&[]).await;
        backend.fail_next(Operation::ListNotes, "timeout");

        workspace.update_draft(DraftField::Title, "t".to_string());
        workspace.update_draft(DraftField::Content, "c".to_string());
        assert_eq!(workspace.submit_draft().await, Ok(SubmitOutcome::Created));
        assert!(workspace.state().notes().is_empty());
        assert_eq!(workspace.state().fetch_error(), Some("timeout"));

        workspace.refresh().await.unwrap();
        assert_eq!(workspace.state().notes().len(), 1);
        assert_eq!(workspace.state().fetch_error(), None);
    }

    #[tokio::test]
    async fn test_mirror_matches_store_after_every_write() {
        let (backend, mut workspace) = workspace_with(&[("seed", "0")]).await;

        for i in 0..3 {
            workspace.update_draft(DraftField::Title, format!("note {}", i));
            workspace.update_draft(DraftField::Content, format!("body {}", i));
            workspace.submit_draft().await.unwrap();
            assert_eq!(workspace.state().notes(), backend.notes_of(OWNER).as_slice());
        }

        let target = workspace.state().notes()[1].clone();
        workspace.begin_edit(&target);
        workspace.update_draft(DraftField::Title, "renamed".to_string());
        workspace.submit_draft().await.unwrap();
        assert_eq!(workspace.state().notes(), backend.notes_of(OWNER).as_slice());

        let victim = workspace.state().notes()[0].id.clone();
        workspace.delete_note(&victim, &yes()).await.unwrap();
        assert_eq!(workspace.state().notes(), backend.notes_of(OWNER).as_slice());
        assert_eq!(workspace.state().notes().len(), 3);

        let created: Vec<_> = workspace
            .state()
            .notes()
            .iter()
            .map(|n| n.created_at)
            .collect();
        assert!(created.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn test_sign_out_ends_session() {
        let (backend, workspace) = workspace_with(&[]).await;
        workspace.sign_out(backend.as_ref()).await;
        assert_eq!(backend.calls(), vec![Call::SignOut]);
        assert_eq!(backend.current_user(), None);
    }
}
