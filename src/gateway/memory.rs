//! In-process backend implementing both gateways.
//!
//! Accounts and note collections live in memory. Every call is journaled
//! and any operation can be made to fail once, which is what the controller
//! tests lean on.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::{GatewayFailure, GatewayResult, NoteStoreGateway, Profile, Registration, SessionGateway};
use crate::entity::{Note, NoteId};

const MIN_SERVER_PASSWORD_LEN: usize = 6;

/// A gateway call as observed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SignUp { email: String },
    SignIn { email: String },
    SignOut,
    ListNotes,
    CreateNote { title: String, content: String },
    UpdateNote { id: NoteId, title: String, content: String },
    DeleteNote { id: NoteId },
}

/// Operations that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SignUp,
    SignIn,
    ListNotes,
    CreateNote,
    UpdateNote,
    DeleteNote,
}

#[derive(Debug)]
struct Account {
    password: String,
    profile: Profile,
    confirmed: bool,
}

#[derive(Debug)]
struct Inner {
    accounts: HashMap<String, Account>,
    notes: HashMap<String, Vec<Note>>,
    current_user: Option<String>,
    calls: Vec<Call>,
    failures: HashMap<Operation, String>,
    epoch: DateTime<Utc>,
    ticks: i64,
}

impl Inner {
    fn take_failure(&mut self, op: Operation) -> GatewayResult<()> {
        match self.failures.remove(&op) {
            Some(message) => Err(GatewayFailure::new(message)),
            None => Ok(()),
        }
    }

    fn owner(&self) -> GatewayResult<String> {
        self.current_user
            .clone()
            .ok_or_else(|| GatewayFailure::new("Not authenticated"))
    }

    fn next_timestamp(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        self.epoch + Duration::seconds(self.ticks)
    }

    fn sorted_notes(&self, owner: &str) -> Vec<Note> {
        let mut notes = self.notes.get(owner).cloned().unwrap_or_default();
        // Stored in insertion order; reversing first keeps the newest insert
        // ahead of older ones that share a timestamp.
        notes.reverse();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes
    }
}

pub struct MemoryBackend {
    inner: Mutex<Inner>,
    require_confirmation: bool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Backend that hands out a session immediately on sign-up.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                accounts: HashMap::new(),
                notes: HashMap::new(),
                current_user: None,
                calls: Vec::new(),
                failures: HashMap::new(),
                epoch: Utc::now(),
                ticks: 0,
            }),
            require_confirmation: false,
        }
    }

    /// Backend where new accounts must confirm their email before signing in.
    pub fn with_email_confirmation() -> Self {
        Self {
            require_confirmation: true,
            ..Self::new()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a confirmed account without going through `sign_up`.
    pub fn add_account(&self, email: &str, password: &str) {
        self.lock().accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                profile: Profile::default(),
                confirmed: true,
            },
        );
    }

    /// Mark an account's email as confirmed.
    pub fn confirm_email(&self, email: &str) -> bool {
        match self.lock().accounts.get_mut(email) {
            Some(account) => {
                account.confirmed = true;
                true
            }
            None => false,
        }
    }

    /// Make `email` the signed-in user, as if a session had been restored.
    pub fn restore_session(&self, email: &str) {
        self.lock().current_user = Some(email.to_string());
    }

    pub fn current_user(&self) -> Option<String> {
        self.lock().current_user.clone()
    }

    /// Insert a note for `owner` directly, bypassing the journal.
    pub fn seed_note(&self, owner: &str, title: &str, content: &str) -> NoteId {
        let mut inner = self.lock();
        let created_at = inner.next_timestamp();
        let id = NoteId::new(Uuid::new_v4().to_string());
        inner.notes.entry(owner.to_string()).or_default().push(Note {
            id: id.clone(),
            title: title.to_string(),
            content: content.to_string(),
            created_at,
        });
        id
    }

    /// Profile attributes stored when the account was created.
    pub fn profile_of(&self, email: &str) -> Option<Profile> {
        self.lock().accounts.get(email).map(|a| a.profile.clone())
    }

    /// The owner's collection as the store would return it.
    pub fn notes_of(&self, owner: &str) -> Vec<Note> {
        self.lock().sorted_notes(owner)
    }

    /// Make the next call of `op` fail with `message`.
    pub fn fail_next(&self, op: Operation, message: &str) {
        self.lock().failures.insert(op, message.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

#[async_trait]
impl SessionGateway for MemoryBackend {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &Profile,
    ) -> GatewayResult<Registration> {
        let mut inner = self.lock();
        inner.calls.push(Call::SignUp {
            email: email.to_string(),
        });
        inner.take_failure(Operation::SignUp)?;

        if inner.accounts.contains_key(email) {
            return Err(GatewayFailure::new("User already registered"));
        }
        if password.chars().count() < MIN_SERVER_PASSWORD_LEN {
            return Err(GatewayFailure::new(
                "Password should be at least 6 characters.",
            ));
        }

        let confirmed = !self.require_confirmation;
        inner.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                profile: profile.clone(),
                confirmed,
            },
        );
        if confirmed {
            inner.current_user = Some(email.to_string());
        }

        Ok(Registration {
            session_active: confirmed,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::SignIn {
            email: email.to_string(),
        });
        inner.take_failure(Operation::SignIn)?;

        let account = match inner.accounts.get(email) {
            Some(account) if account.password == password => account,
            _ => return Err(GatewayFailure::new("Invalid login credentials")),
        };
        if !account.confirmed {
            return Err(GatewayFailure::new("Email not confirmed"));
        }

        inner.current_user = Some(email.to_string());
        Ok(())
    }

    async fn sign_out(&self) {
        let mut inner = self.lock();
        inner.calls.push(Call::SignOut);
        inner.current_user = None;
    }

    async fn has_session(&self) -> bool {
        self.lock().current_user.is_some()
    }
}

#[async_trait]
impl NoteStoreGateway for MemoryBackend {
    async fn list_notes(&self) -> GatewayResult<Vec<Note>> {
        let mut inner = self.lock();
        inner.calls.push(Call::ListNotes);
        inner.take_failure(Operation::ListNotes)?;

        let owner = inner.owner()?;
        Ok(inner.sorted_notes(&owner))
    }

    async fn create_note(&self, title: &str, content: &str) -> GatewayResult<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::CreateNote {
            title: title.to_string(),
            content: content.to_string(),
        });
        inner.take_failure(Operation::CreateNote)?;

        let owner = inner.owner()?;
        let created_at = inner.next_timestamp();
        inner.notes.entry(owner).or_default().push(Note {
            id: NoteId::new(Uuid::new_v4().to_string()),
            title: title.to_string(),
            content: content.to_string(),
            created_at,
        });
        Ok(())
    }

    async fn update_note(&self, id: &NoteId, title: &str, content: &str) -> GatewayResult<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::UpdateNote {
            id: id.clone(),
            title: title.to_string(),
            content: content.to_string(),
        });
        inner.take_failure(Operation::UpdateNote)?;

        let owner = inner.owner()?;
        let note = inner
            .notes
            .get_mut(&owner)
            .and_then(|notes| notes.iter_mut().find(|n| &n.id == id))
            .ok_or_else(|| GatewayFailure::new(format!("Note not found: {}", id)))?;
        note.title = title.to_string();
        note.content = content.to_string();
        Ok(())
    }

    async fn delete_note(&self, id: &NoteId) -> GatewayResult<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::DeleteNote { id: id.clone() });
        inner.take_failure(Operation::DeleteNote)?;

        let owner = inner.owner()?;
        let notes = inner.notes.entry(owner).or_default();
        let before = notes.len();
        notes.retain(|n| &n.id != id);
        if notes.len() == before {
            return Err(GatewayFailure::new(format!("Note not found: {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_opens_session_without_confirmation() {
        let backend = MemoryBackend::new();
        let reg = backend
            .sign_up("ada@example.com", "secret1", &profile())
            .await
            .unwrap();
        assert!(reg.session_active);
        assert!(backend.has_session().await);
    }

    #[tokio::test]
    async fn test_sign_up_requires_confirmation_when_configured() {
        let backend = MemoryBackend::with_email_confirmation();
        let reg = backend
            .sign_up("ada@example.com", "secret1", &profile())
            .await
            .unwrap();
        assert!(!reg.session_active);
        assert!(!backend.has_session().await);

        let err = backend.sign_in("ada@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.message, "Email not confirmed");

        assert!(backend.confirm_email("ada@example.com"));
        backend.sign_in("ada@example.com", "secret1").await.unwrap();
        assert_eq!(backend.current_user().as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_rejected() {
        let backend = MemoryBackend::new();
        backend.add_account("ada@example.com", "secret1");
        let err = backend
            .sign_up("ada@example.com", "secret1", &profile())
            .await
            .unwrap_err();
        assert_eq!(err.message, "User already registered");
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password() {
        let backend = MemoryBackend::new();
        backend.add_account("ada@example.com", "secret1");
        let err = backend.sign_in("ada@example.com", "nope").await.unwrap_err();
        assert_eq!(err.message, "Invalid login credentials");
        assert!(!backend.has_session().await);
    }

    #[tokio::test]
    async fn test_notes_require_session() {
        let backend = MemoryBackend::new();
        let err = backend.list_notes().await.unwrap_err();
        assert_eq!(err.message, "Not authenticated");
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_scoped_to_user() {
        let backend = MemoryBackend::new();
        backend.seed_note("ada@example.com", "first", "a");
        backend.seed_note("bob@example.com", "other", "b");
        backend.restore_session("ada@example.com");
        backend.create_note("second", "c").await.unwrap();

        let notes = backend.list_notes().await.unwrap();
        let titles: Vec<_> = notes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let backend = MemoryBackend::new();
        let id = backend.seed_note("ada@example.com", "draft", "x");
        backend.restore_session("ada@example.com");

        backend.update_note(&id, "final", "y").await.unwrap();
        let notes = backend.notes_of("ada@example.com");
        assert_eq!(notes[0].title, "final");
        assert_eq!(notes[0].id, id);

        backend.delete_note(&id).await.unwrap();
        assert!(backend.notes_of("ada@example.com").is_empty());

        let err = backend.delete_note(&id).await.unwrap_err();
        assert!(err.message.starts_with("Note not found"));
    }

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let backend = MemoryBackend::new();
        backend.restore_session("ada@example.com");
        backend.fail_next(Operation::CreateNote, "network error");

        let err = backend.create_note("t", "c").await.unwrap_err();
        assert_eq!(err.message, "network error");
        backend.create_note("t", "c").await.unwrap();

        assert_eq!(
            backend.count_calls(|c| matches!(c, Call::CreateNote { .. })),
            2
        );
        assert_eq!(backend.notes_of("ada@example.com").len(), 1);
    }
}
