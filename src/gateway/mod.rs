//! Boundaries to the remote identity service and the remote note store.
//!
//! The core only ever sees these two traits. Every call resolves into an
//! explicit `Result<_, GatewayFailure>`; transport details stay inside the
//! implementations.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::{Note, NoteId};

pub use memory::MemoryBackend;
pub use rest::RestBackend;

/// Failure reported by a gateway, carrying the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GatewayFailure {
    pub message: String,
}

impl GatewayFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for GatewayFailure {
    fn from(e: reqwest::Error) -> Self {
        GatewayFailure::new(e.to_string())
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayFailure>;

/// Profile attributes attached to a new account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
}

/// Result of a successful sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// The service issued a live session right away (no mandatory email
    /// confirmation).
    pub session_active: bool,
}

#[async_trait]
pub trait SessionGateway: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &Profile,
    ) -> GatewayResult<Registration>;

    async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<()>;

    /// Best effort. Callers do not branch on the outcome.
    async fn sign_out(&self);

    /// Whether a previously established session is available without
    /// presenting credentials again.
    async fn has_session(&self) -> bool;
}

/// Note persistence, implicitly scoped to the current session.
#[async_trait]
pub trait NoteStoreGateway: Send + Sync {
    /// All notes, newest `created_at` first.
    async fn list_notes(&self) -> GatewayResult<Vec<Note>>;

    async fn create_note(&self, title: &str, content: &str) -> GatewayResult<()>;

    async fn update_note(&self, id: &NoteId, title: &str, content: &str) -> GatewayResult<()>;

    async fn delete_note(&self, id: &NoteId) -> GatewayResult<()>;
}
