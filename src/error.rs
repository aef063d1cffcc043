use thiserror::Error;

use crate::gateway::GatewayFailure;
use crate::workspace::ActionError;

#[derive(Error, Debug)]
pub enum NotekeepError {
    #[error("Not in a notekeep directory. Run 'notekeep init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .notekeep/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Not signed in. Run 'notekeep login' first.")]
    NotSignedIn,

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Ambiguous note id '{0}'. Use more characters.")]
    AmbiguousId(String),

    #[error("{0}")]
    Form(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Gateway(#[from] GatewayFailure),

    #[error("{0}")]
    Action(#[from] ActionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, NotekeepError>;
