pub mod auth;
pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod search;
pub mod session;
pub mod workspace;

pub use error::{NotekeepError, Result};
pub use gateway::{GatewayFailure, MemoryBackend, NoteStoreGateway, RestBackend, SessionGateway};
pub use session::{Screen, SessionGate};
pub use workspace::Workspace;
