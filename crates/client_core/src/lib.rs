//! Client side of the operations backend: HTTP transport, session, entity
//! stores and the application state that ties them together.

pub mod app;
pub mod credentials;
pub mod error;
pub mod navigation;
pub mod resources;
pub mod session;
pub mod store;
pub mod transport;

pub use app::{AppState, ScheduleSnapshot};
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::ClientError;
pub use navigation::{gate, Gate, Route};
pub use session::{SessionState, SessionStore};
pub use store::{EntityStore, RefreshOutcome, Resource, StorePhase, StoreSnapshot};
pub use transport::{ApiClient, ClientEvent};

#[cfg(test)]
#[path = "tests/mock_backend.rs"]
mod mock_backend;
