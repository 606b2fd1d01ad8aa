//! Storage seam for context inference.
//!
//! The engines only ever read through [`TrackerStore`]. [`SqliteStore`] is the
//! on-disk implementation; it also carries the writer helpers that the ticket
//! workflow and test fixtures use.

pub mod config;
pub mod error;
pub mod paths;
pub mod sqlite_store;

pub use config::TrekConfig;
pub use error::StoreError;
pub use paths::TrekPaths;
pub use sqlite_store::SqliteStore;

use trek_core::{ProjectSnapshot, SessionSnapshot, TicketSnapshot};

/// Read-only view of ticket, session, and project records.
///
/// Implementations report failures instead of hiding them; it is the
/// caller's job to decide whether a failure degrades to "absent".
pub trait TrackerStore {
    /// Fetch a ticket joined with its owning project id.
    fn get_ticket(&self, id: &str) -> Result<Option<TicketSnapshot>, StoreError>;

    /// Fetch a session, or `None` if it does not exist or has ended.
    fn get_active_session(&self, id: &str) -> Result<Option<SessionSnapshot>, StoreError>;

    /// All sessions without an end timestamp, in insertion order.
    fn list_active_sessions(&self) -> Result<Vec<SessionSnapshot>, StoreError>;

    fn get_project(&self, id: &str) -> Result<Option<ProjectSnapshot>, StoreError>;
}

impl<T: TrackerStore + ?Sized> TrackerStore for &T {
    fn get_ticket(&self, id: &str) -> Result<Option<TicketSnapshot>, StoreError> {
        (**self).get_ticket(id)
    }

    fn get_active_session(&self, id: &str) -> Result<Option<SessionSnapshot>, StoreError> {
        (**self).get_active_session(id)
    }

    fn list_active_sessions(&self) -> Result<Vec<SessionSnapshot>, StoreError> {
        (**self).list_active_sessions()
    }

    fn get_project(&self, id: &str) -> Result<Option<ProjectSnapshot>, StoreError> {
        (**self).get_project(id)
    }
}

impl<T: TrackerStore + ?Sized> TrackerStore for std::sync::Arc<T> {
    fn get_ticket(&self, id: &str) -> Result<Option<TicketSnapshot>, StoreError> {
        (**self).get_ticket(id)
    }

    fn get_active_session(&self, id: &str) -> Result<Option<SessionSnapshot>, StoreError> {
        (**self).get_active_session(id)
    }

    fn list_active_sessions(&self) -> Result<Vec<SessionSnapshot>, StoreError> {
        (**self).list_active_sessions()
    }

    fn get_project(&self, id: &str) -> Result<Option<ProjectSnapshot>, StoreError> {
        (**self).get_project(id)
    }
}
