//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod credentials;
mod notify;
mod storage;
mod transport;

pub use credentials::CredentialProvider;
pub use notify::{NotificationLevel, Notifier};
pub use storage::{KeyValueStorage, StorageChange, StorageError};
pub use transport::{Transport, TransportError, TransportResponse};
