//! # QMS Infrastructure
//!
//! Concrete implementations of the ports defined in `qms-core`.
//! This crate contains the HTTP transport, the durable session storage
//! backends and the notifiers.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory and file storage only
//! - `http` - reqwest-based REST transport
//! - `redis` - Redis-backed session storage shared between processes

pub mod notify;
pub mod storage;

#[cfg(feature = "http")]
pub mod transport;

// Re-exports - In-Memory / local
pub use notify::{RecordingNotifier, TracingNotifier};
pub use storage::{FileStorage, InMemoryStorage};

#[cfg(feature = "http")]
pub use transport::{HttpConfig, ReqwestTransport};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use storage::{RedisConfig, RedisStorage};
