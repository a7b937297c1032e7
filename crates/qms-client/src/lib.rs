//! # QMS Client
//!
//! The data layer of the QuickMySlot admin dashboard.
//!
//! - [`cache`] - query cache keyed by endpoint and arguments, with tag-based
//!   invalidation and request de-duplication
//! - [`session`] - the session store gating every protected request
//! - [`view`] - loading/error/success state machines bound to the cache
//! - [`api`] - endpoint declarations for every backend resource
//! - [`AdminClient`] - wires the above together
//!
//! Everything that spawns work expects to run inside a Tokio runtime.

pub mod api;
pub mod cache;
mod client;
pub mod error;
pub mod session;
pub mod view;

#[cfg(test)]
mod test_support;

pub use cache::{CacheConfig, CacheKey, EntrySnapshot, MutationEndpoint, QueryCache, QueryEndpoint, QueryOptions, QueryStatus, Subscription};
pub use client::AdminClient;
pub use session::SessionStore;
pub use view::{MutationView, QueryView, ViewState};
