//! Query cache.
//!
//! Entries are keyed by endpoint and arguments and tagged with the tags their
//! query provides. A successful mutation invalidates its tags: subscribed
//! entries are refetched, unsubscribed ones dropped.

mod endpoint;
mod entry;
mod key;
mod query_cache;

pub use endpoint::{MutationEndpoint, QueryEndpoint};
pub use entry::{EntrySnapshot, QueryStatus};
pub use key::CacheKey;
pub use query_cache::{CacheConfig, QueryCache, QueryOptions, Subscription};
