//! Durable storage implementations - file, Redis and in-memory.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::InMemoryStorage;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisConfig, RedisStorage};

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio::sync::broadcast;
use uuid::Uuid;

use qms_core::ports::StorageChange;

/// Turns a broadcast receiver into the change stream of one handle,
/// skipping that handle's own writes.
pub(crate) fn change_stream(
    receiver: broadcast::Receiver<StorageChange>,
    origin: Uuid,
) -> BoxStream<'static, StorageChange> {
    stream::unfold(receiver, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(change) => return Some((change, rx)),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    tracing::warn!(lagged = count, "Storage change listener lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .filter(move |change| futures::future::ready(change.origin != origin))
    .boxed()
}
