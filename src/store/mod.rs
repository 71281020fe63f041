//! Object storage seen through the table-scoped operations the compactor needs.

mod object;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use self::object::ObjectShardStore;
use crate::shard::ShardDescriptor;

/// Durable home of every table's shard files.
///
/// Implementations own transport concerns (auth, retries, hedging). The compactor
/// only relies on `put_file` being all-or-nothing from a reader's point of view.
#[async_trait]
pub trait ShardStore: Send + Sync {
    /// Shard files directly under `table`, in no particular order.
    async fn list(&self, table: &str) -> Result<Vec<ShardDescriptor>, StoreError>;

    /// Raw stored bytes of one shard file.
    async fn get_file(&self, table: &str, name: &str) -> Result<Bytes, StoreError>;

    /// Store `body` as `name` under `table`, replacing any previous object.
    async fn put_file(&self, table: &str, name: &str, body: Bytes) -> Result<(), StoreError>;

    /// Remove one shard file.
    async fn delete_file(&self, table: &str, name: &str) -> Result<(), StoreError>;
}

/// Errors surfaced by a [`ShardStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying object store rejected the request.
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}
