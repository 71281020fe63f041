use std::{sync::Arc, time::SystemTime};

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{path::Path, ObjectStore};

use super::{ShardStore, StoreError};
use crate::{observability::log_debug, shard::ShardDescriptor};

/// [`ShardStore`] over any `object_store` backend. Table `t` lives at `<prefix>/t/`.
///
/// A table emptied by retention has all its files deleted but no separate prefix removal:
/// object stores have no directories to remove. With
/// [`LocalFileSystem`](object_store::local::LocalFileSystem), build the backend with
/// `with_automatic_cleanup(true)` so the table directory disappears with its last file.
#[derive(Debug, Clone)]
pub struct ObjectShardStore {
    store: Arc<dyn ObjectStore>,
    prefix: Path,
}

impl ObjectShardStore {
    /// Tables live at the root of `store`.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        ObjectShardStore {
            store,
            prefix: Path::default(),
        }
    }

    /// Tables live beneath `prefix`.
    pub fn with_prefix(self, prefix: impl Into<Path>) -> Self {
        ObjectShardStore {
            prefix: prefix.into(),
            ..self
        }
    }

    fn table_path(&self, table: &str) -> Path {
        self.prefix.child(table)
    }

    fn file_path(&self, table: &str, name: &str) -> Path {
        self.table_path(table).child(name)
    }
}

#[async_trait]
impl ShardStore for ObjectShardStore {
    async fn list(&self, table: &str) -> Result<Vec<ShardDescriptor>, StoreError> {
        let prefix = self.table_path(table);
        let listed = self.store.list_with_delimiter(Some(&prefix)).await?;
        let shards = listed
            .objects
            .into_iter()
            .filter_map(|meta| {
                let name = meta.location.filename()?.to_string();
                Some(ShardDescriptor {
                    name,
                    last_modified: SystemTime::from(meta.last_modified),
                    size: meta.size as u64,
                })
            })
            .collect::<Vec<_>>();
        log_debug!(
            component = "store",
            event = "table_listed",
            table = %table,
            count = shards.len(),
        );
        Ok(shards)
    }

    async fn get_file(&self, table: &str, name: &str) -> Result<Bytes, StoreError> {
        let location = self.file_path(table, name);
        Ok(self.store.get(&location).await?.bytes().await?)
    }

    async fn put_file(&self, table: &str, name: &str, body: Bytes) -> Result<(), StoreError> {
        let location = self.file_path(table, name);
        self.store.put(&location, body.into()).await?;
        Ok(())
    }

    async fn delete_file(&self, table: &str, name: &str) -> Result<(), StoreError> {
        let location = self.file_path(table, name);
        self.store.delete(&location).await?;
        Ok(())
    }
}
