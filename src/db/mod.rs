use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::info;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::song::Song;

mod memory;
mod mongo;

pub use memory::InMemorySongStore;
pub use mongo::MongoSongStore;

/// Result of a partial update.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

/// The single source of truth for song documents.
///
/// Implementations guarantee at most one song per `id`: a conflicting
/// insert or update fails with [`StoreError::Duplicate`].
#[async_trait]
pub trait SongStore: Send + Sync {
    async fn count(&self) -> Result<u64, StoreError>;

    async fn list(&self) -> Result<Vec<Song>, StoreError>;

    async fn find(&self, id: i64) -> Result<Option<Song>, StoreError>;

    async fn insert(&self, song: &Song) -> Result<(), StoreError>;

    /// Merges `fields` into the song with the given id.
    async fn update(
        &self,
        id: i64,
        fields: &Map<String, Value>,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Returns whether a song was removed.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Drops everything and replaces it with `songs`.
    async fn replace_all(&self, songs: &[Song]) -> Result<(), StoreError>;
}

pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn SongStore>, StoreError> {
    match config {
        StoreConfig::Mongo(mongo) => {
            info!("connecting to url: {}", mongo.redacted_url());
            let store =
                MongoSongStore::connect(&mongo.url(), &mongo.database, &mongo.collection).await?;
            info!("📊 Connected to MongoDB {}.{}", mongo.database, mongo.collection);
            Ok(Arc::new(store))
        }
        StoreConfig::Memory => {
            info!("📊 Using in-memory song store");
            Ok(Arc::new(InMemorySongStore::new()))
        }
    }
}
