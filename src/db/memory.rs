use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{SongStore, UpdateOutcome};
use crate::error::StoreError;
use crate::models::song::Song;

/// Process-local store. Every mutation happens under one write lock, so the
/// duplicate check and the insert are atomic.
#[derive(Default)]
pub struct InMemorySongStore {
    songs: RwLock<BTreeMap<i64, Song>>,
}

impl InMemorySongStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SongStore for InMemorySongStore {
    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.songs.read().await.len() as u64)
    }

    async fn list(&self) -> Result<Vec<Song>, StoreError> {
        Ok(self.songs.read().await.values().cloned().collect())
    }

    async fn find(&self, id: i64) -> Result<Option<Song>, StoreError> {
        Ok(self.songs.read().await.get(&id).cloned())
    }

    async fn insert(&self, song: &Song) -> Result<(), StoreError> {
        let mut songs = self.songs.write().await;
        if songs.contains_key(&song.id) {
            return Err(StoreError::Duplicate(song.id));
        }
        songs.insert(song.id, song.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: i64,
        fields: &Map<String, Value>,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut songs = self.songs.write().await;
        let Some(current) = songs.get(&id) else {
            return Ok(UpdateOutcome::default());
        };

        let mut updated = current.clone();
        let changed = updated.merge(fields).map_err(StoreError::backend)?;
        if !changed {
            return Ok(UpdateOutcome {
                matched: 1,
                modified: 0,
            });
        }
        if updated.id != id && songs.contains_key(&updated.id) {
            return Err(StoreError::Duplicate(updated.id));
        }

        songs.remove(&id);
        songs.insert(updated.id, updated);
        Ok(UpdateOutcome {
            matched: 1,
            modified: 1,
        })
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.songs.write().await.remove(&id).is_some())
    }

    async fn replace_all(&self, songs: &[Song]) -> Result<(), StoreError> {
        let mut current = self.songs.write().await;
        current.clear();
        for song in songs {
            if current.insert(song.id, song.clone()).is_some() {
                return Err(StoreError::Duplicate(song.id));
            }
        }
        Ok(())
    }
}
