use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, IndexModel,
    bson::{self, Bson, Document, doc},
    error::{Error, ErrorKind, WriteError, WriteFailure},
    options::IndexOptions,
};
use serde_json::{Map, Value};
use tracing::debug;

use super::{SongStore, UpdateOutcome};
use crate::error::StoreError;
use crate::models::song::{INTERNAL_ID, Song};

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoSongStore {
    songs: Collection<Document>,
}

impl MongoSongStore {
    /// Connects and pings the server so a bad host or bad credentials stop
    /// startup instead of surfacing on the first request.
    pub async fn connect(url: &str, database: &str, collection: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(url).await.map_err(StoreError::backend)?;
        let db = client.database(database);
        db.run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(StoreError::backend)?;

        Ok(Self {
            songs: db.collection(collection),
        })
    }

    async fn ensure_unique_id(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.songs
            .create_index(index, None)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }
}

fn is_duplicate_key(err: &Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError {
            code: DUPLICATE_KEY,
            ..
        }))
    )
}

fn to_document(song: &Song) -> Result<Document, StoreError> {
    bson::to_document(song).map_err(StoreError::backend)
}

fn to_song(mut document: Document) -> Result<Song, StoreError> {
    document.remove(INTERNAL_ID);
    let value = Bson::Document(document).into_relaxed_extjson();
    serde_json::from_value(value).map_err(StoreError::backend)
}

#[async_trait]
impl SongStore for MongoSongStore {
    async fn count(&self) -> Result<u64, StoreError> {
        self.songs
            .count_documents(doc! {}, None)
            .await
            .map_err(StoreError::backend)
    }

    async fn list(&self) -> Result<Vec<Song>, StoreError> {
        let cursor = self.songs.find(doc! {}, None).await.map_err(StoreError::backend)?;
        let documents: Vec<Document> = cursor.try_collect().await.map_err(StoreError::backend)?;
        documents.into_iter().map(to_song).collect()
    }

    async fn find(&self, id: i64) -> Result<Option<Song>, StoreError> {
        self.songs
            .find_one(doc! { "id": id }, None)
            .await
            .map_err(StoreError::backend)?
            .map(to_song)
            .transpose()
    }

    async fn insert(&self, song: &Song) -> Result<(), StoreError> {
        let document = to_document(song)?;
        match self.songs.insert_one(document, None).await {
            Ok(result) => {
                debug!("inserted song {} as {}", song.id, result.inserted_id);
                Ok(())
            }
            Err(err) if is_duplicate_key(&err) => Err(StoreError::Duplicate(song.id)),
            Err(err) => Err(StoreError::backend(err)),
        }
    }

    async fn update(
        &self,
        id: i64,
        fields: &Map<String, Value>,
    ) -> Result<UpdateOutcome, StoreError> {
        let set = bson::to_document(fields).map_err(StoreError::backend)?;
        match self
            .songs
            .update_one(doc! { "id": id }, doc! { "$set": set }, None)
            .await
        {
            Ok(result) => Ok(UpdateOutcome {
                matched: result.matched_count,
                modified: result.modified_count,
            }),
            Err(err) if is_duplicate_key(&err) => {
                let target = fields.get("id").and_then(Value::as_i64).unwrap_or(id);
                Err(StoreError::Duplicate(target))
            }
            Err(err) => Err(StoreError::backend(err)),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = self
            .songs
            .delete_one(doc! { "id": id }, None)
            .await
            .map_err(StoreError::backend)?;
        Ok(result.deleted_count == 1)
    }

    async fn replace_all(&self, songs: &[Song]) -> Result<(), StoreError> {
        // Dropping the collection also drops its indexes.
        self.songs.drop(None).await.map_err(StoreError::backend)?;
        self.ensure_unique_id().await?;
        if songs.is_empty() {
            return Ok(());
        }

        let documents = songs
            .iter()
            .map(to_document)
            .collect::<Result<Vec<_>, _>>()?;
        self.songs
            .insert_many(documents, None)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_documents_lose_internal_id() {
        let document = doc! {
            "_id": bson::oid::ObjectId::new(),
            "id": 999_i64,
            "title": "X",
            "plays": 3_i32,
        };
        let song = to_song(document).unwrap();
        assert_eq!(song.id, 999);
        assert_eq!(
            serde_json::to_value(&song).unwrap(),
            serde_json::json!({"id": 999, "title": "X", "plays": 3})
        );
    }

    #[test]
    fn songs_become_documents_with_integer_ids() {
        let song = Song::from_body(br#"{"id": 5, "artist": "Y", "tags": ["a"]}"#).unwrap();
        let document = to_document(&song).unwrap();
        assert_eq!(document.get_i64("id").unwrap(), 5);
        assert_eq!(document.get_str("artist").unwrap(), "Y");
        assert!(!document.contains_key(INTERNAL_ID));
    }
}
