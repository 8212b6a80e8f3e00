use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::{debug, error, info};

use crate::{
    config::ApiMode,
    db::SongStore,
    error::StoreError,
    models::song::{Song, parse_update},
};

/// Turns song requests into store calls and picks the status code.
pub struct SongController {
    store: Arc<dyn SongStore>,
    mode: ApiMode,
}

fn message(status: StatusCode, text: String) -> Response {
    (status, Json(json!({"message": text}))).into_response()
}

// Create and update answer with a capitalized key.
fn capital_message(status: StatusCode, text: String) -> Response {
    (status, Json(json!({"Message": text}))).into_response()
}

fn internal_error(operation: &str, err: StoreError) -> Response {
    error!("Failed to {}: {}", operation, err);
    message(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

impl SongController {
    pub fn new(store: Arc<dyn SongStore>, mode: ApiMode) -> Self {
        SongController { store, mode }
    }

    fn conflict(&self, id: i64) -> Response {
        capital_message(
            self.mode.conflict(),
            format!("Song with id {} already present", id),
        )
    }

    pub async fn count(&self) -> Response {
        match self.store.count().await {
            Ok(count) => message(StatusCode::OK, format!("{} songs available", count)),
            Err(e) => internal_error("count songs", e),
        }
    }

    pub async fn list(&self) -> Response {
        match self.store.list().await {
            Ok(songs) if songs.is_empty() => {
                message(StatusCode::NOT_FOUND, "No songs found".to_string())
            }
            Ok(songs) => (StatusCode::OK, Json(json!({"songs": songs}))).into_response(),
            Err(e) => internal_error("list songs", e),
        }
    }

    pub async fn get(&self, id: i64) -> Response {
        match self.store.find(id).await {
            Ok(Some(song)) => (StatusCode::OK, Json(song)).into_response(),
            Ok(None) => message(
                StatusCode::NOT_FOUND,
                format!("song with id {} not found", id),
            ),
            Err(e) => internal_error("fetch song", e),
        }
    }

    pub async fn create(&self, body: &[u8]) -> Response {
        let song = match Song::from_body(body) {
            Ok(song) => song,
            Err(e) => {
                debug!("Rejected new song: {}", e);
                return capital_message(self.mode.bad_input(), "Invalid JSON data".to_string());
            }
        };

        match self.store.find(song.id).await {
            Ok(Some(_)) => return self.conflict(song.id),
            Ok(None) => {}
            Err(e) => return internal_error("check for existing song", e),
        }

        match self.store.insert(&song).await {
            Ok(()) => {
                info!("Added song {}", song.id);
                capital_message(
                    StatusCode::CREATED,
                    format!("Song {} added successfully", song.id),
                )
            }
            // Lost a race against a concurrent create with the same id.
            Err(StoreError::Duplicate(id)) => self.conflict(id),
            Err(e) => internal_error("insert song", e),
        }
    }

    pub async fn update(&self, id: i64, body: &[u8]) -> Response {
        let fields = match parse_update(body) {
            Ok(fields) => fields,
            Err(e) => {
                debug!("Rejected update for song {}: {}", id, e);
                return capital_message(self.mode.bad_input(), "Invalid update data".to_string());
            }
        };

        match self.store.update(id, &fields).await {
            Ok(outcome) if outcome.modified == 0 => {
                debug!("Update of song {} matched {}, changed nothing", id, outcome.matched);
                message(
                    StatusCode::NOT_FOUND,
                    format!("No song with id {} found or nothing to update", id),
                )
            }
            Ok(_) => {
                info!("Updated song {}", id);
                message(
                    StatusCode::OK,
                    format!("Song with id {} updated successfully", id),
                )
            }
            Err(StoreError::Duplicate(target)) => self.conflict(target),
            Err(e) => internal_error("update song", e),
        }
    }

    pub async fn delete(&self, id: i64) -> Response {
        match self.store.delete(id).await {
            Ok(true) => {
                info!("Deleted song {}", id);
                StatusCode::NO_CONTENT.into_response()
            }
            Ok(false) => message(
                self.mode.delete_missing(),
                format!("song with id {} not found", id),
            ),
            Err(e) => internal_error("delete song", e),
        }
    }
}
