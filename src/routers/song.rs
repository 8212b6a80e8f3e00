// Song routes
use axum::{
    Router,
    body::Bytes,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::state::AppState;

pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route("/count", get(count_route))
        .route("/song", get(list_songs_route).post(create_song_route))
        .route(
            "/song/{id}",
            get(get_song_route)
                .put(update_song_route)
                .delete(delete_song_route),
        )
}

/// Only integer ids match; anything else is treated as an unknown route.
fn song_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, Response> {
    id.map(|Path(id)| id)
        .map_err(|_| StatusCode::NOT_FOUND.into_response())
}

pub async fn count_route(State(state): State<AppState>) -> Response {
    state.songs.count().await
}

pub async fn list_songs_route(State(state): State<AppState>) -> Response {
    state.songs.list().await
}

pub async fn get_song_route(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    match song_id(id) {
        Ok(id) => state.songs.get(id).await,
        Err(response) => response,
    }
}

pub async fn create_song_route(State(state): State<AppState>, body: Bytes) -> Response {
    state.songs.create(&body).await
}

pub async fn update_song_route(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> Response {
    match song_id(id) {
        Ok(id) => state.songs.update(id, &body).await,
        Err(response) => response,
    }
}

pub async fn delete_song_route(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    match song_id(id) {
        Ok(id) => state.songs.delete(id).await,
        Err(response) => response,
    }
}
