use std::sync::Arc;

use crate::{config::ApiMode, controllers::SongController, db::SongStore};

#[derive(Clone)]
pub struct AppState {
    pub songs: Arc<SongController>,
}

impl AppState {
    pub fn new(store: Arc<dyn SongStore>, mode: ApiMode) -> Self {
        AppState {
            songs: Arc::new(SongController::new(store, mode)),
        }
    }
}
