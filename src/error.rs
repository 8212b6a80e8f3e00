use thiserror::Error;

/// Failures surfaced by a [`crate::db::SongStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// Another song already owns this application-level id.
    #[error("song with id {0} already exists")]
    Duplicate(i64),
    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}
