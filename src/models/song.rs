use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Field name the document store uses for its own identifier.
pub const INTERNAL_ID: &str = "_id";

/// A song document: the application-level `id` plus whatever else the
/// client sent, passed through untouched.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Song {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Error, Debug, PartialEq)]
pub enum BodyError {
    #[error("body is not valid JSON")]
    NotJson,
    #[error("body is not a JSON object")]
    NotObject,
    #[error("body has no integer id")]
    MissingId,
    #[error("id must be an integer")]
    InvalidId,
    #[error("body has no fields")]
    Empty,
}

/// Parses a request body into a JSON object, dropping any internal id the
/// client tried to set.
pub fn parse_object(body: &[u8]) -> Result<Map<String, Value>, BodyError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(mut map)) => {
            map.remove(INTERNAL_ID);
            Ok(map)
        }
        Ok(_) => Err(BodyError::NotObject),
        Err(_) => Err(BodyError::NotJson),
    }
}

/// Validates the fields of a partial update.
pub fn parse_update(body: &[u8]) -> Result<Map<String, Value>, BodyError> {
    let fields = parse_object(body)?;
    if fields.is_empty() {
        return Err(BodyError::Empty);
    }
    if let Some(id) = fields.get("id") {
        if id.as_i64().is_none() {
            return Err(BodyError::InvalidId);
        }
    }
    Ok(fields)
}

impl Song {
    pub fn from_fields(mut fields: Map<String, Value>) -> Result<Self, BodyError> {
        fields.remove(INTERNAL_ID);
        let id = fields
            .remove("id")
            .and_then(|id| id.as_i64())
            .ok_or(BodyError::MissingId)?;
        Ok(Song { id, fields })
    }

    pub fn from_body(body: &[u8]) -> Result<Self, BodyError> {
        Self::from_fields(parse_object(body)?)
    }

    /// Applies `$set` semantics: every given field overwrites the current
    /// value. Returns whether anything actually changed.
    pub fn merge(&mut self, fields: &Map<String, Value>) -> Result<bool, BodyError> {
        let mut changed = false;
        for (key, value) in fields {
            if key == "id" {
                let id = value.as_i64().ok_or(BodyError::InvalidId)?;
                if id != self.id {
                    self.id = id;
                    changed = true;
                }
                continue;
            }
            if key == INTERNAL_ID {
                continue;
            }
            if self.fields.get(key) != Some(value) {
                self.fields.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        Ok(changed)
    }
}

/// Reads the seed file: a JSON array of song objects with unique integer ids.
pub fn load_fixture(path: &Path) -> anyhow::Result<Vec<Song>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    let entries: Vec<Value> = serde_json::from_str(&raw)
        .with_context(|| format!("fixture {} is not a JSON array", path.display()))?;

    let mut seen = HashSet::new();
    let mut songs = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let Value::Object(fields) = entry else {
            bail!("fixture entry {} is not an object", index);
        };
        let song = Song::from_fields(fields)
            .with_context(|| format!("fixture entry {} is invalid", index))?;
        if !seen.insert(song.id) {
            bail!("fixture has duplicate song id {}", song.id);
        }
        songs.push(song);
    }
    Ok(songs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn serializes_without_internal_id() {
        let song = Song::from_body(br#"{"_id": "abc", "id": 7, "title": "X"}"#).unwrap();
        let value = serde_json::to_value(&song).unwrap();
        assert_eq!(value, json!({"id": 7, "title": "X"}));
    }

    #[test]
    fn rejects_bad_bodies() {
        assert_eq!(Song::from_body(b""), Err(BodyError::NotJson));
        assert_eq!(Song::from_body(b"{not json"), Err(BodyError::NotJson));
        assert_eq!(Song::from_body(b"[1, 2]"), Err(BodyError::NotObject));
        assert_eq!(Song::from_body(br#"{"title": "X"}"#), Err(BodyError::MissingId));
        assert_eq!(Song::from_body(br#"{"id": "7"}"#), Err(BodyError::MissingId));
        assert_eq!(parse_update(br#"{"_id": 1}"#), Err(BodyError::Empty));
        assert_eq!(parse_update(br#"{"id": 1.5}"#), Err(BodyError::InvalidId));
    }

    #[test]
    fn merge_reports_changes() {
        let mut song = Song::from_body(br#"{"id": 1, "title": "A", "year": 1999}"#).unwrap();

        let same = parse_update(br#"{"title": "A"}"#).unwrap();
        assert!(!song.merge(&same).unwrap());

        let patch = parse_update(br#"{"title": "B", "artist": "C"}"#).unwrap();
        assert!(song.merge(&patch).unwrap());
        assert_eq!(
            serde_json::to_value(&song).unwrap(),
            json!({"id": 1, "title": "B", "artist": "C", "year": 1999})
        );
    }

    #[test]
    fn loads_fixture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": 1, "title": "A"}}, {{"id": 2, "_id": {{"$oid": "x"}}}}]"#).unwrap();

        let songs = load_fixture(file.path()).unwrap();
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[1].id, 2);
        assert!(songs[1].fields.is_empty());
    }

    #[test]
    fn fixture_rejects_duplicate_ids() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": 1}}, {{"id": 1}}]"#).unwrap();
        assert!(load_fixture(file.path()).is_err());

        assert!(load_fixture(Path::new("/nonexistent/songs.json")).is_err());
    }
}
