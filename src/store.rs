//! Persisted per-run inputs
//!
//! The management surface that edits configurations is external; the core
//! only consumes its documents. A `RunDocument` carries the base color
//! buffer plus the transform and variable lists; a `PlaylistDocument`
//! sequences run configs over time.

use crate::color::Color;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

fn one() -> f64 {
    1.0
}

/// A variable binding attached to one transform parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingSpec {
    /// Parameter name the binding drives
    pub name: String,
    /// Stable id of the variable instance supplying the value
    pub variable_id: i64,
    #[serde(default = "one")]
    pub multiply: f64,
    #[serde(default)]
    pub add: f64,
}

/// One transform instance in the persisted pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformSpec {
    pub id: i64,
    pub kind: String,
    pub order: i64,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub variable_bindings: Vec<BindingSpec>,
}

/// One variable instance in the persisted set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSpec {
    pub id: i64,
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub params: Value,
}

/// Everything needed to start one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDocument {
    /// Base color buffer, length N
    pub lights: Vec<Color>,
    #[serde(default)]
    pub transforms: Vec<TransformSpec>,
    #[serde(default)]
    pub variables: Vec<VariableSpec>,
}

/// One playlist entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub config_id: i64,
    #[serde(default = "one")]
    pub duration_multiplier: f64,
}

/// A playlist of run configs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistDocument {
    pub base_duration_secs: f64,
    #[serde(default)]
    pub entries: Vec<PlaylistEntry>,
}

/// Source of persisted run inputs
pub trait ConfigStore {
    /// Load the run inputs for a config, or the current working set when
    /// `config_id` is `None`
    fn load_run(&self, config_id: Option<i64>) -> Result<RunDocument, Error>;

    fn load_playlist(&self, playlist_id: i64) -> Result<PlaylistDocument, Error>;
}

/// Store backed by a directory of JSON documents
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, file: &str) -> Result<T, Error> {
        let path = self.root.join(file);
        let raw = fs::read_to_string(&path)
            .map_err(|e| Error::store(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw).map_err(|e| Error::store(format!("{}: {e}", path.display())))
    }
}

impl ConfigStore for JsonStore {
    fn load_run(&self, config_id: Option<i64>) -> Result<RunDocument, Error> {
        match config_id {
            Some(id) => self.read_json(&format!("run-{id}.json")),
            None => self.read_json("run.json"),
        }
    }

    fn load_playlist(&self, playlist_id: i64) -> Result<PlaylistDocument, Error> {
        self.read_json(&format!("playlist-{playlist_id}.json"))
    }
}

/// In-memory store for tests and embedding
#[derive(Default)]
pub struct MemoryStore {
    pub current: Option<RunDocument>,
    pub runs: std::collections::HashMap<i64, RunDocument>,
    pub playlists: std::collections::HashMap<i64, PlaylistDocument>,
}

impl ConfigStore for MemoryStore {
    fn load_run(&self, config_id: Option<i64>) -> Result<RunDocument, Error> {
        match config_id {
            Some(id) => self
                .runs
                .get(&id)
                .cloned()
                .ok_or_else(|| Error::store(format!("no run config {id}"))),
            None => self
                .current
                .clone()
                .ok_or_else(|| Error::store("no current run config")),
        }
    }

    fn load_playlist(&self, playlist_id: i64) -> Result<PlaylistDocument, Error> {
        self.playlists
            .get(&playlist_id)
            .cloned()
            .ok_or_else(|| Error::store(format!("no playlist {playlist_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_document_parse() {
        let doc: RunDocument = serde_json::from_value(json!({
            "lights": [
                { "r": 1.0, "g": 1.0, "b": 1.0 },
                { "r": 0.0, "g": 0.0, "b": 0.0, "w": 0.5, "a": 1.0 }
            ],
            "transforms": [
                {
                    "id": 1,
                    "kind": "brightness",
                    "order": 10,
                    "params": { "brightness": 0.5 },
                    "variable_bindings": [
                        { "name": "brightness", "variable_id": 7, "multiply": 2.0 }
                    ]
                }
            ],
            "variables": [
                { "id": 7, "kind": "random", "name": "Rand", "params": {} }
            ]
        }))
        .unwrap();

        assert_eq!(doc.lights.len(), 2);
        assert_eq!(doc.lights[0].a, 1.0);
        assert_eq!(doc.lights[1].w, 0.5);
        assert_eq!(doc.transforms[0].kind, "brightness");
        assert_eq!(doc.transforms[0].variable_bindings[0].multiply, 2.0);
        assert_eq!(doc.transforms[0].variable_bindings[0].add, 0.0);
        assert_eq!(doc.variables[0].name, "Rand");
    }

    #[test]
    fn test_playlist_parse() {
        let doc: PlaylistDocument = serde_json::from_value(json!({
            "base_duration_secs": 30.0,
            "entries": [
                { "config_id": 1 },
                { "config_id": 2, "duration_multiplier": 0.5 }
            ]
        }))
        .unwrap();
        assert_eq!(doc.entries.len(), 2);
        assert_eq!(doc.entries[0].duration_multiplier, 1.0);
    }

    #[test]
    fn test_memory_store_missing_is_error() {
        let store = MemoryStore::default();
        assert!(store.load_run(None).is_err());
        assert!(store.load_playlist(1).is_err());
    }
}
