//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zi.
//! The Zi project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Zi State Module
//!
//! [`ZiState`] is the single value threaded through a job. Every step
//! receives one and produces the next; nothing in the crate mutates a state
//! that has already been handed to a step.
//!
//! ## Layout
//!
//! A state serializes to a JSON object:
//!
//! ```json
//! {
//!   "data": {"...": "current working document"},
//!   "references": [{"id": "earlier data"}],
//!   "configuration": {"username": "..."},
//!   "index": 0,
//!   "history": [{"type": "operation", "name": "create", "status": 0, "finalOperands": []}],
//!   "anyOtherKey": "preserved"
//! }
//! ```
//!
//! That object is the document state paths such as `$.data.items[*]` or
//! `$.references[-1].id` are evaluated against.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{Result, ZiError};
use crate::trail::ZiTrailEntry;

/// Additional top-level keys carried by a state.
pub type ZiMetadata = Map<String, Value>;

/// The value threaded through every step of a job.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ZiState {
    /// Current working document.
    #[serde(default)]
    pub data: Value,

    /// Previously produced `data` values, oldest first. Only ever appended to.
    #[serde(default)]
    pub references: Vec<Value>,

    /// Credentials and settings supplied by whoever runs the job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Value>,

    /// Zero-based position of the current item while inside `each`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,

    /// Execution trail, present once a trail-wrapped step has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<ZiTrailEntry>>,

    /// Arbitrary additional keys, preserved by every combinator.
    #[serde(flatten)]
    pub extra: ZiMetadata,
}

impl ZiState {
    /// Constructs a state around a working document with no references.
    pub fn new(data: Value) -> Self {
        ZiState {
            data,
            ..Default::default()
        }
    }

    /// Replaces the reference list.
    pub fn with_references(mut self, references: Vec<Value>) -> Self {
        self.references = references;
        self
    }

    /// Attaches a configuration blob.
    pub fn with_configuration(mut self, configuration: Value) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Sets an additional top-level key.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Returns the state with `data` replaced and everything else kept.
    pub fn with_data(self, data: Value) -> Self {
        ZiState { data, ..self }
    }

    /// State handed to one iteration of `each`.
    pub fn scoped(self, item: Value, index: usize) -> Self {
        ZiState {
            data: item,
            index: Some(index),
            ..self
        }
    }

    /// Recorded trail entries, oldest first.
    pub fn trail(&self) -> &[ZiTrailEntry] {
        self.history.as_deref().unwrap_or(&[])
    }

    /// Returns the state with `entry` appended to its trail.
    pub fn with_trail_entry(mut self, entry: ZiTrailEntry) -> Self {
        self.history.get_or_insert_with(Vec::new).push(entry);
        self
    }

    /// Looks up a top-level key of the state document.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "data" => Some(self.data.clone()),
            "references" => Some(Value::Array(self.references.clone())),
            "configuration" => self.configuration.clone(),
            "index" => self.index.map(Value::from),
            "history" => self
                .history
                .as_ref()
                .map(|entries| Value::Array(entries.iter().map(ZiTrailEntry::to_value).collect())),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Builds the JSON document path expressions are evaluated against.
    pub fn to_document(&self) -> Value {
        let mut document = Map::new();
        for (key, value) in &self.extra {
            document.insert(key.clone(), value.clone());
        }
        document.insert("data".into(), self.data.clone());
        document.insert("references".into(), Value::Array(self.references.clone()));
        if let Some(configuration) = &self.configuration {
            document.insert("configuration".into(), configuration.clone());
        }
        if let Some(index) = self.index {
            document.insert("index".into(), Value::from(index));
        }
        if let Some(history) = &self.history {
            document.insert(
                "history".into(),
                Value::Array(history.iter().map(ZiTrailEntry::to_value).collect()),
            );
        }
        Value::Object(document)
    }

    /// Reads a state from a JSON document. Missing keys take their defaults.
    pub fn from_value(document: Value) -> Result<Self> {
        if !document.is_object() {
            return Err(ZiError::validation("state document must be a JSON object"));
        }
        Ok(serde_json::from_value(document)?)
    }

    /// Reads a state from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_value(serde_json::from_str(&text)?)
    }

    /// Prepares the state that follows a step which produced `response`:
    /// `response` becomes `data` and the previous `data` is appended to
    /// `references`.
    pub fn compose_next(self, response: Value) -> Self {
        let ZiState {
            data,
            mut references,
            configuration,
            index,
            history,
            extra,
        } = self;
        references.push(data);
        ZiState {
            data: response,
            references,
            configuration,
            index,
            history,
            extra,
        }
    }
}

/// Free-function form of [`ZiState::compose_next`].
pub fn compose_next_state(state: &ZiState, response: Value) -> ZiState {
    state.clone().compose_next(response)
}
