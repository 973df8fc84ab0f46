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

//! # Zi Source Module
//!
//! Data sources and the state accessors built on top of path evaluation.
//!
//! | Accessor                     | Reads                                        |
//! |------------------------------|----------------------------------------------|
//! | [`source`]                   | every match of a state path                  |
//! | [`source_value`]             | first match of a state path                  |
//! | [`data_value`]               | first match of a path relative to `data`     |
//! | [`last_reference_value`]     | a path inside the most recent reference      |
//! | [`index`]                    | position of the current `each` item          |
//!
//! A missing match reads as `null`.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::errors::{Result, ZiError};
use crate::selector::{ZiPath, ZiSelector};
use crate::state::ZiState;

/// Where a combinator finds the items it works on.
#[derive(Clone, Debug)]
pub enum ZiDataSource {
    /// Path evaluated against the state document; yields every match.
    Path(String),
    /// Already materialised data.
    Literal(Value),
    /// Computed from the state.
    Selector(ZiSelector),
}

impl ZiDataSource {
    /// Mirrors the truthiness check applied to data-source arguments:
    /// empty paths and null, false, zero or empty-string literals are
    /// rejected. Containers, even empty ones, are accepted.
    pub fn is_falsy(&self) -> bool {
        match self {
            ZiDataSource::Path(path) => path.is_empty(),
            ZiDataSource::Literal(value) => match value {
                Value::Null => true,
                Value::Bool(flag) => !flag,
                Value::Number(number) => number.as_f64() == Some(0.0),
                Value::String(text) => text.is_empty(),
                Value::Array(_) | Value::Object(_) => false,
            },
            ZiDataSource::Selector(_) => false,
        }
    }
}

impl From<&str> for ZiDataSource {
    fn from(path: &str) -> Self {
        ZiDataSource::Path(path.to_string())
    }
}

impl From<String> for ZiDataSource {
    fn from(path: String) -> Self {
        ZiDataSource::Path(path)
    }
}

impl From<Value> for ZiDataSource {
    fn from(value: Value) -> Self {
        ZiDataSource::Literal(value)
    }
}

impl From<ZiSelector> for ZiDataSource {
    fn from(selector: ZiSelector) -> Self {
        ZiDataSource::Selector(selector)
    }
}

/// Turns a data source into concrete data for the given state.
pub fn as_data(source: &ZiDataSource, state: &ZiState) -> Result<Value> {
    match source {
        ZiDataSource::Path(path) => ZiPath::parse(path)?
            .query(&state.to_document())
            .map(Value::Array),
        ZiDataSource::Literal(value) => Ok(value.clone()),
        ZiDataSource::Selector(selector) => selector.select(state),
    }
}

/// Like [`as_data`], but insists on a list of items.
pub fn as_items(source: &ZiDataSource, state: &ZiState) -> Result<Vec<Value>> {
    match as_data(source, state)? {
        Value::Array(items) => Ok(items),
        other => Err(ZiError::validation(format!(
            "data source must resolve to an array, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Picks out every match of `path` in the state.
pub fn source(path: &str) -> ZiSelector {
    let path = ZiPath::deferred(path);
    ZiSelector::new(move |state| path.query(&state.to_document()).map(Value::Array))
}

/// Picks out the first match of `path` in the state, or `null`.
pub fn source_value(path: &str) -> ZiSelector {
    let path = ZiPath::deferred(path);
    ZiSelector::new(move |state| Ok(path.first(&state.to_document())?.unwrap_or(Value::Null)))
}

fn strip_root(path: &str) -> Option<&str> {
    static ROOT: OnceLock<Regex> = OnceLock::new();
    let root = ROOT.get_or_init(|| Regex::new(r"^[$.]*(.+)").expect("static pattern"));
    root.captures(path)
        .and_then(|captures| captures.get(1))
        .map(|rest| rest.as_str())
}

fn rooted(prefix: &str, path: &str) -> String {
    match strip_root(path) {
        Some(rest) if rest.starts_with('[') => format!("{prefix}{rest}"),
        Some(rest) => format!("{prefix}.{rest}"),
        None => path.to_string(),
    }
}

/// Re-roots `path` under `$.data`, dropping any leading `$` or `.`.
///
/// `dataPath("key")` gives `$.data.key`; `dataPath("[*].id")` gives
/// `$.data[*].id`.
pub fn data_path(path: &str) -> String {
    rooted("$.data", path)
}

/// First match of a path relative to `data`.
pub fn data_value(path: &str) -> ZiSelector {
    source_value(&data_path(path))
}

/// Re-roots `path` under `$.references`.
pub fn reference_path(path: &str) -> String {
    rooted("$.references", path)
}

/// Reads `path` inside the most recently appended reference.
pub fn last_reference_value(path: &str) -> ZiSelector {
    source_value(&reference_path(&format!("[-1].{path}")))
}

/// Position of the current item while inside `each`, or `null`.
pub fn index() -> ZiSelector {
    ZiSelector::new(|state| Ok(state.index.map(Value::from).unwrap_or(Value::Null)))
}
