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

//! Small helpers for shaping values inside step bodies.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Wraps anything that is not already an array in a one-element array.
pub fn to_array(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Joins items with `separator`. Strings are used raw, `null` as empty.
pub fn array_to_string(items: &[Value], separator: &str) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(separator)
}

/// Replaces underscores and dashes with spaces and proper-cases each word.
///
/// `human_proper("first_name-LAST")` gives `"First Name Last"`.
pub fn human_proper(text: &str) -> String {
    static WORD: OnceLock<Regex> = OnceLock::new();
    let word = WORD.get_or_init(|| Regex::new(r"\w\S*").expect("static pattern"));

    let spaced = text.replace(['_', '-'], " ");
    word.replace_all(&spaced, |captures: &regex::Captures<'_>| {
        let mut chars = captures[0].chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    })
    .into_owned()
}

/// Splits `object` into the keys not listed and the keys listed.
pub fn split_keys(object: &Map<String, Value>, keys: &[&str]) -> (Map<String, Value>, Map<String, Value>) {
    let mut keep = Map::new();
    let mut split = Map::new();
    for (key, value) in object {
        if keys.contains(&key.as_str()) {
            split.insert(key.clone(), value.clone());
        } else {
            keep.insert(key.clone(), value.clone());
        }
    }
    (keep, split)
}
