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

#![allow(non_snake_case)]

use std::io::Write;

use serde_json::json;
use zi_job::state::{compose_next_state, ZiState};
use zi_job::trail::ZiTrailEntry;
use zi_job::ZiError;

#[test]
fn ZiFTStateComposeNextAppendsPreviousData() {
    let state = ZiState::new(json!({"a": 1})).with_references(vec![json!("first")]);
    let next = compose_next_state(&state, json!({"b": 2}));

    assert_eq!(next.data, json!({"b": 2}));
    assert_eq!(next.references, vec![json!("first"), json!({"a": 1})]);
    assert_eq!(state.references.len(), 1);
}

#[test]
fn ZiFTStateComposeNextKeepsOtherKeys() {
    let state = ZiState::new(json!(1))
        .with_configuration(json!({"user": "admin"}))
        .with_extra("logger", json!("stdout"));
    let next = state.compose_next(json!(2));

    assert_eq!(next.configuration, Some(json!({"user": "admin"})));
    assert_eq!(next.get("logger"), Some(json!("stdout")));
}

#[test]
fn ZiFTStateDocumentShape() {
    let state = ZiState::new(json!({"x": 1}))
        .with_references(vec![json!(0)])
        .with_trail_entry(ZiTrailEntry::success("create", vec![json!("Account")]));
    let document = state.to_document();

    assert_eq!(document["data"], json!({"x": 1}));
    assert_eq!(document["references"], json!([0]));
    assert_eq!(document["history"][0]["finalOperands"], json!(["Account"]));
    assert_eq!(document["history"][0]["status"], json!(0));
    assert!(document.get("index").is_none());
}

#[test]
fn ZiFTStateSerializationMatchesDocument() {
    let state = ZiState::new(json!([1, 2]))
        .with_configuration(json!({"key": "secret"}))
        .with_extra("cursor", json!("2024-01-01"));

    assert_eq!(serde_json::to_value(&state).unwrap(), state.to_document());
}

#[test]
fn ZiFTStateMissingKeysTakeDefaults() {
    let state = ZiState::from_value(json!({})).unwrap();
    assert_eq!(state.data, serde_json::Value::Null);
    assert!(state.references.is_empty());
    assert!(state.trail().is_empty());
}

#[test]
fn ZiFTStateRejectsNonObjectDocument() {
    assert!(matches!(
        ZiState::from_value(json!([1, 2, 3])),
        Err(ZiError::Validation { .. })
    ));
}

#[test]
fn ZiFTStateLoadsFromFile() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "{}",
        json!({"data": {"patients": []}, "references": [1], "configuration": {"token": "t"}})
    )
    .unwrap();

    let state = ZiState::from_path(file.path()).unwrap();
    assert_eq!(state.data, json!({"patients": []}));
    assert_eq!(state.references, vec![json!(1)]);
    assert_eq!(state.configuration, Some(json!({"token": "t"})));
}

#[test]
fn ZiFTStateScopedSetsItemAndIndex() {
    let state = ZiState::new(json!([10, 20])).with_references(vec![json!("r")]);
    let scoped = state.scoped(json!(20), 1);

    assert_eq!(scoped.data, json!(20));
    assert_eq!(scoped.index, Some(1));
    assert_eq!(scoped.references, vec![json!("r")]);
}
