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

use proptest::prelude::*;
use serde_json::{json, Value};
use zi_job::lazy::{field, fields};
use zi_job::operation::{operation, operation_async, operation_outcome, ZiOp, ZiOutcome};
use zi_job::pipeline::execute;
use zi_job::scope::{beta, each, join, merge};
use zi_job::source::{data_path, data_value, index, last_reference_value};
use zi_job::state::ZiState;
use zi_job::ZiError;

/// Pushes `{index, item}` onto the references and replaces `data` with a
/// marker, so both the order and the data handling are visible.
fn ZiFTRecordIndex() -> ZiOp {
    operation("record_index", |state| {
        let position = index().select(&state)?;
        let entry = json!({"index": position, "item": state.data.clone()});
        let mut next = state.compose_next(json!("touched"));
        next.references.push(entry);
        Ok(next)
    })
}

fn ZiFTRecordIndexPending() -> ZiOp {
    operation_async("record_index_async", |state: ZiState| async move {
        let entry = json!({"index": state.index, "item": state.data.clone()});
        let mut next = state.compose_next(json!("touched"));
        next.references.push(entry);
        Ok(next)
    })
}

fn ZiFTRecorded(state: &ZiState) -> Vec<Value> {
    state
        .references
        .iter()
        .filter(|entry| entry.get("index").is_some())
        .cloned()
        .collect()
}

#[test]
fn ZiFTEachSuppliesZeroBasedIndices() {
    let step = each(json!([10, 20, 30]), ZiFTRecordIndex()).unwrap();
    let out = step.apply(ZiState::new(json!({}))).wait().unwrap();

    assert_eq!(
        ZiFTRecorded(&out),
        vec![
            json!({"index": 0, "item": 10}),
            json!({"index": 1, "item": 20}),
            json!({"index": 2, "item": 30}),
        ]
    );
}

#[test]
fn ZiFTEachStaysReadyForSyncSteps() {
    let step = each(json!([1, 2]), ZiFTRecordIndex()).unwrap();
    assert!(!step.apply(ZiState::default()).is_pending());
}

#[test]
fn ZiFTEachBecomesPendingAndKeepsOrder() {
    let step = each("$.data.rows[*]", ZiFTRecordIndexPending()).unwrap();
    let outcome = step.apply(ZiState::new(json!({"rows": ["a", "b", "c"]})));
    assert!(outcome.is_pending());

    let out = outcome.wait().unwrap();
    let indices: Vec<Value> = ZiFTRecorded(&out).iter().map(|entry| entry["index"].clone()).collect();
    assert_eq!(indices, vec![json!(0), json!(1), json!(2)]);
}

#[test]
fn ZiFTEachDoesNotRestoreData() {
    let state = ZiState::new(json!({"rows": [1, 2]}));
    let out = each(data_path("rows[*]"), ZiFTRecordIndex())
        .unwrap()
        .apply(state)
        .wait()
        .unwrap();
    assert_eq!(out.data, json!("touched"));
}

#[test]
fn ZiFTBetaEachRestoresData() {
    let state = ZiState::new(json!({"rows": [1, 2]})).with_references(vec![json!("before")]);
    let out = beta::each(data_path("rows[*]"), ZiFTRecordIndexPending())
        .unwrap()
        .apply(state.clone())
        .wait()
        .unwrap();

    assert_eq!(out.data, state.data);
    assert_eq!(out.references[0], json!("before"));
    assert_eq!(ZiFTRecorded(&out).len(), 2);
}

#[test]
fn ZiFTEachOverEmptySourceKeepsState() {
    let state = ZiState::new(json!({"rows": []}));
    let out = each("$.data.rows[*]", ZiFTRecordIndex())
        .unwrap()
        .apply(state.clone())
        .wait()
        .unwrap();
    assert_eq!(out, state);
}

#[test]
fn ZiFTEachRunsLongPendingSourcesWithoutDeepNesting() {
    let items = Value::Array((0..10_000).map(|item| json!(item)).collect());
    let step = each(
        items,
        operation_async("count", |state: ZiState| async move {
            let seen = state.get("seen").and_then(|seen| seen.as_u64()).unwrap_or_default();
            Ok(state.with_extra("seen", json!(seen + 1)))
        }),
    )
    .unwrap();

    let out = step.apply(ZiState::default()).wait().unwrap();
    assert_eq!(out.get("seen"), Some(json!(10_000)));
    assert_eq!(out.index, Some(9_999));
}

#[test]
fn ZiFTEachSwitchesToPendingMidway() {
    let step = each(
        json!([0, 1, 2, 3]),
        operation_outcome("mixed", |state| {
            let position = state.index.unwrap_or_default();
            let entry = json!({"index": position, "item": state.data.clone()});
            let mut next = state.compose_next(json!("touched"));
            next.references.push(entry);
            if position >= 2 {
                ZiOutcome::pending(async move { Ok(next) })
            } else {
                ZiOutcome::ready(next)
            }
        }),
    )
    .unwrap();

    let outcome = step.apply(ZiState::default());
    assert!(outcome.is_pending());
    let indices: Vec<Value> = ZiFTRecorded(&outcome.wait().unwrap())
        .iter()
        .map(|entry| entry["index"].clone())
        .collect();
    assert_eq!(indices, vec![json!(0), json!(1), json!(2), json!(3)]);
}

#[test]
fn ZiFTEachRejectsFalsySourceImmediately() {
    assert!(matches!(each("", ZiFTRecordIndex()), Err(ZiError::Validation { .. })));
    assert!(matches!(each(json!(false), ZiFTRecordIndex()), Err(ZiError::Validation { .. })));
    assert!(matches!(beta::each(Value::Null, ZiFTRecordIndex()), Err(ZiError::Validation { .. })));
}

#[test]
fn ZiFTEachRejectsNonArraySourceAtRun() {
    let step = each(json!({"not": "a list"}), ZiFTRecordIndex()).unwrap();
    let err = step.apply(ZiState::default()).wait().unwrap_err();
    assert!(matches!(err, ZiError::Validation { .. }));
}

#[test]
fn ZiFTEachStopsOnFailingItem() {
    let step = each(
        json!([1, 2, 3]),
        operation("picky", |state| {
            if state.data == json!(2) {
                return Err(ZiError::operation("picky", "item 2 rejected"));
            }
            Ok(state.compose_next(json!("ok")))
        }),
    )
    .unwrap();

    let err = step.apply(ZiState::default()).wait().unwrap_err();
    assert_eq!(err, ZiError::operation("picky", "item 2 rejected"));
}

#[test]
fn ZiFTMergeFieldsOverrideItemKeys() {
    let state = ZiState::new(json!({"items": [{"id": 1, "name": "item"}, {"id": 2}]}));
    let merged = merge(&data_path("items[*]"), fields([field("name", "merged")]))
        .select(&state)
        .unwrap();

    assert_eq!(
        merged,
        json!([{"id": 1, "name": "merged"}, {"id": 2, "name": "merged"}])
    );
}

#[test]
fn ZiFTJoinKeepsItemKeysAndInjectsTarget() {
    let state = ZiState::new(json!({
        "parent": {"id": "p-1"},
        "items": [{"name": "item", "owner": "old"}, 7]
    }));
    let joined = join("$.data.items[*]", "$.data.parent.id", "owner")
        .select(&state)
        .unwrap();

    assert_eq!(
        joined,
        json!([{"name": "item", "owner": "p-1"}, {"owner": "p-1"}])
    );
}

#[test]
fn ZiFTJoinAndMergeDisagreeOnOverlap() {
    let state = ZiState::new(json!({"label": "source", "items": [{"label": "item", "kind": "row"}]}));

    let merged = merge(&data_path("items[*]"), fields([field("label", data_value("label"))]))
        .select(&state)
        .unwrap();
    let joined = join("$.data.items[*]", "$.data.label", "tag").select(&state).unwrap();

    assert_eq!(merged, json!([{"label": "source", "kind": "row"}]));
    assert_eq!(joined, json!([{"label": "item", "kind": "row", "tag": "source"}]));
}

#[test]
fn ZiFTBetaEachOverMergedAttendees() {
    let state = ZiState::new(json!([
        {"event": "e1", "attendee_new": [{"name": "Ada"}, {"name": "Grace"}]}
    ]))
    .with_references(vec![json!({"id": "evt-001"})]);

    let create = operation("create", |state| {
        let record = json!({"created": state.data.clone()});
        Ok(state.compose_next(record))
    });
    let step = beta::each(
        merge(
            &data_path("[*].attendee_new[*]"),
            fields([field("parentId", last_reference_value("id"))]),
        ),
        create,
    )
    .unwrap();

    let out = execute(vec![step]).apply(state.clone()).wait().unwrap();

    assert_eq!(out.data, state.data);
    assert_eq!(
        out.references,
        vec![
            json!({"id": "evt-001"}),
            json!({"name": "Ada", "parentId": "evt-001"}),
            json!({"name": "Grace", "parentId": "evt-001"}),
        ]
    );
}

proptest! {
    #[test]
    fn ZiFTEachVisitsEveryItemInOrder(items in prop::collection::vec(any::<i32>(), 1..12)) {
        let source = Value::Array(items.iter().map(|item| json!(item)).collect());
        let out = each(source, ZiFTRecordIndex())
            .unwrap()
            .apply(ZiState::default())
            .wait()
            .unwrap();

        let recorded = ZiFTRecorded(&out);
        prop_assert_eq!(recorded.len(), items.len());
        for (position, entry) in recorded.iter().enumerate() {
            prop_assert_eq!(&entry["index"], &json!(position));
            prop_assert_eq!(&entry["item"], &json!(items[position]));
        }
    }
}
