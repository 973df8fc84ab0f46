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

use serde_json::{json, Value};
use zi_job::lazy::ZiLazy;
use zi_job::operation::{operation, operation_async, ZiOp};
use zi_job::pipeline::execute;
use zi_job::source::data_value;
use zi_job::state::ZiState;
use zi_job::trail::{finalize, wrap, ZiTrailEntry, ZiTrailed, TRAIL_STATUS_ERROR, TRAIL_STATUS_OK};
use zi_job::ZiError;

fn ZiFTUpsert() -> ZiTrailed {
    wrap("upsert", |operands: Vec<Value>| {
        operation("upsert", move |state| {
            Ok(state.compose_next(json!({"sobject": operands[0], "record": operands[1]})))
        })
    })
}

fn ZiFTExplode() -> ZiTrailed {
    wrap("create", |_operands: Vec<Value>| {
        operation("create", |_state| Err(ZiError::operation("create", "duplicate external id")))
    })
}

fn ZiFTExplodeLater() -> ZiTrailed {
    wrap("create_async", |_operands: Vec<Value>| -> ZiOp {
        operation_async("create_async", |_state: ZiState| async move {
            Err::<ZiState, _>(ZiError::operation("create_async", "connection reset"))
        })
    })
}

#[test]
fn ZiFTTrailRecordsSuccessWithResolvedOperands() {
    let step = ZiFTUpsert().call(vec![
        ZiLazy::from("Patient__c"),
        ZiLazy::object([("Name", data_value("name"))]),
    ]);
    let out = step.apply(ZiState::new(json!({"name": "Ada"}))).wait().unwrap();

    assert_eq!(out.data, json!({"sobject": "Patient__c", "record": {"Name": "Ada"}}));
    assert_eq!(out.trail().len(), 1);
    let entry = &out.trail()[0];
    assert_eq!(entry.name, "upsert");
    assert_eq!(entry.status, TRAIL_STATUS_OK);
    assert_eq!(entry.final_operands, vec![json!("Patient__c"), json!({"Name": "Ada"})]);
    assert!(entry.error.is_none());
}

#[test]
fn ZiFTTrailCapturesFailureAndLeavesDataAlone() {
    let state = ZiState::new(json!({"keep": "me"})).with_references(vec![json!(1)]);
    let step = ZiFTExplode().call(vec![ZiLazy::from(data_value("keep"))]);
    let out = step.apply(state.clone()).wait().unwrap();

    assert_eq!(out.data, state.data);
    assert_eq!(out.references, state.references);
    let entry = &out.trail()[0];
    assert_eq!(entry.status, TRAIL_STATUS_ERROR);
    assert_eq!(entry.final_operands, vec![json!("me")]);
    assert_eq!(
        entry.error.as_deref(),
        Some(ZiError::operation("create", "duplicate external id").to_string().as_str())
    );
}

#[test]
fn ZiFTTrailCapturesPendingFailure() {
    let out = ZiFTExplodeLater()
        .call(Vec::new())
        .apply(ZiState::new(json!("unchanged")))
        .wait()
        .unwrap();

    assert_eq!(out.data, json!("unchanged"));
    assert_eq!(out.trail()[0].status, TRAIL_STATUS_ERROR);
    assert!(out.trail()[0].error.as_deref().unwrap_or_default().contains("connection reset"));
}

#[test]
fn ZiFTTrailPipelineContinuesPastFailure() {
    let job = execute(vec![
        ZiFTExplode().call(vec![ZiLazy::from("Account")]),
        ZiFTUpsert().call(vec![ZiLazy::from("Account"), ZiLazy::from(json!({"Name": "x"}))]),
    ]);
    let out = job.apply(ZiState::new(json!({}))).wait().unwrap();

    let statuses: Vec<u8> = out.trail().iter().map(|entry| entry.status).collect();
    assert_eq!(statuses, vec![TRAIL_STATUS_ERROR, TRAIL_STATUS_OK]);
    assert_eq!(out.data["sobject"], json!("Account"));

    let document = out.to_document();
    assert_eq!(document["history"][0]["type"], json!("operation"));
    assert_eq!(document["history"][0]["status"], json!(1));
    assert!(document["history"][0]["error"].is_string());
}

#[test]
fn ZiFTTrailOperandResolutionFailurePropagates() {
    let broken = ZiLazy::from_fn(|_| Err::<Value, _>(ZiError::validation("operand unavailable")));
    let err = ZiFTUpsert()
        .call(vec![broken])
        .apply(ZiState::default())
        .wait()
        .unwrap_err();
    assert_eq!(err, ZiError::validation("operand unavailable"));
}

#[test]
fn ZiFTUnwrappedFailureStillHalts() {
    let job = execute(vec![
        operation("create", |_| Err(ZiError::operation("create", "rejected"))),
        ZiFTUpsert().call(vec![ZiLazy::from("Account"), ZiLazy::from(json!({}))]),
    ]);
    assert!(job.apply(ZiState::default()).wait().is_err());
}

#[test]
fn ZiFTFinalizeResolvesOperandsWithoutTrail() {
    let create = finalize(|operands: Vec<Value>| {
        operation("create", move |state| Ok(state.compose_next(Value::Array(operands.clone()))))
    });
    let out = create
        .call(vec![ZiLazy::from(data_value("id")), ZiLazy::from(5i64)])
        .apply(ZiState::new(json!({"id": "a-1"})))
        .wait()
        .unwrap();

    assert_eq!(out.data, json!(["a-1", 5]));
    assert!(out.history.is_none());
}

#[test]
fn ZiFTTrailKeepsEntriesOfNestedWrappedSteps() {
    let batch = wrap("batch", |_operands: Vec<Value>| {
        execute(vec![
            ZiFTUpsert().call(vec![ZiLazy::from("Account"), ZiLazy::from(json!({"Name": "a"}))]),
            ZiFTExplode().call(vec![ZiLazy::from("Contact")]),
        ])
    });
    let state = ZiState::new(json!({}))
        .with_trail_entry(ZiTrailEntry::success("seed", Vec::new()));
    let out = batch.call(Vec::new()).apply(state).wait().unwrap();

    let names: Vec<&str> = out.trail().iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, vec!["seed", "upsert", "create", "batch"]);
    let statuses: Vec<u8> = out.trail().iter().map(|entry| entry.status).collect();
    assert_eq!(
        statuses,
        vec![TRAIL_STATUS_OK, TRAIL_STATUS_OK, TRAIL_STATUS_ERROR, TRAIL_STATUS_OK]
    );
}
