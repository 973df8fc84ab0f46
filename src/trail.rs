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

//! # Zi Trail Module
//!
//! Optional execution trail for a job. [`wrap`] decorates an operation
//! factory (a function from resolved operands to a step) so that every
//! invocation appends a [`ZiTrailEntry`] to the state's `history`.
//!
//! The wrapper logs and continues: when the underlying step fails, the
//! state it was given comes back unchanged apart from a new entry with
//! `status: 1` and the rendered error. Steps that are not wrapped keep the
//! usual halt-and-propagate behaviour.
//!
//! ```rust
//! use zi_job::trail::wrap;
//! use zi_job::operation::operation;
//!
//! let upsert = wrap("upsert", |operands| {
//!     operation("upsert", move |state| Ok(state.compose_next(operands[0].clone())))
//! });
//! let step = upsert.call(vec!["Account".into()]);
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::Result;
use crate::lazy::{expand_references, ZiLazy};
use crate::operation::{operation_outcome, ZiOp, ZiOutcome};
use crate::state::ZiState;

pub const TRAIL_STATUS_OK: u8 = 0;
pub const TRAIL_STATUS_ERROR: u8 = 1;

/// One recorded invocation of a wrapped step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZiTrailEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub status: u8,
    #[serde(rename = "finalOperands")]
    pub final_operands: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ZiTrailEntry {
    pub fn success(name: impl Into<String>, final_operands: Vec<Value>) -> Self {
        ZiTrailEntry {
            kind: "operation".to_string(),
            name: name.into(),
            status: TRAIL_STATUS_OK,
            final_operands,
            error: None,
        }
    }

    pub fn failure(
        name: impl Into<String>,
        final_operands: Vec<Value>,
        error: impl Into<String>,
    ) -> Self {
        ZiTrailEntry {
            kind: "operation".to_string(),
            name: name.into(),
            status: TRAIL_STATUS_ERROR,
            final_operands,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == TRAIL_STATUS_OK
    }

    pub fn to_value(&self) -> Value {
        let mut value = json!({
            "type": self.kind,
            "name": self.name,
            "status": self.status,
            "finalOperands": self.final_operands,
        });
        if let (Some(error), Value::Object(map)) = (&self.error, &mut value) {
            map.insert("error".into(), Value::String(error.clone()));
        }
        value
    }
}

/// Resolves each operand against `state`, in order.
pub fn finalize_operands(operands: &[ZiLazy], state: &ZiState) -> Result<Vec<Value>> {
    operands
        .iter()
        .map(|operand| expand_references(operand, state))
        .collect()
}

type ZiFactoryFn = dyn Fn(Vec<Value>) -> ZiOp + Send + Sync;

/// Operation factory whose operands are resolved right before the step runs.
#[derive(Clone)]
pub struct ZiFinalized {
    factory: Arc<ZiFactoryFn>,
}

impl ZiFinalized {
    pub fn call(&self, operands: Vec<ZiLazy>) -> ZiOp {
        let factory = self.factory.clone();
        operation_outcome("finalized", move |state| {
            match finalize_operands(&operands, &state) {
                Ok(resolved) => factory(resolved).apply(state),
                Err(err) => ZiOutcome::failed(err),
            }
        })
    }
}

/// Builds a [`ZiFinalized`] from an operation factory.
pub fn finalize<F>(factory: F) -> ZiFinalized
where
    F: Fn(Vec<Value>) -> ZiOp + Send + Sync + 'static,
{
    ZiFinalized {
        factory: Arc::new(factory),
    }
}

/// Operation factory that records every invocation in the state's trail.
#[derive(Clone)]
pub struct ZiTrailed {
    name: String,
    factory: Arc<ZiFactoryFn>,
}

impl ZiTrailed {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds the trail-recording step for the given operands.
    ///
    /// Operands are resolved against the state the step receives. A
    /// resolution failure is not captured; it propagates like any other
    /// step failure.
    pub fn call(&self, operands: Vec<ZiLazy>) -> ZiOp {
        let name = self.name.clone();
        let factory = self.factory.clone();

        operation_outcome(self.name.clone(), move |state| {
            let final_operands = match finalize_operands(&operands, &state) {
                Ok(resolved) => resolved,
                Err(err) => return ZiOutcome::failed(err),
            };

            let step = factory(final_operands.clone());
            let prior = state.clone();
            let name = name.clone();

            step.apply(state).map_result(move |result| {
                Ok(match result {
                    Ok(next) => {
                        log::debug!("trail: '{name}' succeeded");
                        next.with_trail_entry(ZiTrailEntry::success(name, final_operands))
                    }
                    Err(err) => {
                        log::warn!("trail: '{name}' failed, continuing: {err}");
                        let entry = ZiTrailEntry::failure(name, final_operands, err.to_string());
                        prior.with_trail_entry(entry)
                    }
                })
            })
        })
    }
}

impl fmt::Debug for ZiTrailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZiTrailed").field("name", &self.name).finish()
    }
}

/// Wraps an operation factory with trail recording under `name`.
pub fn wrap<F>(name: impl Into<String>, factory: F) -> ZiTrailed
where
    F: Fn(Vec<Value>) -> ZiOp + Send + Sync + 'static,
{
    ZiTrailed {
        name: name.into(),
        factory: Arc::new(factory),
    }
}
