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

//! # Zi Scope Module
//!
//! Combinators that scope work over array-shaped data.
//!
//! - [`each`] runs a step once per item of a data source, with the item as
//!   `data` and its position as `index`.
//! - [`beta::each`] does the same and then puts the original `data` back,
//!   so only `references` and other keys change from the outside.
//! - [`join`] and [`merge`] build item lists enriched with extra keys; they
//!   are selectors and are usually handed to `each` as its data source.
//!
//! ```rust
//! use zi_job::lazy::{field, fields};
//! use zi_job::scope::{beta, merge};
//! use zi_job::source::{data_path, last_reference_value};
//! # use zi_job::operation::alter_state;
//! # let create = alter_state(Ok);
//!
//! let step = beta::each(
//!     merge(&data_path("[*].attendees[*]"), fields([
//!         field("parentId", last_reference_value("id")),
//!     ])),
//!     create,
//! );
//! ```

use serde_json::{Map, Value};

use crate::errors::{Result, ZiError};
use crate::lazy::{expand_references, ZiLazy};
use crate::operation::{apply_operation, operation_outcome, ZiOp, ZiOutcome};
use crate::selector::{ZiPath, ZiSelector};
use crate::source::{as_items, ZiDataSource};
use crate::state::ZiState;

fn check_source(source: &ZiDataSource) -> Result<()> {
    if source.is_falsy() {
        return Err(ZiError::validation(
            "dataSource argument for each operation is invalid",
        ));
    }
    Ok(())
}

/// Folds `step` over the items of `source`, threading the state through.
///
/// Items run synchronously until a step first returns a pending outcome;
/// the rest of the items then run in a single loop after it settles.
fn iterate(source: &ZiDataSource, step: &ZiOp, state: ZiState) -> ZiOutcome {
    let items = match as_items(source, &state) {
        Ok(items) => items,
        Err(err) => return ZiOutcome::failed(err),
    };
    log::debug!("each: {} item(s) over '{}'", items.len(), step.name());

    let mut remaining = items.into_iter().enumerate();
    let mut state = state;
    while let Some((position, item)) = remaining.next() {
        match apply_operation(step.as_ref(), state.scoped(item, position)) {
            ZiOutcome::Ready(Ok(next)) => state = next,
            ZiOutcome::Ready(Err(err)) => return ZiOutcome::failed(err),
            ZiOutcome::Pending(pending) => {
                let step = step.clone();
                return ZiOutcome::pending(async move {
                    let mut state = pending.await?;
                    for (position, item) in remaining {
                        state = apply_operation(step.as_ref(), state.scoped(item, position))
                            .settle()
                            .await?;
                    }
                    Ok(state)
                });
            }
        }
    }
    ZiOutcome::ready(state)
}

/// Runs `step` once per item of `source`.
///
/// The outcome is whatever the last iteration produced; with no items the
/// state passes through untouched. Fails immediately, before any state is
/// seen, when `source` is falsy.
pub fn each(source: impl Into<ZiDataSource>, step: ZiOp) -> Result<ZiOp> {
    let source = source.into();
    check_source(&source)?;
    Ok(operation_outcome("each", move |state| iterate(&source, &step, state)))
}

/// Iteration that preserves the caller's `data`.
pub mod beta {
    use super::*;

    /// Like [`each`](super::each), but the returned state carries the `data`
    /// the step started with. Changes to `references` and any other key made
    /// during the iterations are kept.
    pub fn each(source: impl Into<ZiDataSource>, step: ZiOp) -> Result<ZiOp> {
        let source = source.into();
        check_source(&source)?;
        Ok(operation_outcome("beta.each", move |state| {
            let original = state.data.clone();
            iterate(&source, &step, state).map(move |next| next.with_data(original))
        }))
    }
}

fn into_object(item: Value) -> Map<String, Value> {
    match item {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Adds the first match of `source_path` to every item matched by
/// `target_path`, under `target_key`.
///
/// Item keys are kept as they are, except `target_key`, which always
/// carries the joined value.
pub fn join(target_path: &str, source_path: &str, target_key: &str) -> ZiSelector {
    let target = ZiPath::deferred(target_path);
    let source = ZiPath::deferred(source_path);
    let key = target_key.to_string();

    ZiSelector::new(move |state| {
        let document = state.to_document();
        let items = target.query(&document)?;
        let joined = source.first(&document)?.unwrap_or(Value::Null);

        Ok(Value::Array(
            items
                .into_iter()
                .map(|item| {
                    let mut map = into_object(item);
                    map.insert(key.clone(), joined.clone());
                    Value::Object(map)
                })
                .collect(),
        ))
    })
}

/// Merges the resolved `fields` into every item matched by `path`.
///
/// Merged-in keys override same-named item keys.
pub fn merge(path: &str, fields: ZiLazy) -> ZiSelector {
    let path = ZiPath::deferred(path);

    ZiSelector::new(move |state| {
        let items = path.query(&state.to_document())?;
        let additional = match expand_references(&fields, state)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => return Err(ZiError::validation("merge fields must resolve to an object")),
        };

        Ok(Value::Array(
            items
                .into_iter()
                .map(|item| {
                    let mut map = into_object(item);
                    for (key, value) in &additional {
                        map.insert(key.clone(), value.clone());
                    }
                    Value::Object(map)
                })
                .collect(),
        ))
    })
}
