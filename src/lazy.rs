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

//! # Zi Lazy Value Module
//!
//! Step arguments are often not known when a job is assembled: "the id the
//! previous step created", "the name of the current item". [`ZiLazy`] is the
//! value tree such arguments are written in. It may hold plain JSON, nested
//! arrays and objects, functions of the state, and opaque external handles.
//!
//! [`expand_references`] walks the tree at the moment a step runs, calls
//! every function with the current state, resolves whatever the function
//! returned, and produces plain JSON. Functions are re-invoked on every
//! call; nothing is cached.
//!
//! ```rust
//! use serde_json::json;
//! use zi_job::lazy::{expand_references, field, fields, ZiLazy};
//! use zi_job::source::data_value;
//! use zi_job::state::ZiState;
//!
//! let args = fields([
//!     field("Name", data_value("name")),
//!     field("Kind", "person"),
//! ]);
//! let state = ZiState::new(json!({"name": "Ada"}));
//! let out = expand_references(&args, &state).unwrap();
//! assert_eq!(out, json!({"Name": "Ada", "Kind": "person"}));
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::errors::{Result, ZiError};
use crate::selector::ZiSelector;
use crate::state::ZiState;

/// Function embedded in a lazy value.
pub type ZiResolveFn = Arc<dyn Fn(&ZiState) -> Result<ZiLazy> + Send + Sync>;

/// An external object carried through resolution untouched, such as a body
/// stream or a client handle.
#[derive(Clone)]
pub struct ZiHandle(Arc<dyn Any + Send + Sync>);

impl ZiHandle {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        ZiHandle(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for ZiHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ZiHandle(..)")
    }
}

/// A step argument whose parts may depend on the state.
#[derive(Clone)]
pub enum ZiLazy {
    /// Plain JSON, returned as is.
    Value(Value),
    /// Ordered sequence; every element is resolved.
    Array(Vec<ZiLazy>),
    /// Keyed container; every value is resolved, every key kept.
    Object(BTreeMap<String, ZiLazy>),
    /// Called with the state; its result is resolved in turn.
    Func(ZiResolveFn),
    /// External object, never converted to JSON.
    Opaque(ZiHandle),
}

impl ZiLazy {
    /// Wraps a function of the state. The function may return anything that
    /// converts into a lazy value, including another function.
    pub fn from_fn<F, T>(f: F) -> Self
    where
        F: Fn(&ZiState) -> Result<T> + Send + Sync + 'static,
        T: Into<ZiLazy>,
    {
        ZiLazy::Func(Arc::new(move |state| f(state).map(Into::into)))
    }

    pub fn array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ZiLazy>,
    {
        ZiLazy::Array(items.into_iter().map(Into::into).collect())
    }

    pub fn object<I, K, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<ZiLazy>,
    {
        ZiLazy::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        ZiLazy::Opaque(ZiHandle::new(value))
    }

    /// Converts a fully resolved tree into JSON.
    ///
    /// Fails if a function or an opaque handle is still present.
    pub fn into_value(self) -> Result<Value> {
        match self {
            ZiLazy::Value(value) => Ok(value),
            ZiLazy::Array(items) => items
                .into_iter()
                .map(ZiLazy::into_value)
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            ZiLazy::Object(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key, value.into_value()?);
                }
                Ok(Value::Object(map))
            }
            ZiLazy::Func(_) => Err(ZiError::internal("unresolved function in lazy value")),
            ZiLazy::Opaque(_) => Err(ZiError::validation(
                "opaque value cannot be converted to JSON",
            )),
        }
    }

    /// Borrow the member `key` when this is an object.
    pub fn get(&self, key: &str) -> Option<&ZiLazy> {
        match self {
            ZiLazy::Object(entries) => entries.get(key),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ZiLazy::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Debug for ZiLazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZiLazy::Value(value) => f.debug_tuple("Value").field(value).finish(),
            ZiLazy::Array(items) => f.debug_tuple("Array").field(items).finish(),
            ZiLazy::Object(entries) => f.debug_tuple("Object").field(entries).finish(),
            ZiLazy::Func(_) => f.write_str("Func(..)"),
            ZiLazy::Opaque(handle) => f.debug_tuple("Opaque").field(handle).finish(),
        }
    }
}

impl From<Value> for ZiLazy {
    fn from(value: Value) -> Self {
        ZiLazy::Value(value)
    }
}

impl From<&str> for ZiLazy {
    fn from(value: &str) -> Self {
        ZiLazy::Value(Value::String(value.to_string()))
    }
}

impl From<String> for ZiLazy {
    fn from(value: String) -> Self {
        ZiLazy::Value(Value::String(value))
    }
}

impl From<bool> for ZiLazy {
    fn from(value: bool) -> Self {
        ZiLazy::Value(Value::Bool(value))
    }
}

impl From<i64> for ZiLazy {
    fn from(value: i64) -> Self {
        ZiLazy::Value(Value::from(value))
    }
}

impl From<f64> for ZiLazy {
    fn from(value: f64) -> Self {
        ZiLazy::Value(Value::from(value))
    }
}

impl From<Vec<ZiLazy>> for ZiLazy {
    fn from(items: Vec<ZiLazy>) -> Self {
        ZiLazy::Array(items)
    }
}

impl From<ZiSelector> for ZiLazy {
    fn from(selector: ZiSelector) -> Self {
        ZiLazy::Func(Arc::new(move |state| selector.select(state).map(ZiLazy::Value)))
    }
}

impl From<ZiHandle> for ZiLazy {
    fn from(handle: ZiHandle) -> Self {
        ZiLazy::Opaque(handle)
    }
}

/// Resolves every function in `value` against `state` and returns plain JSON.
pub fn expand_references(value: &ZiLazy, state: &ZiState) -> Result<Value> {
    expand_references_with(value, state, &|_: &ZiLazy| false)?.into_value()
}

/// Resolves `value` against `state`, leaving verbatim every node for which
/// `skip` returns true.
///
/// `skip` is consulted before a node is descended into or called, at every
/// depth, so a skipped node keeps whatever it contains.
pub fn expand_references_with<F>(value: &ZiLazy, state: &ZiState, skip: &F) -> Result<ZiLazy>
where
    F: Fn(&ZiLazy) -> bool,
{
    if skip(value) {
        return Ok(value.clone());
    }

    match value {
        ZiLazy::Func(resolve) => {
            let produced = resolve(state)?;
            expand_references_with(&produced, state, skip)
        }
        ZiLazy::Array(items) => items
            .iter()
            .map(|item| expand_references_with(item, state, skip))
            .collect::<Result<Vec<_>>>()
            .map(ZiLazy::Array),
        ZiLazy::Object(entries) => {
            let mut resolved = BTreeMap::new();
            for (key, item) in entries {
                resolved.insert(key.clone(), expand_references_with(item, state, skip)?);
            }
            Ok(ZiLazy::Object(resolved))
        }
        ZiLazy::Value(_) | ZiLazy::Opaque(_) => Ok(value.clone()),
    }
}

/// A key and a value, later zipped into an object by [`fields`].
pub type ZiField = (String, ZiLazy);

/// Pairs a key with a value or a state-dependent value.
pub fn field(key: impl Into<String>, value: impl Into<ZiLazy>) -> ZiField {
    (key.into(), value.into())
}

/// Zips fields into an object; a repeated key keeps its last value.
pub fn fields<I>(list: I) -> ZiLazy
where
    I: IntoIterator<Item = ZiField>,
{
    ZiLazy::Object(list.into_iter().collect())
}
