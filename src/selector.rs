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

//! # Zi Selector Module
//!
//! Path addressing into JSON documents and the [`ZiSelector`] type used for
//! read-only extraction from a state.
//!
//! Paths use JSONPath syntax (RFC 9535) evaluated by `serde_json_path`:
//! root `$`, dotted members `$.a.b`, bracketed members `$['odd-key']`,
//! indices `[0]` and `[-1]`, slices `[1:3]`, wildcards `[*]` and recursive
//! descent `$..title`. Matches come back in document order; a path that
//! matches nothing yields an empty list, not an error.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use serde_json_path::JsonPath;

use crate::errors::{Result, ZiError};
use crate::state::ZiState;

/// A parsed path expression.
///
/// A parse failure is kept and returned on every query, so selectors built
/// from a bad path fail when they run rather than when the job is assembled.
#[derive(Clone, Debug)]
pub struct ZiPath {
    raw: String,
    compiled: std::result::Result<JsonPath, ZiError>,
}

impl ZiPath {
    /// Parses a path, failing immediately on malformed input.
    pub fn parse(path: &str) -> Result<Self> {
        let parsed = Self::deferred(path);
        parsed.compiled.as_ref().map_err(Clone::clone)?;
        Ok(parsed)
    }

    /// Parses a path, deferring any parse error to query time.
    pub fn deferred(path: &str) -> Self {
        let compiled = JsonPath::parse(path).map_err(|err| ZiError::path(path, err.to_string()));
        ZiPath {
            raw: path.to_string(),
            compiled,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// All matches, in document order.
    pub fn query(&self, document: &Value) -> Result<Vec<Value>> {
        let compiled = self.compiled.as_ref().map_err(Clone::clone)?;
        Ok(compiled.query(document).all().into_iter().cloned().collect())
    }

    /// First match, if any.
    pub fn first(&self, document: &Value) -> Result<Option<Value>> {
        let compiled = self.compiled.as_ref().map_err(Clone::clone)?;
        Ok(compiled.query(document).first().cloned())
    }
}

/// Evaluates `path` against `document`, returning every match in order.
pub fn evaluate(document: &Value, path: &str) -> Result<Vec<Value>> {
    ZiPath::parse(path)?.query(document)
}

/// Evaluates `path` against `document`, returning the first match.
pub fn evaluate_first(document: &Value, path: &str) -> Result<Option<Value>> {
    ZiPath::parse(path)?.first(document)
}

type ZiSelectFn = dyn Fn(&ZiState) -> Result<Value> + Send + Sync;

/// A read-only extraction from a state.
#[derive(Clone)]
pub struct ZiSelector {
    select: Arc<ZiSelectFn>,
}

impl ZiSelector {
    pub fn new<F>(select: F) -> Self
    where
        F: Fn(&ZiState) -> Result<Value> + Send + Sync + 'static,
    {
        ZiSelector {
            select: Arc::new(select),
        }
    }

    /// Runs the selector against `state`.
    pub fn select(&self, state: &ZiState) -> Result<Value> {
        (self.select)(state)
    }
}

impl fmt::Debug for ZiSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ZiSelector(..)")
    }
}
