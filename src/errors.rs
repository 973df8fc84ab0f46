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

//! # Zi Job Error Module
//!
//! This module defines the error type shared by every combinator, selector
//! and operation in the crate.
//!
//! ## Error Categories
//!
//! - **Validation**: Invalid arguments caught before any state is touched
//!   (for example `each` given a falsy data source)
//! - **Path**: Malformed path expressions
//! - **Operation**: Failures raised by step bodies
//! - **Http**: Transport failures of the http operations
//! - **Io / Serde**: Loading job definitions and state documents
//! - **Internal**: Unexpected internal failures
//!
//! Combinators never wrap the error of a failing step: whatever a step
//! returns as `Err` is exactly what the caller of the pipeline receives.
//!
//! ## Usage
//!
//! ```rust
//! use zi_job::errors::{Result, ZiError};
//!
//! fn require_id(value: &serde_json::Value) -> Result<String> {
//!     value
//!         .get("id")
//!         .and_then(|id| id.as_str())
//!         .map(str::to_string)
//!         .ok_or_else(|| ZiError::operation("require_id", "record has no id"))
//! }
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convience result type used throughout Zi Job.
pub type Result<T> = std::result::Result<T, ZiError>;

/// Canonical error enumeration for Zi Job.
#[derive(Clone, Debug, Error, PartialEq, Serialize, Deserialize)]
pub enum ZiError {
    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Validation errors triggered by invalid parameters or inputs.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A path expression that could not be parsed.
    #[error("invalid path '{path}': {message}")]
    Path { path: String, message: String },

    /// Any failure raised by a step body.
    #[error("operation '{operation}' failed: {message}")]
    Operation { operation: String, message: String },

    /// Transport failures of the http operations.
    #[error("http error: {0}")]
    Http(String),

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for ZiError {
    fn from(err: io::Error) -> Self {
        ZiError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ZiError {
    fn from(err: serde_json::Error) -> Self {
        ZiError::Serde(err.to_string())
    }
}

impl From<serde_yaml::Error> for ZiError {
    fn from(err: serde_yaml::Error) -> Self {
        ZiError::Serde(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ZiError {
    fn from(err: reqwest::Error) -> Self {
        ZiError::Http(err.to_string())
    }
}

/// Step bodies written against `anyhow` surface as operation errors.
impl From<anyhow::Error> for ZiError {
    fn from(err: anyhow::Error) -> Self {
        ZiError::Operation {
            operation: "anonymous".to_string(),
            message: format!("{err:#}"),
        }
    }
}

impl ZiError {
    /// Helper to construct simple validation errors.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        ZiError::Validation {
            message: message.into(),
        }
    }

    /// Helper to construct path errors.
    pub fn path(path: impl Into<String>, message: impl Into<String>) -> Self {
        ZiError::Path {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Helper to construct operation errors.
    pub fn operation(name: impl Into<String>, message: impl Into<String>) -> Self {
        ZiError::Operation {
            operation: name.into(),
            message: message.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        ZiError::Internal(message.into())
    }
}
