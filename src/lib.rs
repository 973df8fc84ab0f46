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

//! # Zi Job Library
//!
//! Combinators for data-transformation jobs. A job is a flat sequence of
//! steps; every step receives the [`ZiState`] the previous one produced and
//! yields the next one, either on the spot or through a pending computation.
//!
//! ## Module Overview
//!
//! - **state**: the state document threaded through a job
//! - **selector**: JSONPath evaluation against state documents
//! - **lazy**: state-dependent step arguments and their resolution
//! - **operation**: the step contract and the ready/pending outcome type
//! - **pipeline**: `execute` and `combine`
//! - **source**: data sources and state accessors
//! - **scope**: `each`, `beta::each`, `join` and `merge`
//! - **trail**: optional execution history for wrapped steps
//! - **utils**: value helpers for step bodies
//! - **dates**: date parsing and formatting (`dates` feature)
//! - **http**: HTTP request steps (`http` feature)
//! - **job**: job definitions and runs
//!
//! ## Feature Flags
//!
//! - `http`: request steps backed by `reqwest`
//! - `dates`: date helpers backed by `chrono`
//! - `full`: everything (default)
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use zi_job::{each, execute, alter_state, ZiState};
//!
//! let job = execute(vec![
//!     each("$.data.items[*]", alter_state(|state| Ok(state))).unwrap(),
//!     alter_state(|state| Ok(state.with_data(json!({"done": true})))),
//! ]);
//!
//! let state = job.apply(ZiState::new(json!({"items": [1, 2, 3]}))).wait().unwrap();
//! assert_eq!(state.data, json!({"done": true}));
//! ```
//!
//! `wait` suits synchronous and CPU-only steps. Jobs with http steps are
//! settled inside a tokio runtime: `job.apply(state).settle().await`.
//!
//! ## Error Handling
//!
//! Fallible calls return `Result<T, ZiError>`. A failing step halts the
//! pipeline it runs in unless it is wrapped with [`trail::wrap`].

#![allow(non_snake_case)]

pub mod errors;
pub mod state;
pub mod selector;
pub mod lazy;
pub mod operation;
pub mod pipeline;
pub mod source;
pub mod scope;
pub mod trail;
pub mod utils;
#[cfg(feature = "dates")]
pub mod dates;
#[cfg(feature = "http")]
pub mod http;
pub mod job;

pub use errors::{Result, ZiError};
pub use state::{compose_next_state, ZiMetadata, ZiState};
pub use selector::{evaluate, evaluate_first, ZiPath, ZiSelector};
pub use lazy::{expand_references, expand_references_with, field, fields, ZiField, ZiHandle, ZiLazy};
pub use operation::{
    alter_state, apply_operation, identity, operation, operation_async, operation_outcome,
    ZiOp, ZiOperation, ZiOutcome,
};
pub use pipeline::{combine, execute, ZiPipeline};
pub use source::{
    as_data, as_items, data_path, data_value, index, last_reference_value, reference_path,
    source, source_value, ZiDataSource,
};
pub use scope::{beta, each, join, merge};
pub use trail::{finalize, finalize_operands, wrap, ZiTrailEntry, ZiTrailed};
pub use job::{ZiJob, ZiJobConfig};
#[cfg(feature = "http")]
pub use http::{ZiHttpConfig, ZiHttpMethod, ZiHttpResponse};
