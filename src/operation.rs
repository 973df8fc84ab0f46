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

//! # Zi Operation Module
//!
//! An operation is a step of a job: it takes a [`ZiState`] and yields the
//! next one. Some steps finish on the spot, others need to wait on IO, so
//! the result of a step is a [`ZiOutcome`]:
//!
//! - `Ready(result)`: the step already finished, successfully or not
//! - `Pending(future)`: the step finishes when the future settles
//!
//! Combinators chain steps through [`ZiOutcome::then`], which runs the
//! next step immediately after a ready result and attaches it as a
//! continuation after a pending one. Once anything in a chain is pending,
//! everything after it is pending too.
//!
//! ## Writing Steps
//!
//! ```rust
//! use zi_job::operation::{operation, operation_async};
//!
//! let tag = operation("tag", |mut state| {
//!     state.extra.insert("tagged".into(), true.into());
//!     Ok(state)
//! });
//!
//! let fetch = operation_async("fetch", |state| async move {
//!     // talk to something slow
//!     Ok(state)
//! });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::errors::{Result, ZiError};
use crate::state::ZiState;

/// A boxed computation that settles to the next state.
pub type ZiPending = BoxFuture<'static, Result<ZiState>>;

/// What a step produced: a settled result or a computation still running.
pub enum ZiOutcome {
    Ready(Result<ZiState>),
    Pending(ZiPending),
}

impl ZiOutcome {
    pub fn ready(state: ZiState) -> Self {
        ZiOutcome::Ready(Ok(state))
    }

    pub fn failed(err: ZiError) -> Self {
        ZiOutcome::Ready(Err(err))
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<ZiState>> + Send + 'static,
    {
        ZiOutcome::Pending(future.boxed())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ZiOutcome::Pending(_))
    }

    /// The settled result, or `None` if the outcome is still pending.
    pub fn into_ready(self) -> Option<Result<ZiState>> {
        match self {
            ZiOutcome::Ready(result) => Some(result),
            ZiOutcome::Pending(_) => None,
        }
    }

    /// Waits for the outcome to settle.
    pub async fn settle(self) -> Result<ZiState> {
        match self {
            ZiOutcome::Ready(result) => result,
            ZiOutcome::Pending(future) => future.await,
        }
    }

    /// Blocks the current thread until the outcome settles.
    ///
    /// Uses a plain executor with no IO reactor. Outcomes containing
    /// IO-backed steps (the http operations, timers) must instead be settled
    /// with [`settle`](Self::settle) inside a tokio runtime. Must not be
    /// called from inside an async runtime worker.
    pub fn wait(self) -> Result<ZiState> {
        match self {
            ZiOutcome::Ready(result) => result,
            ZiOutcome::Pending(future) => futures::executor::block_on(future),
        }
    }

    /// Runs `next` once this outcome has settled successfully.
    ///
    /// A ready success runs `next` right away; a ready failure skips it; a
    /// pending outcome stays pending with `next` attached after it.
    pub fn then<F>(self, next: F) -> ZiOutcome
    where
        F: FnOnce(ZiState) -> ZiOutcome + Send + 'static,
    {
        match self {
            ZiOutcome::Ready(Ok(state)) => next(state),
            ZiOutcome::Ready(Err(err)) => ZiOutcome::Ready(Err(err)),
            ZiOutcome::Pending(future) => ZiOutcome::pending(async move {
                let state = future.await?;
                next(state).settle().await
            }),
        }
    }

    /// Transforms a successful state without leaving the current mode.
    pub fn map<F>(self, f: F) -> ZiOutcome
    where
        F: FnOnce(ZiState) -> ZiState + Send + 'static,
    {
        self.map_result(|result| result.map(f))
    }

    /// Transforms the settled result, success or failure.
    pub fn map_result<F>(self, f: F) -> ZiOutcome
    where
        F: FnOnce(Result<ZiState>) -> Result<ZiState> + Send + 'static,
    {
        match self {
            ZiOutcome::Ready(result) => ZiOutcome::Ready(f(result)),
            ZiOutcome::Pending(future) => ZiOutcome::pending(async move { f(future.await) }),
        }
    }
}

impl From<Result<ZiState>> for ZiOutcome {
    fn from(result: Result<ZiState>) -> Self {
        ZiOutcome::Ready(result)
    }
}

impl From<ZiState> for ZiOutcome {
    fn from(state: ZiState) -> Self {
        ZiOutcome::Ready(Ok(state))
    }
}

impl fmt::Debug for ZiOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZiOutcome::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            ZiOutcome::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Contract every step of a job fulfils.
pub trait ZiOperation: Send + Sync {
    /// Human-readable name used in logs and trail entries.
    fn name(&self) -> &str;

    /// Runs the step against `state`.
    fn apply(&self, state: ZiState) -> ZiOutcome;
}

/// Shared handle to a step.
pub type ZiOp = Arc<dyn ZiOperation>;

/// Step backed by a closure.
pub struct ZiFnOperation<F> {
    name: String,
    body: F,
}

impl<F> ZiFnOperation<F>
where
    F: Fn(ZiState) -> ZiOutcome + Send + Sync,
{
    pub fn new(name: impl Into<String>, body: F) -> Self {
        ZiFnOperation {
            name: name.into(),
            body,
        }
    }
}

impl<F> ZiOperation for ZiFnOperation<F>
where
    F: Fn(ZiState) -> ZiOutcome + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, state: ZiState) -> ZiOutcome {
        (self.body)(state)
    }
}

impl<F> fmt::Debug for ZiFnOperation<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZiFnOperation").field("name", &self.name).finish()
    }
}

/// Builds a step from a closure returning an outcome directly.
pub fn operation_outcome<F>(name: impl Into<String>, body: F) -> ZiOp
where
    F: Fn(ZiState) -> ZiOutcome + Send + Sync + 'static,
{
    Arc::new(ZiFnOperation::new(name, body))
}

/// Builds a step that finishes synchronously.
pub fn operation<F>(name: impl Into<String>, body: F) -> ZiOp
where
    F: Fn(ZiState) -> Result<ZiState> + Send + Sync + 'static,
{
    operation_outcome(name, move |state| ZiOutcome::Ready(body(state)))
}

/// Builds a step whose result is only available once a future settles.
pub fn operation_async<F, Fut>(name: impl Into<String>, body: F) -> ZiOp
where
    F: Fn(ZiState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ZiState>> + Send + 'static,
{
    operation_outcome(name, move |state| ZiOutcome::pending(body(state)))
}

/// Custom step for flexible job writing.
pub fn alter_state<F>(body: F) -> ZiOp
where
    F: Fn(ZiState) -> Result<ZiState> + Send + Sync + 'static,
{
    operation("alter_state", body)
}

/// Step that hands its state on unchanged.
pub fn identity() -> ZiOp {
    operation_outcome("identity", ZiOutcome::ready)
}

/// Runs `step` against `state`, logging which step is starting.
pub fn apply_operation(step: &dyn ZiOperation, state: ZiState) -> ZiOutcome {
    log::trace!("applying operation '{}'", step.name());
    step.apply(state)
}
