//! Copyright © 2025 Dunimd Team. All Rights Reserved.
//!
//! This file is part of Zi.
//! The Zi project belongs to the Dunimd project team.
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

use std::sync::Arc;

use crate::errors::{Result, ZiError};
use crate::operation::{apply_operation, operation_outcome, ZiOp, ZiOutcome};
use crate::state::ZiState;

/// Simple linear pipeline composed of sequential steps.
#[derive(Clone, Default)]
pub struct ZiPipeline {
    steps: Vec<ZiOp>,
}

impl ZiPipeline {
    /// Constructs a pipeline from a list of steps.
    pub fn new(steps: Vec<ZiOp>) -> Self {
        ZiPipeline { steps }
    }

    /// Appends a step.
    pub fn then(mut self, step: ZiOp) -> Self {
        self.steps.push(step);
        self
    }

    pub fn push(&mut self, step: ZiOp) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step names, in execution order.
    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(|step| step.name().to_string()).collect()
    }

    /// Ensures the pipeline contains at least one step.
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(ZiError::validation("pipeline has no steps configured"));
        }
        Ok(())
    }

    /// Runs every step in order, each on the state the previous one settled to.
    ///
    /// The result is always pending, even when every step is synchronous.
    /// The first failure stops the run and is returned unchanged.
    pub fn run(&self, state: ZiState) -> ZiOutcome {
        run_steps("execute", Arc::from(self.steps.clone()), state)
    }

    /// Runs the pipeline and waits for it to settle.
    pub async fn run_to_end(&self, state: ZiState) -> Result<ZiState> {
        self.run(state).settle().await
    }

    /// Collapses the pipeline into a single step.
    pub fn into_operation(self) -> ZiOp {
        sequence("execute", self.steps)
    }
}

fn run_steps(label: &'static str, steps: Arc<[ZiOp]>, state: ZiState) -> ZiOutcome {
    ZiOutcome::pending(async move {
        let mut state = state;
        for (position, step) in steps.iter().enumerate() {
            log::debug!("{label}: step {position} '{}' starting", step.name());
            state = match apply_operation(step.as_ref(), state).settle().await {
                Ok(next) => next,
                Err(err) => {
                    log::warn!("{label}: step {position} '{}' failed: {err}", step.name());
                    return Err(err);
                }
            };
        }
        log::debug!("{label}: {} step(s) completed", steps.len());
        Ok(state)
    })
}

fn sequence(label: &'static str, steps: Vec<ZiOp>) -> ZiOp {
    let steps: Arc<[ZiOp]> = Arc::from(steps);
    operation_outcome(label, move |state| run_steps(label, steps.clone(), state))
}

/// Executes a sequence of steps as one step.
///
/// Step N+1 never starts before step N has settled. With no steps this is
/// the identity.
///
/// ```rust
/// use zi_job::pipeline::execute;
/// use zi_job::operation::alter_state;
///
/// let job = execute(vec![
///     alter_state(|state| Ok(state)),
///     alter_state(|state| Ok(state)),
/// ]);
/// ```
pub fn execute(steps: Vec<ZiOp>) -> ZiOp {
    sequence("execute", steps)
}

/// Combines several steps into one. Same semantics as [`execute`].
pub fn combine(steps: Vec<ZiOp>) -> ZiOp {
    sequence("combine", steps)
}
