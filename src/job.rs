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

//! # Zi Job Module
//!
//! A job pairs a definition (name, configuration, initial data) with the
//! pipeline that runs over it. Definitions are plain YAML or JSON:
//!
//! ```yaml
//! name: sync-patients
//! configuration:
//!   username: admin
//! data:
//!   patients: []
//! ```

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Result;
use crate::pipeline::ZiPipeline;
use crate::state::ZiState;

/// Definition of a job run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZiJobConfig {
    #[serde(default = "default_job_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Value>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub references: Vec<Value>,
    #[serde(default)]
    pub log_steps: bool,
}

fn default_job_name() -> String {
    "job".to_string()
}

impl Default for ZiJobConfig {
    fn default() -> Self {
        Self {
            name: default_job_name(),
            configuration: None,
            data: Value::Null,
            references: Vec::new(),
            log_steps: false,
        }
    }
}

impl ZiJobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn configuration(mut self, configuration: Value) -> Self {
        self.configuration = Some(configuration);
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn references(mut self, references: Vec<Value>) -> Self {
        self.references = references;
        self
    }

    pub fn log_steps(mut self, enabled: bool) -> Self {
        self.log_steps = enabled;
        self
    }

    pub fn from_yaml_str(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Loads a definition, choosing the format from the file extension.
    /// Anything other than `.json` is read as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "json" => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// The state a run starts from.
    pub fn initial_state(&self) -> ZiState {
        let state = ZiState::new(self.data.clone()).with_references(self.references.clone());
        match &self.configuration {
            Some(configuration) => state.with_configuration(configuration.clone()),
            None => state,
        }
    }
}

/// A definition bound to the pipeline that runs it.
#[derive(Clone)]
pub struct ZiJob {
    config: ZiJobConfig,
    pipeline: ZiPipeline,
}

impl ZiJob {
    pub fn new(config: ZiJobConfig, pipeline: ZiPipeline) -> Self {
        Self { config, pipeline }
    }

    pub fn config(&self) -> &ZiJobConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &ZiPipeline {
        &self.pipeline
    }

    /// Runs the pipeline against the definition's initial state.
    pub async fn run(&self) -> Result<ZiState> {
        let name = &self.config.name;
        let started = Instant::now();
        log::info!("job '{name}': starting with {} step(s)", self.pipeline.len());
        if self.config.log_steps {
            log::info!("job '{name}': steps {:?}", self.pipeline.step_names());
        }

        let result = self.pipeline.run_to_end(self.config.initial_state()).await;
        let elapsed = started.elapsed().as_millis();
        match &result {
            Ok(_) => log::info!("job '{name}': finished in {elapsed}ms"),
            Err(err) => log::error!("job '{name}': failed after {elapsed}ms: {err}"),
        }
        result
    }
}
