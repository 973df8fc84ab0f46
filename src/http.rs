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

//! # Zi HTTP Module
//!
//! Steps that issue HTTP requests. Each verb helper takes a request
//! configuration written as a [`ZiLazy`] object, resolves it against the
//! state when the step runs, sends the request and produces the next state
//! with the response body as `data`.
//!
//! ## Request Configuration
//!
//! | Key       | Meaning                                                     |
//! |-----------|-------------------------------------------------------------|
//! | `url`     | absolute URL, or a path joined onto `baseURL`               |
//! | `baseURL` | overrides [`ZiHttpConfig::base_url`]                        |
//! | `params`  | object appended as query parameters                         |
//! | `headers` | object of header values                                     |
//! | `data`    | body: string as text, other JSON as JSON, opaque `Vec<u8>` as bytes |
//! | `timeout` | milliseconds                                                |
//! | `client`  | opaque `reqwest::Client` to send with (alias `agent`)        |
//!
//! Opaque values are passed through resolution untouched.
//!
//! ## Resulting State
//!
//! The response body becomes `data`, the previous `data` is appended to
//! `references`, and `{status, statusText, headers}` is stored under the
//! `response` key. Non-2xx statuses are not treated as failures.
//!
//! ```rust
//! use zi_job::http;
//! use zi_job::lazy::ZiLazy;
//! use zi_job::source::data_value;
//!
//! let step = http::post(ZiLazy::object([
//!     ("url", ZiLazy::from("https://example.com/api/patients")),
//!     ("data", ZiLazy::from(data_value("patient"))),
//! ]));
//! ```

use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::errors::{Result, ZiError};
use crate::lazy::{expand_references_with, ZiLazy};
use crate::operation::{operation_outcome, ZiOp, ZiOutcome};

/// Client-wide defaults for the http steps.
#[derive(Clone, Debug)]
pub struct ZiHttpConfig {
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ZiHttpConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 30,
            user_agent: concat!("zi-job/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ZiHttpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, agent: &str) -> Self {
        self.user_agent = agent.to_string();
        self
    }

    fn build_client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .user_agent(self.user_agent.clone())
            .build()?)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZiHttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl ZiHttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZiHttpMethod::Get => "GET",
            ZiHttpMethod::Post => "POST",
            ZiHttpMethod::Put => "PUT",
            ZiHttpMethod::Patch => "PATCH",
            ZiHttpMethod::Delete => "DELETE",
            ZiHttpMethod::Head => "HEAD",
            ZiHttpMethod::Options => "OPTIONS",
        }
    }

    /// Step name used in logs and trails.
    pub fn step_name(&self) -> &'static str {
        match self {
            ZiHttpMethod::Get => "get",
            ZiHttpMethod::Post => "post",
            ZiHttpMethod::Put => "put",
            ZiHttpMethod::Patch => "patch",
            ZiHttpMethod::Delete => "delete",
            ZiHttpMethod::Head => "head",
            ZiHttpMethod::Options => "options",
        }
    }

    fn to_method(self) -> Method {
        match self {
            ZiHttpMethod::Get => Method::GET,
            ZiHttpMethod::Post => Method::POST,
            ZiHttpMethod::Put => Method::PUT,
            ZiHttpMethod::Patch => Method::PATCH,
            ZiHttpMethod::Delete => Method::DELETE,
            ZiHttpMethod::Head => Method::HEAD,
            ZiHttpMethod::Options => Method::OPTIONS,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ZiHttpBody {
    Empty,
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
}

/// A request ready to send, built from a resolved configuration.
#[derive(Clone, Debug)]
pub struct ZiHttpRequest {
    pub method: ZiHttpMethod,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: ZiHttpBody,
    pub timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

/// Skip predicate for request configurations: opaque values stay opaque.
pub fn skip_opaque(value: &ZiLazy) -> bool {
    matches!(value, ZiLazy::Opaque(_))
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn pairs(config: &ZiLazy, key: &str) -> Result<Vec<(String, String)>> {
    let Some(entry) = config.get(key) else {
        return Ok(Vec::new());
    };
    match entry.clone().into_value()? {
        Value::Object(map) => Ok(map
            .iter()
            .filter_map(|(name, value)| text_of(value).map(|text| (name.clone(), text)))
            .collect()),
        Value::Null => Ok(Vec::new()),
        _ => Err(ZiError::validation(format!("request '{key}' must be an object"))),
    }
}

fn join_url(base: Option<&str>, url: &str) -> String {
    let absolute = url.starts_with("http://") || url.starts_with("https://");
    match base {
        Some(base) if !absolute => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            url.trim_start_matches('/')
        ),
        _ => url.to_string(),
    }
}

impl ZiHttpRequest {
    /// Builds a request from a configuration that has already been resolved.
    pub fn from_config(method: ZiHttpMethod, config: &ZiLazy, settings: &ZiHttpConfig) -> Result<Self> {
        if !matches!(config, ZiLazy::Object(_)) {
            return Err(ZiError::validation("request configuration must be an object"));
        }

        let url = config
            .get("url")
            .and_then(ZiLazy::as_value)
            .and_then(Value::as_str)
            .ok_or_else(|| ZiError::validation("request configuration requires string 'url'"))?;
        let base = config
            .get("baseURL")
            .and_then(ZiLazy::as_value)
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| settings.base_url.clone());

        let body = match config.get("data") {
            None => ZiHttpBody::Empty,
            Some(ZiLazy::Opaque(handle)) => {
                if let Some(bytes) = handle.downcast_ref::<Vec<u8>>() {
                    ZiHttpBody::Bytes(bytes.clone())
                } else if let Some(text) = handle.downcast_ref::<String>() {
                    ZiHttpBody::Text(text.clone())
                } else {
                    return Err(ZiError::validation("unsupported opaque request body"));
                }
            }
            Some(other) => match other.clone().into_value()? {
                Value::Null => ZiHttpBody::Empty,
                Value::String(text) => ZiHttpBody::Text(text),
                value => ZiHttpBody::Json(value),
            },
        };

        let timeout = config
            .get("timeout")
            .and_then(ZiLazy::as_value)
            .and_then(Value::as_u64)
            .map(Duration::from_millis);

        let client = ["client", "agent"].iter().find_map(|key| match config.get(key) {
            Some(ZiLazy::Opaque(handle)) => handle.downcast_ref::<reqwest::Client>().cloned(),
            _ => None,
        });

        Ok(ZiHttpRequest {
            method,
            url: join_url(base.as_deref(), url),
            params: pairs(config, "params")?,
            headers: pairs(config, "headers")?,
            body,
            timeout,
            client,
        })
    }

    /// Sends the request, using the configured client or one built from
    /// `settings`.
    pub async fn send(self, settings: &ZiHttpConfig) -> Result<ZiHttpResponse> {
        let client = match self.client {
            Some(client) => client,
            None => settings.build_client()?,
        };

        log::debug!("http: {} {}", self.method.as_str(), self.url);
        let mut builder = client.request(self.method.to_method(), &self.url);
        if !self.params.is_empty() {
            builder = builder.query(&self.params);
        }
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| ZiError::validation(format!("invalid header name '{name}': {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| ZiError::validation(format!("invalid header value: {err}")))?;
            builder = builder.header(name, value);
        }
        builder = match self.body {
            ZiHttpBody::Empty => builder,
            ZiHttpBody::Json(value) => builder.json(&value),
            ZiHttpBody::Text(text) => builder.body(text),
            ZiHttpBody::Bytes(bytes) => builder.body(bytes),
        };
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|text| (name.as_str().to_string(), Value::String(text.to_string())))
            })
            .collect::<Map<String, Value>>();
        let text = response.text().await?;
        log::debug!("http: {} responded {}", self.url, status.as_u16());

        let data = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(ZiHttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            data,
        })
    }
}

/// What came back from a request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZiHttpResponse {
    pub status: u16,
    #[serde(rename = "statusText")]
    pub status_text: String,
    pub headers: Map<String, Value>,
    pub data: Value,
}

impl ZiHttpResponse {
    /// Status line and headers, without the body.
    pub fn meta(&self) -> Value {
        json!({
            "status": self.status,
            "statusText": self.status_text,
            "headers": self.headers,
        })
    }
}

/// Builds a request step with explicit client defaults.
pub fn request_with(method: ZiHttpMethod, config: ZiLazy, settings: ZiHttpConfig) -> ZiOp {
    operation_outcome(method.step_name(), move |state| {
        let resolved = match expand_references_with(&config, &state, &skip_opaque) {
            Ok(resolved) => resolved,
            Err(err) => return ZiOutcome::failed(err),
        };
        let request = match ZiHttpRequest::from_config(method, &resolved, &settings) {
            Ok(request) => request,
            Err(err) => return ZiOutcome::failed(err),
        };
        let settings = settings.clone();

        ZiOutcome::pending(async move {
            let response = request.send(&settings).await?;
            let meta = response.meta();
            Ok(state.compose_next(response.data).with_extra("response", meta))
        })
    })
}

/// Builds a request step with default client settings.
pub fn request(method: ZiHttpMethod, config: ZiLazy) -> ZiOp {
    request_with(method, config, ZiHttpConfig::default())
}

pub fn get(config: ZiLazy) -> ZiOp {
    request(ZiHttpMethod::Get, config)
}

pub fn post(config: ZiLazy) -> ZiOp {
    request(ZiHttpMethod::Post, config)
}

pub fn put(config: ZiLazy) -> ZiOp {
    request(ZiHttpMethod::Put, config)
}

pub fn patch(config: ZiLazy) -> ZiOp {
    request(ZiHttpMethod::Patch, config)
}

pub fn delete(config: ZiLazy) -> ZiOp {
    request(ZiHttpMethod::Delete, config)
}

pub fn head(config: ZiLazy) -> ZiOp {
    request(ZiHttpMethod::Head, config)
}

pub fn options(config: ZiLazy) -> ZiOp {
    request(ZiHttpMethod::Options, config)
}
