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

//! Date parsing and formatting for step bodies.
//!
//! Format strings use chrono's strftime syntax (`%Y-%m-%d %H:%M`).

use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::{Result, ZiError};

/// Parses `text` with `format`. Date-only formats give midnight.
pub fn parse(text: &str, format: &str) -> Result<NaiveDateTime> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
        return Ok(datetime);
    }
    let date = NaiveDate::parse_from_str(text, format)
        .map_err(|err| ZiError::validation(format!("cannot parse '{text}' as '{format}': {err}")))?;
    date.and_hms_opt(0, 0, 0)
        .ok_or_else(|| ZiError::internal("midnight is always a valid time"))
}

/// Renders `datetime` with `format`.
pub fn format(datetime: &NaiveDateTime, format: &str) -> String {
    datetime.format(format).to_string()
}
