//! Conversion of raw page strings into typed values.
//!
//! Every function is total: unparseable input yields `None` instead of an
//! error, so normalization can never fail a record.

use crate::results::Row;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

/// Placeholders analytics pages print instead of a value
const MISSING_PLACEHOLDERS: [&str; 4] = ["--", "n/a", "na", "-"];

fn suffixed_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^([\d.]+)\s*([KMB])").expect("static pattern"))
}

/// Converts abbreviated counts like `9.1M` or `1,234` to an integer.
///
/// `K`, `M` and `B` suffixes (any case) scale by a thousand, a million and a
/// billion; anything else must be an integer, optionally with thousands
/// separators.
pub fn normalize_number(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(caps) = suffixed_number().captures(trimmed) {
        let number: f64 = caps[1].parse().ok()?;
        let multiplier = match caps[2].to_ascii_uppercase().as_str() {
            "K" => 1e3,
            "M" => 1e6,
            _ => 1e9,
        };
        let scaled = (number * multiplier).round();
        // i64::MAX as f64 rounds up to 2^63, which is itself out of range
        if !scaled.is_finite() || scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
            return None;
        }
        return Some(scaled as i64);
    }

    trimmed.replace(',', "").trim().parse().ok()
}

/// Converts `55.43%` to `55.43`
pub fn normalize_percentage(value: &str) -> Option<f64> {
    let cleaned = value.trim().replace('%', "");
    let parsed: f64 = cleaned.trim().parse().ok()?;
    parsed.is_finite().then_some(parsed)
}

/// Converts `HH:MM:SS` (or `MM:SS`, or bare seconds) to total seconds
pub fn normalize_duration(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut parts = trimmed
        .split(':')
        .map(|part| part.trim().parse::<i64>().ok())
        .collect::<Option<Vec<_>>>()?;
    if parts.len() > 3 {
        return None;
    }
    while parts.len() < 3 {
        parts.insert(0, 0);
    }

    parts[0]
        .checked_mul(3600)?
        .checked_add(parts[1].checked_mul(60)?)?
        .checked_add(parts[2])
}

/// Converts `#7,435` to `7435`
pub fn normalize_rank(value: &str) -> Option<i64> {
    let cleaned = value.trim().replace(['#', ','], "");
    cleaned.trim().parse().ok()
}

/// Maps missing-data placeholders (`--`, `n/a`, `NA`, `-`) to `None`.
///
/// Any other non-empty value is returned unchanged.
pub fn handle_missing(value: &str) -> Option<&str> {
    if value.is_empty() {
        return None;
    }
    let lowered = value.trim().to_lowercase();
    if MISSING_PLACEHOLDERS.contains(&lowered.as_str()) {
        return None;
    }
    Some(value)
}

/// One transform in a list-field normalization pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    HandleMissing,
    Number,
    Percentage,
    Duration,
    Rank,
}

impl Step {
    /// Applies the step to one JSON value.
    ///
    /// Only strings are transformed; numbers and nulls are already
    /// normalized and pass through.
    pub fn apply(self, value: Value) -> Value {
        let text = match value {
            Value::String(text) => text,
            other => return other,
        };

        match self {
            Step::HandleMissing => handle_missing(&text)
                .map(|kept| Value::String(kept.to_string()))
                .unwrap_or(Value::Null),
            Step::Number => normalize_number(&text).map_or(Value::Null, Value::from),
            Step::Percentage => normalize_percentage(&text).map_or(Value::Null, Value::from),
            Step::Duration => normalize_duration(&text).map_or(Value::Null, Value::from),
            Step::Rank => normalize_rank(&text).map_or(Value::Null, Value::from),
        }
    }
}

/// Runs `steps` in order over the value at `key` in every row.
///
/// Rows without `key` are left alone, and an absent list passes through
/// unchanged.
pub fn normalize_list_field(data: Option<Vec<Row>>, key: &str, steps: &[Step]) -> Option<Vec<Row>> {
    let mut rows = data?;
    for row in &mut rows {
        if let Some(slot) = row.get_mut(key) {
            let mut value = slot.take();
            for step in steps {
                value = step.apply(value);
            }
            *slot = value;
        }
    }
    Some(rows)
}
