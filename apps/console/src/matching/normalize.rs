//! Total normalization of the match payload.
//!
//! The server may wrap the payload in a `data` envelope or send it raw, may
//! omit `matches`, `total`, `semanticCount`, or `fallback`, and may send
//! counts inconsistent with the match list. Normalization never fails on a
//! missing or malformed optional field; the only error is a response that is
//! not a JSON object at all.

use serde_json::{Map, Value};

use crate::errors::ApiError;
use crate::models::matching::{JobMatch, MatchResult};

pub fn match_result(raw: &Value) -> Result<MatchResult, ApiError> {
    let Some(outer) = raw.as_object() else {
        return Err(ApiError::MalformedPayload(format!(
            "expected a JSON object, got {}",
            json_kind(raw)
        )));
    };

    // A present-but-unusable envelope degrades to the empty result rather
    // than failing.
    let payload: &Map<String, Value> = match outer.get("data") {
        Some(Value::Object(inner)) => inner,
        Some(Value::Null) | None => outer,
        Some(_) => return Ok(MatchResult::empty()),
    };

    let matches: Vec<JobMatch> = payload
        .get("matches")
        .cloned()
        .map(|v| serde_json::from_value(v).unwrap_or_default())
        .unwrap_or_default();

    let total = payload
        .get("total")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(matches.len());

    let explicit_fallback = payload
        .get("fallback")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    // An absent count means "fully personalized", unless the server flagged
    // fallback without saying how much, in which case none are.
    let semantic_count = match payload.get("semanticCount").and_then(Value::as_i64) {
        Some(n) => (n.max(0) as usize).min(matches.len()),
        None if explicit_fallback => 0,
        None => matches.len(),
    };

    // Derived, never taken at face value: fallback is true exactly when
    // filler entries are present.
    let fallback = semantic_count < matches.len();

    Ok(MatchResult {
        matches,
        total,
        semantic_count,
        fallback,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
