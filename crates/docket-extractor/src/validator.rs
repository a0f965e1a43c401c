//! Validate backend output before it is written as a result

use crate::error::ValidationError;
use serde_json::Value;

/// Top-level shape of a decoded response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// JSON object
    Object,
    /// JSON array
    Array,
    /// String, number, boolean or null
    Scalar,
}

impl ResponseShape {
    /// Classify a decoded value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => ResponseShape::Object,
            Value::Array(_) => ResponseShape::Array,
            _ => ResponseShape::Scalar,
        }
    }
}

/// Accepts structured JSON responses and rejects everything else
#[derive(Debug, Clone, Copy)]
pub struct ResponseValidator {
    allow_arrays: bool,
}

impl ResponseValidator {
    /// Create a validator
    pub fn new(allow_arrays: bool) -> Self {
        Self { allow_arrays }
    }

    /// Decode and check a raw response
    pub fn validate(&self, raw_text: &str) -> Result<Value, ValidationError> {
        let json_str = strip_code_fence(raw_text);
        if json_str.is_empty() {
            return Err(ValidationError::Empty);
        }

        let value: Value =
            serde_json::from_str(json_str).map_err(|e| ValidationError::Malformed(e.to_string()))?;

        match ResponseShape::of(&value) {
            ResponseShape::Object => Ok(value),
            ResponseShape::Array if self.allow_arrays => Ok(value),
            shape => Err(ValidationError::UnsupportedShape(shape)),
        }
    }
}

impl Default for ResponseValidator {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Remove a surrounding markdown code fence (```json ... ```)
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (`json`, `JSON`, ...) on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
