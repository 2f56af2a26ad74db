//! JSON decoder implementation

use crate::cache::CachedResponse;
use crate::error::{Error, Result};
use serde_json::Value;

/// JSON body decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl JsonDecoder {
    /// Create a new JSON decoder
    pub fn new() -> Self {
        Self
    }

    /// Decode a response; `None` or an empty body yields `[]`
    pub fn decode(&self, response: Option<&CachedResponse>) -> Result<Value> {
        match response {
            Some(response) if !response.is_empty() => self.decode_str(response.text()?),
            _ => Ok(empty()),
        }
    }

    /// Decode a body string; blank input yields `[]`
    pub fn decode_str(&self, body: &str) -> Result<Value> {
        if body.trim().is_empty() {
            return Ok(empty());
        }
        serde_json::from_str(body).map_err(|e| Error::Decode {
            message: format!("Failed to parse JSON: {e}"),
        })
    }
}

fn empty() -> Value {
    Value::Array(Vec::new())
}

/// Split a decoded page into its items
///
/// Arrays yield their elements; any other value is a single item.
pub fn into_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}
