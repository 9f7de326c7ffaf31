//! URL-query style key-value codec used by Corrade.
//!
//! Corrade notifications and commands are flat `key=value&key=value`
//! strings with percent-encoded keys and values.

use crate::common::error::{RelayError, RelayResult};

/// Ordered key-value pairs decoded from a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValues {
    pairs: Vec<(String, String)>,
}

impl KeyValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair. Order is preserved when encoding.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Value of the first pair with this key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Encode as `key=value&...` with percent-encoded keys and values.
    pub fn encode(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (k, v) in iter {
            values.push(k, v);
        }
        values
    }
}

/// Decode a raw payload.
///
/// Fails only when the payload (or a percent-decoded component) is not UTF-8.
/// Such a payload is dropped whole rather than passed on with replacement
/// characters or raw escapes, since Corrade always sends UTF-8.
pub fn decode(payload: &[u8]) -> RelayResult<KeyValues> {
    let text = std::str::from_utf8(payload).map_err(|e| RelayError::MalformedPayload {
        message: format!("payload is not UTF-8: {}", e),
    })?;

    let mut values = KeyValues::new();
    for segment in text.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
        values.push(decode_component(key)?, decode_component(value)?);
    }
    Ok(values)
}

fn decode_component(component: &str) -> RelayResult<String> {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| RelayError::MalformedPayload {
            message: format!("invalid percent-encoding in '{}': {}", component, e),
        })
}
