//! Record value type.

use serde::{Deserialize, Serialize};

/// One decoded line.
///
/// `text` holds the raw line including its trailing newline (and any `\r`
/// before it), or the partial final line when the stream ends first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineRecord {
    pub text: String,
}

impl LineRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Decode raw bytes as UTF-8, replacing invalid sequences with U+FFFD.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            text: String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the record ends with a newline (false only for a partial final line).
    pub fn is_terminated(&self) -> bool {
        self.text.ends_with('\n')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_text_field() {
        let record = LineRecord::new("a,b\n");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"text":"a,b\n"}"#);
    }

    #[test]
    fn test_from_bytes_lossy() {
        let record = LineRecord::from_bytes(b"caf\xff\n");
        assert_eq!(record.text(), "caf\u{FFFD}\n");
        assert!(record.is_terminated());
        assert!(!LineRecord::new("tail").is_terminated());
    }
}
