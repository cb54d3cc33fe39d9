//! Byte-level encoding of documents.
//!
//! JSON is always available; RON sits behind the `serialize-ron` feature.

use super::Document;
use super::error::{DeserializeError, SerializeError};

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// RON (Rusty Object Notation), human-readable text format.
    #[cfg(feature = "serialize-ron")]
    Ron,
}

/// Encode a document to bytes in the given format.
pub fn encode(document: &Document, format: Format) -> Result<Vec<u8>, SerializeError> {
    match format {
        Format::Json => serde_json::to_vec_pretty(document)
            .map_err(|e| SerializeError::FormatError(e.to_string())),
        #[cfg(feature = "serialize-ron")]
        Format::Ron => ron::ser::to_string_pretty(document, ron::ser::PrettyConfig::default())
            .map(|s| s.into_bytes())
            .map_err(|e| SerializeError::FormatError(e.to_string())),
    }
}

/// Decode bytes in the given format to a document.
pub fn decode(bytes: &[u8], format: Format) -> Result<Document, DeserializeError> {
    match format {
        Format::Json => {
            serde_json::from_slice(bytes).map_err(|e| DeserializeError::FormatError(e.to_string()))
        }
        #[cfg(feature = "serialize-ron")]
        Format::Ron => {
            let s = std::str::from_utf8(bytes)
                .map_err(|e| DeserializeError::FormatError(e.to_string()))?;
            ron::from_str(s).map_err(|e| DeserializeError::FormatError(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_round_trip_keeps_field_order() {
        let document = json!({ "Zeta": 1, "Alpha": [1.5, 2.0], "Ref": { "GOID": 3 } });
        let bytes = encode(&document, Format::Json).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.find("Zeta").unwrap() < text.find("Alpha").unwrap());
        assert_eq!(decode(&bytes, Format::Json).unwrap(), document);
    }

    #[test]
    fn garbage_is_a_format_error() {
        assert!(matches!(
            decode(b"{ not json", Format::Json),
            Err(DeserializeError::FormatError(_))
        ));
    }
}
