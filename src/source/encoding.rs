use crate::error::SourceError;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// Text encoding hint for delimited source files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// ISO-8859-1; every byte maps to the code point of the same value.
    #[default]
    Latin1,
}

impl TextEncoding {
    pub fn decode(&self, bytes: &[u8]) -> Result<String, SourceError> {
        match self {
            TextEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                String::from_utf8(bytes.to_vec())
                    .map_err(|e| SourceError::Value(format!("invalid UTF-8: {}", e)))
            }
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "iso-8859-1" | "latin-1" | "latin1" | "iso8859-1" => Ok(TextEncoding::Latin1),
            other => Err(format!("unsupported text encoding `{}`", other)),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => f.write_str("utf-8"),
            TextEncoding::Latin1 => f.write_str("iso-8859-1"),
        }
    }
}

impl<'de> Deserialize<'de> for TextEncoding {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
