//! Byte/text conversion primitives.
//!
//! These are the platform implementations that seed the ambient registry.
//! Nothing outside this module should call them by name; hardened code goes
//! through a captured [`PrimitiveSnapshot`](super::PrimitiveSnapshot).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decodes a byte sequence to text.
pub type DecodeFn = fn(&[u8], Encoding) -> String;

/// Encodes text to a byte sequence.
pub type EncodeFn = fn(&str, Encoding) -> Vec<u8>;

/// Builds a fresh byte sequence from text or bytes.
pub type ConstructFn = fn(ByteSource<'_>, Encoding) -> Vec<u8>;

/// Character encodings understood by the primitives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// UTF-8. Decoding is lossy: invalid sequences become U+FFFD.
    #[default]
    Utf8,

    /// ISO-8859-1, one byte per character.
    Latin1,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => write!(f, "utf8"),
            Encoding::Latin1 => write!(f, "latin1"),
        }
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" | "binary" => Ok(Encoding::Latin1),
            other => Err(format!("unsupported encoding '{}'", other)),
        }
    }
}

/// Input accepted by the construct primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteSource<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
}

/// Replacement byte for characters Latin-1 cannot represent.
const LATIN1_SUBSTITUTE: u8 = b'?';

pub(crate) fn platform_decode(bytes: &[u8], encoding: Encoding) -> String {
    match encoding {
        Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        Encoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

pub(crate) fn platform_encode(text: &str, encoding: Encoding) -> Vec<u8> {
    match encoding {
        Encoding::Utf8 => text.as_bytes().to_vec(),
        Encoding::Latin1 => text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(LATIN1_SUBSTITUTE))
            .collect(),
    }
}

pub(crate) fn platform_construct(source: ByteSource<'_>, encoding: Encoding) -> Vec<u8> {
    match source {
        // Bound directly, never through the ambient encode slot.
        ByteSource::Text(text) => platform_encode(text, encoding),
        ByteSource::Bytes(bytes) => bytes.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_decode_is_lossy() {
        let decoded = platform_decode(b"data/\xffreport", Encoding::Utf8);
        assert_eq!(decoded, "data/\u{FFFD}report");
    }

    #[test]
    fn test_latin1_maps_each_byte() {
        let decoded = platform_decode(&[0x63, 0x61, 0x66, 0xe9], Encoding::Latin1);
        assert_eq!(decoded, "café");
        assert_eq!(platform_encode("café", Encoding::Latin1), vec![0x63, 0x61, 0x66, 0xe9]);
    }

    #[test]
    fn test_latin1_substitutes_unrepresentable_chars() {
        assert_eq!(platform_encode("a\u{0101}b", Encoding::Latin1), b"a?b".to_vec());
    }

    #[test]
    fn test_construct_copies_bytes_verbatim() {
        let source = [0xde, 0xad, 0xbe, 0xef];
        let built = platform_construct(ByteSource::Bytes(&source), Encoding::Latin1);
        assert_eq!(built, source.to_vec());
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("UTF-8".parse::<Encoding>(), Ok(Encoding::Utf8));
        assert_eq!("binary".parse::<Encoding>(), Ok(Encoding::Latin1));
        assert!("ebcdic".parse::<Encoding>().is_err());
    }
}
