//! Content hashing for staleness checks.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A 128-bit content digest (XXH3-128) of a source file.
///
/// Rendered as 32 lowercase hex characters, which is also how it is stored in
/// the manifest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_be_bytes())
    }

    /// Hashes the current content of `path`.
    pub fn of_file(path: &Path) -> Result<Self, HashError> {
        let bytes = fs::read(path).map_err(|source| HashError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_bytes(&bytes))
    }
}

/// A source could not be read while computing its digest.
#[derive(Debug, thiserror::Error)]
#[error("could not hash {}: {source}", .path.display())]
pub struct HashError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("expected 32 hex characters, got {0:?}")]
pub struct ParseHashError(String);

impl FromStr for ContentHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseHashError(s.to_string()));
        }
        let mut out = [0u8; 16];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| ParseHashError(s.to_string()))?;
        }
        Ok(Self(out))
    }
}

// Stored as plain hex strings so the manifest stays readable JSON.
impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.to_ascii_lowercase()
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = ContentHash::from_bytes(b"int main() {}");
        let b = ContentHash::from_bytes(b"int main() {}");
        assert_eq!(a, b);
    }

    #[test]
    fn single_byte_change_differs() {
        let a = ContentHash::from_bytes(b"int x = 1;");
        let b = ContentHash::from_bytes(b"int x = 2;");
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_lowercase_hex() {
        let s = ContentHash::from_bytes(b"test").to_string();
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn parses_its_own_display() {
        let h = ContentHash::from_bytes(b"roundtrip");
        let parsed: ContentHash = h.to_string().parse().unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!("abc".parse::<ContentHash>().is_err());
        assert!("zz".repeat(16).parse::<ContentHash>().is_err());
    }

    #[test]
    fn accepts_uppercase_in_json() {
        let h = ContentHash::from_bytes(b"case");
        let json = format!("\"{}\"", h.to_string().to_uppercase());
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn rejects_signs_and_non_hex() {
        assert!("+f".repeat(16).parse::<ContentHash>().is_err());
        assert!("g".repeat(32).parse::<ContentHash>().is_err());
        assert!("ab".repeat(15).parse::<ContentHash>().is_err());
        assert!("0f".repeat(16).parse::<ContentHash>().is_ok());
    }

    #[test]
    fn missing_file_is_hash_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContentHash::of_file(&dir.path().join("gone.c")).unwrap_err();
        assert!(err.to_string().contains("gone.c"));
    }
}
