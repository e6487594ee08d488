//! Artifact kinds, keys and store-assigned identifiers
//!
//! ID Format:
//! - `{prefix}-{7-char-hash}` (e.g., `ct-7f2b4c1` for a content type)
//! - Prefixes: `ct`, `dt`, `tp`, `mc`, `js`, `css`, `pv`
//!
//! Hash is derived from kind + key + creation timestamp, so re-deploying an
//! artifact with the same key after a retract yields a fresh ID.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Artifact key must not be empty")]
    EmptyKey,

    #[error("Invalid artifact ID format: expected '{{prefix}}-{{7-char-hash}}', got '{0}'")]
    InvalidArtifactId(String),

    #[error("Unknown artifact kind: '{0}' (expected one of: content-type, data-type, template, macro, script, stylesheet, partial-view)")]
    UnknownKind(String),
}

/// The seven deployable artifact kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    DataType,
    Template,
    ContentType,
    Macro,
    Script,
    Stylesheet,
    PartialView,
}

impl ArtifactKind {
    /// All kinds, in manifest section order
    pub const ALL: [ArtifactKind; 7] = [
        ArtifactKind::DataType,
        ArtifactKind::Template,
        ArtifactKind::ContentType,
        ArtifactKind::Macro,
        ArtifactKind::Script,
        ArtifactKind::Stylesheet,
        ArtifactKind::PartialView,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::DataType => "data-type",
            ArtifactKind::Template => "template",
            ArtifactKind::ContentType => "content-type",
            ArtifactKind::Macro => "macro",
            ArtifactKind::Script => "script",
            ArtifactKind::Stylesheet => "stylesheet",
            ArtifactKind::PartialView => "partial-view",
        }
    }

    /// Human-readable plural used in messages
    pub fn plural(&self) -> &'static str {
        match self {
            ArtifactKind::DataType => "data types",
            ArtifactKind::Template => "templates",
            ArtifactKind::ContentType => "content types",
            ArtifactKind::Macro => "macros",
            ArtifactKind::Script => "scripts",
            ArtifactKind::Stylesheet => "stylesheets",
            ArtifactKind::PartialView => "partial views",
        }
    }

    /// Prefix used for IDs of this kind
    pub fn id_prefix(&self) -> &'static str {
        match self {
            ArtifactKind::DataType => "dt",
            ArtifactKind::Template => "tp",
            ArtifactKind::ContentType => "ct",
            ArtifactKind::Macro => "mc",
            ArtifactKind::Script => "js",
            ArtifactKind::Stylesheet => "css",
            ArtifactKind::PartialView => "pv",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id_prefix() == prefix)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| IdError::UnknownKind(s.to_string()))
    }
}

/// Unique key of an artifact within its kind's namespace (alias, name or path)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactKey(String);

impl ArtifactKey {
    /// Creates a key, trimming surrounding whitespace
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(IdError::EmptyKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArtifactKey {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ArtifactKey {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ArtifactKey> for String {
    fn from(key: ArtifactKey) -> Self {
        key.0
    }
}

/// Generates a 7-character hash from kind, key and timestamp
fn generate_hash(kind: ArtifactKind, key: &ArtifactKey, timestamp: DateTime<Utc>) -> String {
    let input = format!(
        "{}:{}:{}",
        kind,
        key,
        timestamp.timestamp_nanos_opt().unwrap_or(0)
    );
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

/// Identifier assigned by the store when an artifact is created
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactId {
    kind: ArtifactKind,
    hash: String,
}

impl ArtifactId {
    /// Generates a new ID for an artifact of `kind` with `key`, created at `timestamp`
    pub fn generate(kind: ArtifactKind, key: &ArtifactKey, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            hash: generate_hash(kind, key, timestamp),
        }
    }

    /// Returns the kind encoded in the ID prefix
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Returns the hash portion of the ID
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.id_prefix(), self.hash)
    }
}

impl FromStr for ArtifactId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (prefix, hash) = s
            .split_once('-')
            .ok_or_else(|| IdError::InvalidArtifactId(s.to_string()))?;

        let kind = ArtifactKind::from_prefix(prefix)
            .ok_or_else(|| IdError::InvalidArtifactId(s.to_string()))?;

        if hash.len() != 7 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdError::InvalidArtifactId(s.to_string()));
        }

        Ok(Self {
            kind,
            hash: hash.to_string(),
        })
    }
}

impl TryFrom<String> for ArtifactId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArtifactId> for String {
    fn from(id: ArtifactId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn key(s: &str) -> ArtifactKey {
        ArtifactKey::new(s).unwrap()
    }

    #[test]
    fn key_is_trimmed() {
        assert_eq!(key("  homePage ").as_str(), "homePage");
    }

    #[test]
    fn empty_key_rejected() {
        assert_eq!(ArtifactKey::new("   "), Err(IdError::EmptyKey));
        assert_eq!(ArtifactKey::new(""), Err(IdError::EmptyKey));
    }

    #[test]
    fn kind_parses_loosely() {
        assert_eq!("content-type".parse::<ArtifactKind>().unwrap(), ArtifactKind::ContentType);
        assert_eq!("Partial_View".parse::<ArtifactKind>().unwrap(), ArtifactKind::PartialView);
        assert!("widget".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn id_format() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let id = ArtifactId::generate(ArtifactKind::ContentType, &key("homePage"), ts);
        let s = id.to_string();

        assert!(s.starts_with("ct-"));
        assert_eq!(s.len(), 10);
        assert_eq!(id.kind(), ArtifactKind::ContentType);
    }

    #[test]
    fn id_differs_by_kind_and_time() {
        let ts1 = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let ts2 = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 1).unwrap();
        let k = key("master");

        let a = ArtifactId::generate(ArtifactKind::Template, &k, ts1);
        let b = ArtifactId::generate(ArtifactKind::Template, &k, ts2);
        let c = ArtifactId::generate(ArtifactKind::Script, &k, ts1);

        assert_ne!(a, b);
        assert_ne!(a.hash(), c.hash());
    }

    #[test]
    fn id_parse_roundtrip() {
        let id: ArtifactId = "css-abc1234".parse().unwrap();
        assert_eq!(id.kind(), ArtifactKind::Stylesheet);
        assert_eq!(id.to_string(), "css-abc1234");
    }

    #[test]
    fn id_parse_rejects_garbage() {
        assert!("xx-abc1234".parse::<ArtifactId>().is_err());
        assert!("ct-abc".parse::<ArtifactId>().is_err());
        assert!("ct-zzzzzzz".parse::<ArtifactId>().is_err());
        assert!("ctabc1234".parse::<ArtifactId>().is_err());
    }

    #[test]
    fn id_serde_as_string() {
        let id: ArtifactId = "tp-0a1b2c3".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"tp-0a1b2c3\"");

        let back: ArtifactId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
