//! Identifier types: frames, sessions, backend nodes and composite keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Session key shared by every session that exposes no identifier.
pub const ROOT_SESSION_KEY: &str = "root";

/// Identifier of a frame (top-level document or iframe) within one page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub String);

impl FrameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FrameId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FrameId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Deduplication key for a debugging session.
///
/// Sessions without a stable id all map to [`ROOT_SESSION_KEY`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(pub String);

impl SessionKey {
    /// Key for a session id, coalescing anonymous sessions.
    pub fn from_session_id(id: Option<&str>) -> Self {
        match id {
            Some(id) if !id.is_empty() => Self(id.to_string()),
            _ => Self(ROOT_SESSION_KEY.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_SESSION_KEY
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session-scoped DOM node identifier. Not unique across sessions.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BackendNodeId(pub i64);

impl fmt::Display for BackendNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for BackendNodeId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Globally unique node key for one capture: `"{ordinal}-{backendNodeId}"`.
///
/// The ordinal selects the frame, the backend id indexes into that frame's
/// session. Two frames never share an ordinal within a capture, so keys from
/// different frames never collide even when raw node ids do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey {
    pub ordinal: u32,
    pub backend_node_id: BackendNodeId,
}

impl CompositeKey {
    pub fn new(ordinal: u32, backend_node_id: impl Into<BackendNodeId>) -> Self {
        Self {
            ordinal,
            backend_node_id: backend_node_id.into(),
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ordinal, self.backend_node_id.0)
    }
}

/// Error parsing a composite key string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid composite key: {0}")]
pub struct ParseCompositeKeyError(pub String);

impl FromStr for CompositeKey {
    type Err = ParseCompositeKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ordinal, backend) = s
            .split_once('-')
            .ok_or_else(|| ParseCompositeKeyError(s.to_string()))?;
        let ordinal = ordinal
            .parse::<u32>()
            .map_err(|_| ParseCompositeKeyError(s.to_string()))?;
        let backend = backend
            .parse::<i64>()
            .map_err(|_| ParseCompositeKeyError(s.to_string()))?;
        Ok(Self::new(ordinal, backend))
    }
}

impl Serialize for CompositeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CompositeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
