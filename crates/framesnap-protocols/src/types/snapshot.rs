//! Capture results: per-frame outlines, diagnostics and the combined snapshot.

use serde::{Deserialize, Serialize};

use super::dom::{join_xpath, ScrollableMap, TagNameMap, UrlMap, XPathMap};
use super::ids::{CompositeKey, FrameId, SessionKey};

/// Accessibility outline text for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerFrameOutline {
    pub frame_id: FrameId,
    pub outline: String,
}

/// Where a captured frame sits in the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub frame_id: FrameId,
    pub ordinal: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<FrameId>,
    /// Key of the iframe element hosting this frame, in the parent's key space.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_key: Option<CompositeKey>,
}

/// Set when a snapshot was produced by the scoped single-frame path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeInfo {
    pub frame_id: FrameId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail_xpath: Option<String>,
    /// Absolute path of the target frame's host iframe chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abs_prefix: Option<String>,
}

/// Capture stage a diagnostic was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticStage {
    SessionResolve,
    SessionBuild,
    FrameOwner,
    Outline,
}

/// A recoverable failure that excluded part of the page from the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureDiagnostic {
    pub stage: DiagnosticStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<FrameId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_key: Option<SessionKey>,
    pub message: String,
}

impl CaptureDiagnostic {
    pub fn frame(stage: DiagnosticStage, frame_id: &FrameId, message: impl Into<String>) -> Self {
        Self {
            stage,
            frame_id: Some(frame_id.clone()),
            session_key: None,
            message: message.into(),
        }
    }

    pub fn session(stage: DiagnosticStage, key: &SessionKey, message: impl Into<String>) -> Self {
        Self {
            stage,
            frame_id: None,
            session_key: Some(key.clone()),
            message: message.into(),
        }
    }
}

/// The public result of a capture. Same shape for the scoped and full paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedSnapshot {
    pub combined_tree: String,
    pub combined_xpath_map: XPathMap,
    pub combined_tag_name_map: TagNameMap,
    pub combined_scrollable_map: ScrollableMap,
    pub combined_url_map: UrlMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_frame: Option<Vec<PerFrameOutline>>,
    #[serde(default)]
    pub frames: Vec<FrameSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<CaptureDiagnostic>,
}

impl CombinedSnapshot {
    pub fn is_scoped(&self) -> bool {
        self.scope.is_some()
    }

    pub fn frame_by_ordinal(&self, ordinal: u32) -> Option<&FrameSummary> {
        self.frames.iter().find(|f| f.ordinal == ordinal)
    }

    /// Fully qualified cross-frame path for a key.
    ///
    /// Composes the frame-relative path with the relative paths of every
    /// hosting iframe up to the top frame. Returns `None` when the key or any
    /// hosting iframe is missing from the snapshot.
    pub fn qualified_xpath(&self, key: &CompositeKey) -> Option<String> {
        let mut path = self.combined_xpath_map.get(key)?.clone();
        let mut frame = self.frame_by_ordinal(key.ordinal)?;
        // bounded by frame count so a malformed owner chain cannot loop
        for _ in 0..self.frames.len() {
            match frame.owner_key {
                Some(owner) => {
                    let owner_path = self.combined_xpath_map.get(&owner)?;
                    path = join_xpath(owner_path, &path);
                    frame = self.frame_by_ordinal(owner.ordinal)?;
                }
                None => {
                    if let Some(scope) = self.scope.as_ref().filter(|s| s.frame_id == frame.frame_id) {
                        if let Some(prefix) = scope.abs_prefix.as_deref() {
                            path = join_xpath(prefix, &path);
                        }
                    }
                    return Some(path);
                }
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
