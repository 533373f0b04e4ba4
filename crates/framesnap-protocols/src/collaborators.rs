//! Collaborator protocols: DOM walking, accessibility outlines and focus
//! resolution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::page::{Page, Session};
use crate::types::{
    DomMaps, FrameId, ScrollableMap, SessionDomIndex, TagNameMap, UrlMap, XPathMap,
};

/// Builds DOM addressing data for a session.
#[async_trait]
pub trait DomIndexer: Send + Sync {
    /// Walk the session's whole document tree. Potentially slow.
    async fn build_session_dom_index(
        &self,
        session: &dyn Session,
        experimental: bool,
    ) -> Result<SessionDomIndex, CollaboratorError>;

    /// Maps for a single frame of a session, keyed with the frame's ordinal.
    async fn dom_maps_for_session(
        &self,
        session: &dyn Session,
        request: &DomMapsRequest,
    ) -> Result<DomMaps, CollaboratorError>;
}

/// Request for [`DomIndexer::dom_maps_for_session`].
#[derive(Debug, Clone)]
pub struct DomMapsRequest {
    pub frame_id: FrameId,
    pub ordinal: u32,
    pub experimental: bool,
}

/// Renders the accessibility outline of one frame.
#[async_trait]
pub trait OutlineProvider: Send + Sync {
    async fn outline_for_frame(
        &self,
        session: &dyn Session,
        request: &OutlineRequest<'_>,
    ) -> Result<FrameOutline, CollaboratorError>;
}

/// Request for [`OutlineProvider::outline_for_frame`].
#[derive(Debug, Clone)]
pub struct OutlineRequest<'a> {
    pub frame_id: &'a FrameId,
    pub ordinal: u32,
    /// Restrict the outline to the subtree at this frame-relative path.
    pub focus_xpath: Option<&'a str>,
    pub xpath_map: Option<&'a XPathMap>,
    pub tag_name_map: Option<&'a TagNameMap>,
    pub scrollable_map: Option<&'a ScrollableMap>,
    pub collect_urls: bool,
    pub experimental: bool,
}

impl<'a> OutlineRequest<'a> {
    pub fn new(frame_id: &'a FrameId, ordinal: u32) -> Self {
        Self {
            frame_id,
            ordinal,
            focus_xpath: None,
            xpath_map: None,
            tag_name_map: None,
            scrollable_map: None,
            collect_urls: true,
            experimental: false,
        }
    }
}

/// Outline text for one frame plus the link URLs found in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameOutline {
    pub outline: String,
    pub url_map: UrlMap,
    /// True when a requested focus scope was found and applied.
    pub scope_applied: bool,
}

/// Maps a user-supplied selector to a frame and a path inside it.
#[async_trait]
pub trait FocusResolver: Send + Sync {
    /// `Ok(None)` when the selector does not resolve.
    async fn resolve(
        &self,
        page: &dyn Page,
        selector: &str,
    ) -> Result<Option<FocusTarget>, CollaboratorError>;
}

/// Resolved focus selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusTarget {
    pub target_frame_id: FrameId,
    /// Path of the focused element inside the target frame.
    pub tail_xpath: Option<String>,
    /// Absolute path of the iframe chain leading to the target frame.
    pub abs_prefix: Option<String>,
}
