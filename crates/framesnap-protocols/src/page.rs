//! Page and session protocol definitions.
//!
//! A [`Page`] is a handle on one browser page whose frames may be spread over
//! several debugging sessions. A [`Session`] is the transport for one of those
//! sessions.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SessionError;
use crate::types::{FrameId, FrameTreeNode, SessionKey};

/// A remote debugging session scoped to one frame-tree root.
#[async_trait]
pub trait Session: Send + Sync {
    /// Stable session identifier, if the transport exposes one.
    fn id(&self) -> Option<&str>;

    /// Issue one protocol call.
    async fn send(&self, method: &str, params: Option<Value>) -> Result<Value, SessionError>;

    /// Deduplication key; anonymous sessions share the root key.
    fn key(&self) -> SessionKey {
        SessionKey::from_session_id(self.id())
    }
}

/// A browser page composed of one or more frames.
pub trait Page: Send + Sync {
    /// Id of the top-level frame.
    fn main_frame_id(&self) -> FrameId;

    /// Nested frame tree rooted at the main frame.
    fn frame_tree(&self) -> FrameTreeNode;

    /// Every frame id the page currently knows about, attached or not.
    fn list_all_frame_ids(&self) -> Vec<FrameId>;

    /// Session that owns a frame's document.
    fn session_for_frame(&self, frame_id: &FrameId) -> Result<Arc<dyn Session>, SessionError>;

    /// Small integer uniquely identifying a frame, stable for the page's lifetime.
    fn ordinal(&self, frame_id: &FrameId) -> u32;
}
