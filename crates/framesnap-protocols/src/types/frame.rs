//! Frame hierarchy types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ids::FrameId;

/// A node of the page's protocol frame tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameTreeNode {
    pub frame_id: FrameId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<FrameId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub children: Vec<FrameTreeNode>,
}

impl FrameTreeNode {
    pub fn new(frame_id: impl Into<FrameId>) -> Self {
        Self {
            frame_id: frame_id.into(),
            parent_id: None,
            url: None,
            children: Vec::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Append a child, setting its parent id to this frame.
    pub fn with_child(mut self, mut child: FrameTreeNode) -> Self {
        child.parent_id = Some(self.frame_id.clone());
        self.children.push(child);
        self
    }

    /// Find a frame by id anywhere in this subtree.
    pub fn find(&self, frame_id: &FrameId) -> Option<&FrameTreeNode> {
        if &self.frame_id == frame_id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(frame_id))
    }

    /// Mutable variant of [`FrameTreeNode::find`].
    pub fn find_mut(&mut self, frame_id: &FrameId) -> Option<&mut FrameTreeNode> {
        if &self.frame_id == frame_id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(frame_id))
    }
}

/// Ordered frame list plus parent pointers, built once per capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameContext {
    pub root_id: FrameId,
    /// Depth-first pre-order, root first.
    pub frames: Vec<FrameId>,
    /// `None` for the root, the immediate parent otherwise.
    pub parent_by_frame: HashMap<FrameId, Option<FrameId>>,
}

impl FrameContext {
    pub fn parent_of(&self, frame_id: &FrameId) -> Option<&FrameId> {
        self.parent_by_frame.get(frame_id).and_then(|p| p.as_ref())
    }

    pub fn is_root(&self, frame_id: &FrameId) -> bool {
        &self.root_id == frame_id
    }

    pub fn contains(&self, frame_id: &FrameId) -> bool {
        self.parent_by_frame.contains_key(frame_id)
    }

    /// Position of a frame in traversal order.
    pub fn position(&self, frame_id: &FrameId) -> Option<usize> {
        self.frames.iter().position(|f| f == frame_id)
    }
}
