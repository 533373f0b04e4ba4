//! Frame context: ordered frame list and parent pointers.

use std::collections::HashMap;

use framesnap_protocols::{CaptureError, FrameContext, FrameTreeNode, Page};
use tracing::debug;

/// Build the frame context for one capture.
///
/// Frames are listed depth-first in pre-order starting at the main frame,
/// children in protocol order. A frame id seen twice keeps its first position.
/// Frames the page lists but that are unreachable from the tree (detached
/// during navigation) are left out.
pub fn build_frame_context(page: &dyn Page) -> Result<FrameContext, CaptureError> {
    let main = page.main_frame_id();
    let tree = page.frame_tree();
    let root = tree.find(&main).ok_or_else(|| {
        CaptureError::InvalidPage(format!("main frame {} is not in the frame tree", main))
    })?;

    let mut frames = Vec::new();
    let mut parent_by_frame = HashMap::new();
    let mut stack: Vec<(&FrameTreeNode, Option<&FrameTreeNode>)> = vec![(root, None)];

    while let Some((node, parent)) = stack.pop() {
        if parent_by_frame.contains_key(&node.frame_id) {
            debug!(frame = %node.frame_id, "Duplicate frame in tree, keeping first occurrence");
            continue;
        }
        parent_by_frame.insert(node.frame_id.clone(), parent.map(|p| p.frame_id.clone()));
        frames.push(node.frame_id.clone());
        for child in node.children.iter().rev() {
            stack.push((child, Some(node)));
        }
    }

    let detached: Vec<_> = page
        .list_all_frame_ids()
        .into_iter()
        .filter(|id| !parent_by_frame.contains_key(id))
        .collect();
    if !detached.is_empty() {
        debug!(count = detached.len(), frames = ?detached, "Skipping frames unreachable from the frame tree");
    }

    Ok(FrameContext {
        root_id: main,
        frames,
        parent_by_frame,
    })
}

#[cfg(test)]
#[path = "frame_context_tests.rs"]
mod tests;
