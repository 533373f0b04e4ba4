//! A CDP page whose frames may live in several flattened sessions.

use std::collections::HashMap;
use std::sync::Arc;

use framesnap_protocols::{FrameId, FrameTreeNode, Page, Session, SessionError};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cdp::{CdpClient, CdpError, CdpSession, FrameTree, PageInfo, TargetInfo};

/// Page handle built from one page target plus its out-of-process iframes.
///
/// The frame tree is a snapshot taken at attach time; each out-of-process
/// iframe target contributes the subtree it owns.
pub struct CdpPage {
    main_frame: FrameId,
    tree: FrameTreeNode,
    sessions: HashMap<FrameId, Arc<CdpSession>>,
    ordinals: Mutex<HashMap<FrameId, u32>>,
}

impl CdpPage {
    /// Attach to a page target and the iframe targets that belong to it.
    ///
    /// `target` picks the page by target id or URL substring; the first page
    /// is used otherwise. Iframe targets whose frames do not join the page's
    /// frame tree are detached again.
    pub async fn attach(client: &CdpClient, target: Option<&str>) -> Result<Self, CdpError> {
        let pages = client.list_pages().await?;
        let page = select_page(&pages, target)
            .ok_or_else(|| CdpError::PageNotFound(target.unwrap_or("<any>").to_string()))?;
        info!("Attaching to page {} ({})", page.id, page.url);

        let main_session = Arc::new(client.attach(&page.id).await?);
        let mut tree = parse_frame_tree(fetch_frame_tree(&main_session).await?);

        let targets = client.get_targets().await?;
        let mut subtrees = Vec::new();
        for iframe in page_iframes(&targets, &page.id) {
            let session = match client.attach(&iframe.target_id).await {
                Ok(s) => Arc::new(s),
                Err(e) => {
                    warn!("Failed to attach iframe target {}: {}", iframe.target_id, e);
                    continue;
                }
            };
            match fetch_frame_tree(&session).await {
                Ok(raw) => subtrees.push((parse_frame_tree(raw), session)),
                Err(e) => {
                    warn!("Failed to read frame tree of {}: {}", iframe.target_id, e);
                    detach_quietly(client, &session).await;
                }
            }
        }

        let (placed, unplaced) = graft_all(&mut tree, subtrees);
        for (_, session) in &unplaced {
            detach_quietly(client, session).await;
        }
        let owners: HashMap<FrameId, Arc<CdpSession>> = placed
            .into_iter()
            .map(|(subtree, session)| (subtree.frame_id, session))
            .collect();
        let mut sessions = HashMap::new();
        assign_sessions(&tree, &main_session, &owners, &mut sessions);

        let ordinals = assign_ordinals(&tree);
        debug!(
            frames = ordinals.len(),
            sessions = sessions.len(),
            "Page frame tree assembled"
        );

        Ok(Self {
            main_frame: tree.frame_id.clone(),
            tree,
            sessions,
            ordinals: Mutex::new(ordinals),
        })
    }

    /// Session attached to the page target itself.
    pub fn main_session(&self) -> Option<Arc<CdpSession>> {
        self.sessions.get(&self.main_frame).cloned()
    }
}

impl Page for CdpPage {
    fn main_frame_id(&self) -> FrameId {
        self.main_frame.clone()
    }

    fn frame_tree(&self) -> FrameTreeNode {
        self.tree.clone()
    }

    fn list_all_frame_ids(&self) -> Vec<FrameId> {
        let mut ids = Vec::new();
        collect_ids(&self.tree, &mut ids);
        ids
    }

    fn session_for_frame(&self, frame_id: &FrameId) -> Result<Arc<dyn Session>, SessionError> {
        self.sessions
            .get(frame_id)
            .map(|s| s.clone() as Arc<dyn Session>)
            .ok_or_else(|| SessionError::FrameNotAttached(frame_id.to_string()))
    }

    fn ordinal(&self, frame_id: &FrameId) -> u32 {
        let mut ordinals = self.ordinals.lock();
        if let Some(ordinal) = ordinals.get(frame_id) {
            return *ordinal;
        }
        let next = ordinals.values().max().map_or(0, |m| m + 1);
        ordinals.insert(frame_id.clone(), next);
        next
    }
}

async fn fetch_frame_tree(session: &CdpSession) -> Result<FrameTree, CdpError> {
    let result = session.call("Page.getFrameTree", None).await?;
    Ok(serde_json::from_value(result["frameTree"].clone())?)
}

async fn detach_quietly(client: &CdpClient, session: &CdpSession) {
    if let Err(e) = client.detach(session).await {
        debug!(target_id = session.target_id(), error = %e, "Failed to detach iframe target");
    }
}

/// Iframe targets that may belong to the page `page_id`.
///
/// Targets from another browser context are skipped; within the page's own
/// context ownership is only known once their frame trees are grafted.
pub(crate) fn page_iframes<'a>(targets: &'a [TargetInfo], page_id: &str) -> Vec<&'a TargetInfo> {
    let context = targets
        .iter()
        .find(|t| t.target_id == page_id)
        .and_then(|t| t.browser_context_id.as_deref());
    targets
        .iter()
        .filter(|t| t.is_iframe())
        .filter(|t| match (context, t.browser_context_id.as_deref()) {
            (Some(page_context), Some(iframe_context)) => page_context == iframe_context,
            _ => true,
        })
        .collect()
}

fn select_page<'a>(pages: &'a [PageInfo], target: Option<&str>) -> Option<&'a PageInfo> {
    match target {
        Some(t) => pages
            .iter()
            .find(|p| p.id == t)
            .or_else(|| pages.iter().find(|p| p.url.contains(t))),
        None => pages.first(),
    }
}

/// Convert a protocol frame tree to the page model.
pub(crate) fn parse_frame_tree(raw: FrameTree) -> FrameTreeNode {
    let mut node = FrameTreeNode::new(raw.frame.id);
    node.parent_id = raw.frame.parent_id.map(FrameId::from);
    node.url = raw.frame.url;
    node.children = raw
        .child_frames
        .unwrap_or_default()
        .into_iter()
        .map(parse_frame_tree)
        .collect();
    node
}

/// Place an out-of-process subtree into the page tree.
///
/// A subtree whose root is already known replaces that node's children;
/// otherwise it is added under its parent. Returns false when neither frame
/// is in the tree yet.
pub(crate) fn graft(tree: &mut FrameTreeNode, subtree: &FrameTreeNode) -> bool {
    if let Some(existing) = tree.find_mut(&subtree.frame_id) {
        existing.children = subtree.children.clone();
        if existing.url.is_none() {
            existing.url = subtree.url.clone();
        }
        return true;
    }
    let Some(parent_id) = subtree.parent_id.as_ref() else {
        return false;
    };
    match tree.find_mut(parent_id) {
        Some(parent) => {
            parent.children.push(subtree.clone());
            true
        }
        None => false,
    }
}

/// Graft subtrees until no more can be placed. Nested out-of-process
/// iframes may arrive before their parent, hence the repeated passes.
/// Returns the placed subtrees and those that belong to no frame of the tree.
pub(crate) fn graft_all<S>(
    tree: &mut FrameTreeNode,
    mut pending: Vec<(FrameTreeNode, S)>,
) -> (Vec<(FrameTreeNode, S)>, Vec<(FrameTreeNode, S)>) {
    let mut placed = Vec::new();
    loop {
        let before = pending.len();
        let mut rest = Vec::new();
        for (subtree, extra) in pending {
            if graft(tree, &subtree) {
                placed.push((subtree, extra));
            } else {
                rest.push((subtree, extra));
            }
        }
        pending = rest;
        if pending.is_empty() || pending.len() == before {
            break;
        }
    }
    for (subtree, _) in &pending {
        debug!(frame_id = %subtree.frame_id, "Iframe target not part of this page");
    }
    (placed, pending)
}

/// Map every frame to the session of its closest owning target.
///
/// `owners` holds the roots of out-of-process subtrees; every other frame
/// inherits its parent's session.
pub(crate) fn assign_sessions<S: Clone>(
    node: &FrameTreeNode,
    inherited: &S,
    owners: &HashMap<FrameId, S>,
    out: &mut HashMap<FrameId, S>,
) {
    let session = owners.get(&node.frame_id).unwrap_or(inherited);
    out.insert(node.frame_id.clone(), session.clone());
    for child in &node.children {
        assign_sessions(child, session, owners, out);
    }
}

/// Pre-order ordinals, root 0.
pub(crate) fn assign_ordinals(tree: &FrameTreeNode) -> HashMap<FrameId, u32> {
    let mut ids = Vec::new();
    collect_ids(tree, &mut ids);
    let mut ordinals = HashMap::new();
    for id in ids {
        let next = ordinals.len() as u32;
        ordinals.entry(id).or_insert(next);
    }
    ordinals
}

fn collect_ids(node: &FrameTreeNode, out: &mut Vec<FrameId>) {
    out.push(node.frame_id.clone());
    for child in &node.children {
        collect_ids(child, out);
    }
}

#[cfg(test)]
#[path = "page_tests.rs"]
mod tests;
