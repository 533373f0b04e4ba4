//! Mock page, session and collaborators shared by the capture tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use framesnap_protocols::{
    BackendNodeId, CollaboratorError, CompositeKey, DomIndexer, DomMaps, DomMapsRequest,
    FocusResolver, FocusTarget, FrameId, FrameOutline, FrameTreeNode, OutlineProvider,
    OutlineRequest, Page, Session, SessionDomIndex, SessionError, SessionKey,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

pub(crate) fn be(id: i64) -> BackendNodeId {
    BackendNodeId(id)
}

pub(crate) fn fid(id: &str) -> FrameId {
    FrameId::new(id)
}

// ============================================================================
// Session
// ============================================================================

pub(crate) struct MockSession {
    id: Option<String>,
    owners: HashMap<String, i64>,
    failing_owners: HashSet<String>,
    owner_lookups: Mutex<Vec<String>>,
}

impl MockSession {
    pub(crate) fn new(id: Option<&str>) -> Self {
        Self {
            id: id.map(|s| s.to_string()),
            owners: HashMap::new(),
            failing_owners: HashSet::new(),
            owner_lookups: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_owner(mut self, frame: &str, backend_node_id: i64) -> Self {
        self.owners.insert(frame.to_string(), backend_node_id);
        self
    }

    pub(crate) fn with_failing_owner(mut self, frame: &str) -> Self {
        self.failing_owners.insert(frame.to_string());
        self
    }

    pub(crate) fn owner_lookups(&self) -> Vec<String> {
        self.owner_lookups.lock().clone()
    }
}

#[async_trait]
impl Session for MockSession {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    async fn send(&self, method: &str, params: Option<Value>) -> Result<Value, SessionError> {
        match method {
            "DOM.getFrameOwner" => {
                let frame = params
                    .as_ref()
                    .and_then(|p| p["frameId"].as_str())
                    .unwrap_or_default()
                    .to_string();
                self.owner_lookups.lock().push(frame.clone());
                if self.failing_owners.contains(&frame) {
                    return Err(SessionError::Protocol {
                        code: -32000,
                        message: "Frame with the given id was not found.".to_string(),
                    });
                }
                match self.owners.get(&frame) {
                    Some(backend) => Ok(json!({ "backendNodeId": backend, "nodeId": 0 })),
                    None => Err(SessionError::Protocol {
                        code: -32000,
                        message: format!("No owner for frame {}", frame),
                    }),
                }
            }
            other => Err(SessionError::Protocol {
                code: -32601,
                message: format!("'{}' wasn't found", other),
            }),
        }
    }
}

// ============================================================================
// Page
// ============================================================================

pub(crate) struct MockPage {
    main: FrameId,
    tree: FrameTreeNode,
    detached: Vec<FrameId>,
    sessions: HashMap<FrameId, Arc<MockSession>>,
    ordinals: HashMap<FrameId, u32>,
    pub(crate) tree_calls: AtomicUsize,
    pub(crate) list_calls: AtomicUsize,
}

impl MockPage {
    /// Page over `tree`; ordinals follow depth-first order unless overridden.
    pub(crate) fn new(tree: FrameTreeNode) -> Self {
        let mut ordinals = HashMap::new();
        let mut stack = vec![&tree];
        while let Some(node) = stack.pop() {
            let next = ordinals.len() as u32;
            ordinals.entry(node.frame_id.clone()).or_insert(next);
            stack.extend(node.children.iter().rev());
        }
        Self {
            main: tree.frame_id.clone(),
            tree,
            detached: Vec::new(),
            sessions: HashMap::new(),
            ordinals,
            tree_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_session(mut self, frame: &str, session: Arc<MockSession>) -> Self {
        self.sessions.insert(fid(frame), session);
        self
    }

    pub(crate) fn with_ordinal(mut self, frame: &str, ordinal: u32) -> Self {
        self.ordinals.insert(fid(frame), ordinal);
        self
    }

    pub(crate) fn with_main(mut self, frame: &str) -> Self {
        self.main = fid(frame);
        self
    }

    pub(crate) fn with_detached(mut self, frame: &str) -> Self {
        self.detached.push(fid(frame));
        self
    }

    pub(crate) fn tree_calls(&self) -> usize {
        self.tree_calls.load(Ordering::SeqCst)
    }
}

impl Page for MockPage {
    fn main_frame_id(&self) -> FrameId {
        self.main.clone()
    }

    fn frame_tree(&self) -> FrameTreeNode {
        self.tree_calls.fetch_add(1, Ordering::SeqCst);
        self.tree.clone()
    }

    fn list_all_frame_ids(&self) -> Vec<FrameId> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut ids: Vec<FrameId> = self.ordinals.keys().cloned().collect();
        ids.extend(self.detached.iter().cloned());
        ids
    }

    fn session_for_frame(&self, frame_id: &FrameId) -> Result<Arc<dyn Session>, SessionError> {
        self.sessions
            .get(frame_id)
            .cloned()
            .map(|s| s as Arc<dyn Session>)
            .ok_or_else(|| SessionError::FrameNotAttached(frame_id.to_string()))
    }

    fn ordinal(&self, frame_id: &FrameId) -> u32 {
        self.ordinals.get(frame_id).copied().unwrap_or(u32::MAX)
    }
}

// ============================================================================
// Session DOM index fixtures
// ============================================================================

/// Fluent builder for [`SessionDomIndex`] fixtures.
pub(crate) struct IndexBuilder {
    idx: SessionDomIndex,
}

impl IndexBuilder {
    pub(crate) fn new(root: i64) -> Self {
        let mut idx = SessionDomIndex {
            root_backend: be(root),
            ..Default::default()
        };
        idx.abs_by_be.insert(be(root), "/".to_string());
        Self { idx }
    }

    /// Element `id` at session-absolute `path` inside document `doc`.
    pub(crate) fn element(mut self, doc: i64, id: i64, path: &str) -> Self {
        let last = path.rsplit('/').next().unwrap_or_default();
        let tag = last.split('[').next().unwrap_or_default();
        self.idx.abs_by_be.insert(be(id), path.to_string());
        self.idx.tag_by_be.insert(be(id), tag.to_string());
        self.idx.doc_root_of.insert(be(id), be(doc));
        self
    }

    /// Same-session content document `doc` hosted by `iframe`.
    pub(crate) fn content_document(mut self, iframe: i64, doc: i64) -> Self {
        let host = self.idx.abs_by_be.get(&be(iframe)).cloned().unwrap_or_default();
        self.idx.abs_by_be.insert(be(doc), host);
        self.idx.content_doc_root_by_iframe.insert(be(iframe), be(doc));
        self
    }

    pub(crate) fn scrollable(mut self, id: i64) -> Self {
        self.idx.scroll_by_be.insert(be(id), true);
        self
    }

    pub(crate) fn build(self) -> SessionDomIndex {
        self.idx
    }
}

/// Top document 1 (html 2, body 3, iframe 4) with same-session content
/// document 10 (html 11, body 12, div 13).
pub(crate) fn root_with_iframe_index() -> SessionDomIndex {
    IndexBuilder::new(1)
        .element(1, 2, "/html[1]")
        .element(1, 3, "/html[1]/body[1]")
        .element(1, 4, "/html[1]/body[1]/iframe[1]")
        .content_document(4, 10)
        .element(10, 11, "/html[1]/body[1]/iframe[1]/html[1]")
        .element(10, 12, "/html[1]/body[1]/iframe[1]/html[1]/body[1]")
        .element(10, 13, "/html[1]/body[1]/iframe[1]/html[1]/body[1]/div[1]")
        .scrollable(13)
        .build()
}

/// Single document 1 with html 2, body 3 and a button 100.
pub(crate) fn simple_document_index() -> SessionDomIndex {
    IndexBuilder::new(1)
        .element(1, 2, "/html[1]")
        .element(1, 3, "/html[1]/body[1]")
        .element(1, 100, "/html[1]/body[1]/button[1]")
        .build()
}

// ============================================================================
// DOM indexer
// ============================================================================

#[derive(Default)]
pub(crate) struct MockDomIndexer {
    indexes: HashMap<SessionKey, SessionDomIndex>,
    failing: HashSet<SessionKey>,
    scoped_roots: HashMap<FrameId, BackendNodeId>,
    delay: Option<Duration>,
    build_calls: AtomicUsize,
    maps_calls: AtomicUsize,
    built_keys: Mutex<Vec<SessionKey>>,
}

impl MockDomIndexer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_index(mut self, session: Option<&str>, index: SessionDomIndex) -> Self {
        self.indexes.insert(SessionKey::from_session_id(session), index);
        self
    }

    pub(crate) fn with_failing(mut self, session: Option<&str>) -> Self {
        self.failing.insert(SessionKey::from_session_id(session));
        self
    }

    pub(crate) fn with_scoped_root(mut self, frame: &str, doc_root: i64) -> Self {
        self.scoped_roots.insert(fid(frame), be(doc_root));
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn build_calls(&self) -> usize {
        self.build_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn maps_calls(&self) -> usize {
        self.maps_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn built_keys(&self) -> Vec<SessionKey> {
        self.built_keys.lock().clone()
    }
}

#[async_trait]
impl DomIndexer for MockDomIndexer {
    async fn build_session_dom_index(
        &self,
        session: &dyn Session,
        _experimental: bool,
    ) -> Result<SessionDomIndex, CollaboratorError> {
        self.build_calls.fetch_add(1, Ordering::SeqCst);
        let key = session.key();
        self.built_keys.lock().push(key.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(&key) {
            return Err(CollaboratorError::Script(format!("DOM walk failed for {}", key)));
        }
        self.indexes
            .get(&key)
            .cloned()
            .ok_or_else(|| CollaboratorError::NodeNotFound(format!("no document for {}", key)))
    }

    async fn dom_maps_for_session(
        &self,
        session: &dyn Session,
        request: &DomMapsRequest,
    ) -> Result<DomMaps, CollaboratorError> {
        self.maps_calls.fetch_add(1, Ordering::SeqCst);
        let key = session.key();
        let index = self
            .indexes
            .get(&key)
            .ok_or_else(|| CollaboratorError::NodeNotFound(format!("no document for {}", key)))?;
        let root = self
            .scoped_roots
            .get(&request.frame_id)
            .copied()
            .unwrap_or(index.root_backend);
        Ok(index.project_document(root, request.ordinal))
    }
}

// ============================================================================
// Outline provider
// ============================================================================

#[derive(Default)]
pub(crate) struct MockOutlineProvider {
    outlines: HashMap<FrameId, String>,
    urls: HashMap<FrameId, Vec<(i64, String)>>,
    failing: HashSet<FrameId>,
    calls: Mutex<Vec<(FrameId, Option<String>)>>,
}

impl MockOutlineProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fixed outline text for a frame instead of one generated from its maps.
    pub(crate) fn with_outline(mut self, frame: &str, outline: &str) -> Self {
        self.outlines.insert(fid(frame), outline.to_string());
        self
    }

    pub(crate) fn with_url(mut self, frame: &str, backend_node_id: i64, url: &str) -> Self {
        self.urls
            .entry(fid(frame))
            .or_default()
            .push((backend_node_id, url.to_string()));
        self
    }

    pub(crate) fn with_failing(mut self, frame: &str) -> Self {
        self.failing.insert(fid(frame));
        self
    }

    pub(crate) fn calls(&self) -> Vec<(FrameId, Option<String>)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl OutlineProvider for MockOutlineProvider {
    async fn outline_for_frame(
        &self,
        _session: &dyn Session,
        request: &OutlineRequest<'_>,
    ) -> Result<FrameOutline, CollaboratorError> {
        self.calls.lock().push((
            request.frame_id.clone(),
            request.focus_xpath.map(|s| s.to_string()),
        ));
        if self.failing.contains(request.frame_id) {
            return Err(SessionError::Cancelled("Accessibility.getFullAXTree".to_string()).into());
        }

        let xpaths = request.xpath_map.cloned().unwrap_or_default();
        let tags = request.tag_name_map.cloned().unwrap_or_default();
        let focus = request.focus_xpath.filter(|f| *f != "/");

        let scope_applied = match focus {
            Some(f) => xpaths.values().any(|x| x == f),
            None => request.focus_xpath.is_some(),
        };

        let outline = match self.outlines.get(request.frame_id) {
            Some(text) => text.clone(),
            None => xpaths
                .iter()
                .filter(|(_, x)| focus.is_none_or(|f| x.starts_with(f)))
                .map(|(key, x)| {
                    let depth = x.matches('/').count().saturating_sub(1);
                    let tag = tags.get(key).map(String::as_str).unwrap_or("generic");
                    format!("{}[{}] {}", "  ".repeat(depth), key, tag)
                })
                .collect::<Vec<_>>()
                .join("\n"),
        };

        let url_map = self
            .urls
            .get(request.frame_id)
            .map(|urls| {
                urls.iter()
                    .map(|(id, url)| (CompositeKey::new(request.ordinal, *id), url.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(FrameOutline {
            outline,
            url_map,
            scope_applied,
        })
    }
}

// ============================================================================
// Focus resolver
// ============================================================================

#[derive(Default)]
pub(crate) struct MockFocusResolver {
    target: Option<FocusTarget>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockFocusResolver {
    pub(crate) fn resolving(frame: &str, tail: Option<&str>, prefix: Option<&str>) -> Self {
        Self {
            target: Some(FocusTarget {
                target_frame_id: fid(frame),
                tail_xpath: tail.map(|s| s.to_string()),
                abs_prefix: prefix.map(|s| s.to_string()),
            }),
            ..Default::default()
        }
    }

    pub(crate) fn unresolved() -> Self {
        Self::default()
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FocusResolver for MockFocusResolver {
    async fn resolve(
        &self,
        _page: &dyn Page,
        selector: &str,
    ) -> Result<Option<FocusTarget>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CollaboratorError::InvalidSelector(selector.to_string()));
        }
        Ok(self.target.clone())
    }
}
