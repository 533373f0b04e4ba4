//! Session DOM index built from one `DOM.getDocument` walk.

use std::collections::HashMap;

use async_trait::async_trait;
use framesnap_protocols::{
    BackendNodeId, CollaboratorError, DomIndexer, DomMaps, DomMapsRequest, FrameId, Session,
    SessionDomIndex,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::cdp::{DomNode, DOCUMENT_FRAGMENT_NODE, DOCUMENT_NODE, ELEMENT_NODE, TEXT_NODE};
use crate::js::{evaluate_value, SCROLLABLE_XPATHS_SCRIPT};

/// [`DomIndexer`] backed by CDP.
#[derive(Debug, Default, Clone)]
pub struct CdpDomIndexer;

impl CdpDomIndexer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DomIndexer for CdpDomIndexer {
    async fn build_session_dom_index(
        &self,
        session: &dyn Session,
        experimental: bool,
    ) -> Result<SessionDomIndex, CollaboratorError> {
        let result = session
            .send("DOM.getDocument", Some(json!({ "depth": -1, "pierce": true })))
            .await?;
        let root: DomNode = serde_json::from_value(result["root"].clone())?;
        let mut index = index_document(&root, experimental);

        // scrollability is best effort; a page without script access still indexes
        match evaluate_value(session, SCROLLABLE_XPATHS_SCRIPT, None).await {
            Ok(value) => {
                let marked = mark_scrollable(&mut index, &xpath_list(&value));
                debug!(scrollable = marked, "Marked scrollable elements");
            }
            Err(e) => debug!(error = %e, "Scrollable element scan failed"),
        }

        debug!(
            root = %index.root_backend,
            nodes = index.node_count(),
            experimental,
            "Indexed session document"
        );
        Ok(index)
    }

    async fn dom_maps_for_session(
        &self,
        session: &dyn Session,
        request: &DomMapsRequest,
    ) -> Result<DomMaps, CollaboratorError> {
        let index = self
            .build_session_dom_index(session, request.experimental)
            .await?;
        let owner = host_iframe(session, &request.frame_id).await;
        let doc_root = index.document_root_for(owner);
        Ok(index.project_document(doc_root, request.ordinal))
    }
}

/// The frame's host iframe, when it lives in this session's document.
///
/// `None` sends the projection to the session's top document.
pub(crate) async fn host_iframe(
    session: &dyn Session,
    frame_id: &FrameId,
) -> Option<BackendNodeId> {
    match session
        .send(
            "DOM.getFrameOwner",
            Some(json!({ "frameId": frame_id.as_str() })),
        )
        .await
    {
        Ok(result) => {
            let owner = result["backendNodeId"].as_i64().map(BackendNodeId);
            if owner.is_none() {
                debug!(frame_id = %frame_id, "Frame owner reply has no backend id");
            }
            owner
        }
        Err(e) => {
            debug!(
                frame_id = %frame_id,
                error = %e,
                "Frame owner lookup failed, using top document"
            );
            None
        }
    }
}

fn xpath_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// Build the session index from a pierced document tree.
///
/// Element steps are `tag[n]`, text steps `text()[n]`, both counted among
/// same-kind siblings. Same-process iframe documents inherit their host
/// iframe's path. Shadow-root content is only walked when `experimental`
/// and is joined to its host with `//`.
pub fn index_document(root: &DomNode, experimental: bool) -> SessionDomIndex {
    let root_backend = BackendNodeId(root.backend_node_id);
    let mut index = SessionDomIndex {
        root_backend,
        ..Default::default()
    };
    index.abs_by_be.insert(root_backend, "/".to_string());

    let mut walker = Walker {
        index: &mut index,
        experimental,
    };
    if root.node_type == DOCUMENT_NODE {
        walker.children(root.children(), "", root_backend);
    } else {
        // a bare element root indexes as the only child of an implicit document
        walker.children(std::slice::from_ref(root), "", root_backend);
    }
    index
}

struct Walker<'a> {
    index: &'a mut SessionDomIndex,
    experimental: bool,
}

impl Walker<'_> {
    fn children(&mut self, nodes: &[DomNode], prefix: &str, doc_root: BackendNodeId) {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for node in nodes {
            let step_name = match node.node_type {
                ELEMENT_NODE => node.tag_name(),
                TEXT_NODE => "text()".to_string(),
                _ => continue,
            };
            let n = counts.entry(step_name.clone()).or_insert(0);
            *n += 1;
            let path = format!("{}/{}[{}]", prefix, step_name, n);
            self.node(node, path, doc_root);
        }
    }

    fn node(&mut self, node: &DomNode, path: String, doc_root: BackendNodeId) {
        let be = BackendNodeId(node.backend_node_id);
        let tag = if node.node_type == TEXT_NODE {
            "#text".to_string()
        } else {
            node.tag_name()
        };
        self.index.tag_by_be.insert(be, tag);
        self.index.doc_root_of.insert(be, doc_root);
        self.index.abs_by_be.insert(be, path.clone());

        if node.node_type != ELEMENT_NODE {
            return;
        }

        if let Some(content) = node.content_document.as_deref() {
            let content_root = BackendNodeId(content.backend_node_id);
            self.index.abs_by_be.insert(content_root, path.clone());
            self.index.content_doc_root_by_iframe.insert(be, content_root);
            self.children(content.children(), &path, content_root);
        }

        if self.experimental {
            for shadow in node.shadow_roots.iter().flatten() {
                if shadow.node_type == DOCUMENT_FRAGMENT_NODE {
                    self.children(shadow.children(), &format!("{}/", path), doc_root);
                }
            }
        }

        self.children(node.children(), &path, doc_root);
    }
}

/// Mark the elements at `xpaths` scrollable. Returns how many matched.
pub fn mark_scrollable(index: &mut SessionDomIndex, xpaths: &[String]) -> usize {
    let by_path: HashMap<&str, BackendNodeId> = index
        .doc_root_of
        .keys()
        .filter_map(|be| index.abs_by_be.get(be).map(|p| (p.as_str(), *be)))
        .collect();

    let found: Vec<BackendNodeId> = xpaths
        .iter()
        .filter_map(|xpath| by_path.get(xpath.as_str()).copied())
        .collect();
    for be in &found {
        index.scroll_by_be.insert(*be, true);
    }
    found.len()
}

#[cfg(test)]
#[path = "dom_index_tests.rs"]
mod tests;
