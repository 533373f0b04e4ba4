//! Accessibility outline rendering from `Accessibility.getFullAXTree`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use framesnap_protocols::{
    BackendNodeId, CollaboratorError, CompositeKey, FrameOutline, OutlineProvider,
    OutlineRequest, Session, UrlMap,
};
use serde_json::json;
use tracing::debug;

use crate::cdp::AXNode;
use crate::js::describe_xpath_node;

/// [`OutlineProvider`] backed by the CDP accessibility domain.
#[derive(Debug, Default, Clone)]
pub struct CdpOutlineProvider;

impl CdpOutlineProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OutlineProvider for CdpOutlineProvider {
    async fn outline_for_frame(
        &self,
        session: &dyn Session,
        request: &OutlineRequest<'_>,
    ) -> Result<FrameOutline, CollaboratorError> {
        let result = session
            .send(
                "Accessibility.getFullAXTree",
                Some(json!({ "frameId": request.frame_id.as_str() })),
            )
            .await?;
        let nodes: Vec<AXNode> = serde_json::from_value(result["nodes"].clone())?;

        let mut scope = Scope::of(request);
        if scope == Scope::Unresolved {
            if let Some(backend) = live_focus(session, request).await {
                scope = Scope::Node(backend);
            }
        }

        let outline = render_scoped(&nodes, request, scope);
        debug!(
            frame_id = %request.frame_id,
            ax_nodes = nodes.len(),
            urls = outline.url_map.len(),
            scope_applied = outline.scope_applied,
            "Rendered frame outline"
        );
        Ok(outline)
    }
}

/// Resolve the focus path in the page itself. Predicates, descendant steps
/// and other forms the xpath map cannot answer end up here.
async fn live_focus(
    session: &dyn Session,
    request: &OutlineRequest<'_>,
) -> Option<BackendNodeId> {
    let focus = request.focus_xpath?;
    match describe_xpath_node(session, request.frame_id, focus).await {
        Ok(node) => {
            let backend = node
                .as_ref()
                .and_then(|n| n["backendNodeId"].as_i64())
                .map(BackendNodeId);
            if backend.is_none() {
                debug!(frame_id = %request.frame_id, focus, "Focus xpath matched nothing");
            }
            backend
        }
        Err(e) => {
            debug!(
                frame_id = %request.frame_id,
                focus,
                error = %e,
                "Focus xpath lookup failed"
            );
            None
        }
    }
}

/// Part of the frame an outline covers.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scope {
    /// No focus requested.
    Unscoped,
    /// Focus on the frame's document itself.
    Document,
    Node(BackendNodeId),
    /// Focus requested but not found in the frame's maps.
    Unresolved,
}

impl Scope {
    fn of(request: &OutlineRequest<'_>) -> Self {
        match request.focus_xpath {
            None => Self::Unscoped,
            Some("/") => Self::Document,
            Some(focus) => indexed_focus(request, focus).map_or(Self::Unresolved, Self::Node),
        }
    }
}

/// Render an AX node list as an indented outline.
///
/// Each kept node becomes `[{ordinal}-{backendNodeId}] role: name`, two
/// spaces of indent per level. Ignored nodes and nodes with no DOM backing
/// are dropped and their children take their place.
///
/// A focus path is looked up in the request's xpath map, so only paths made
/// of plain `tag` or `tag[n]` steps can scope here.
pub fn render_outline(nodes: &[AXNode], request: &OutlineRequest<'_>) -> FrameOutline {
    render_scoped(nodes, request, Scope::of(request))
}

fn render_scoped(nodes: &[AXNode], request: &OutlineRequest<'_>, scope: Scope) -> FrameOutline {
    let tree = AxTree::new(nodes);
    let mut out = FrameOutline::default();

    let roots = match scope {
        Scope::Document => {
            out.scope_applied = true;
            tree.roots()
        }
        Scope::Node(backend) => match tree.by_backend(backend) {
            Some(node) => {
                out.scope_applied = true;
                vec![node]
            }
            None => tree.roots(),
        },
        Scope::Unscoped | Scope::Unresolved => tree.roots(),
    };

    let mut renderer = Renderer {
        tree: &tree,
        request,
        lines: Vec::new(),
        url_map: &mut out.url_map,
        visited: HashSet::new(),
    };
    for root in roots {
        renderer.render(root, 0);
    }
    out.outline = renderer.lines.join("\n");
    out
}

/// Backend id of the element at `focus` according to the frame's xpath map.
fn indexed_focus(request: &OutlineRequest<'_>, focus: &str) -> Option<BackendNodeId> {
    let xpath_map = request.xpath_map?;
    let find = |path: &str| {
        xpath_map
            .iter()
            .find(|(key, p)| key.ordinal == request.ordinal && p.as_str() == path)
            .map(|(key, _)| key.backend_node_id)
    };
    find(focus).or_else(|| find(&indexed_form(focus)?))
}

/// `/html/body/div[2]` as `/html[1]/body[1]/div[2]`.
///
/// An unindexed step selects the first match in document order, so the two
/// forms address the same element. `None` for paths that are not plain
/// child steps.
fn indexed_form(xpath: &str) -> Option<String> {
    let rest = xpath.strip_prefix('/')?;
    let mut out = String::new();
    for step in rest.split('/') {
        let (name, index) = match step.split_once('[') {
            Some((name, index)) => {
                let index = index.strip_suffix(']')?;
                if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                (name, index)
            }
            None => (step, "1"),
        };
        let plain = name == "text()"
            || (!name.is_empty()
                && name
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
        if !plain {
            return None;
        }
        out.push('/');
        out.push_str(&name.to_ascii_lowercase());
        out.push('[');
        out.push_str(index);
        out.push(']');
    }
    Some(out)
}

struct AxTree<'a> {
    nodes: &'a [AXNode],
    by_id: HashMap<&'a str, &'a AXNode>,
}

impl<'a> AxTree<'a> {
    fn new(nodes: &'a [AXNode]) -> Self {
        let by_id = nodes.iter().map(|n| (n.node_id.as_str(), n)).collect();
        Self { nodes, by_id }
    }

    /// Nodes no other node lists as a child, in input order.
    fn roots(&self) -> Vec<&'a AXNode> {
        let referenced: HashSet<&str> = self
            .nodes
            .iter()
            .flat_map(|n| n.child_ids.iter().flatten())
            .map(String::as_str)
            .collect();
        self.nodes
            .iter()
            .filter(|n| !referenced.contains(n.node_id.as_str()))
            .collect()
    }

    fn children(&self, node: &AXNode) -> Vec<&'a AXNode> {
        node.child_ids
            .iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id.as_str()).copied())
            .collect()
    }

    fn by_backend(&self, backend: BackendNodeId) -> Option<&'a AXNode> {
        self.nodes
            .iter()
            .find(|n| !n.ignored && n.backend_dom_node_id == Some(backend.0))
    }
}

struct Renderer<'t, 'a, 'r> {
    tree: &'t AxTree<'a>,
    request: &'r OutlineRequest<'r>,
    lines: Vec<String>,
    url_map: &'r mut UrlMap,
    visited: HashSet<&'a str>,
}

impl<'a> Renderer<'_, 'a, '_> {
    fn render(&mut self, node: &'a AXNode, depth: usize) {
        if !self.visited.insert(node.node_id.as_str()) {
            return;
        }

        let children = self.tree.children(node);
        let backend = match node.backend_dom_node_id {
            Some(be) if !node.ignored => be,
            _ => {
                for child in children {
                    self.render(child, depth);
                }
                return;
            }
        };

        let key = CompositeKey::new(self.request.ordinal, backend);
        let name = node.name().map(normalize_whitespace).unwrap_or_default();
        let mut line = format!("{}[{}] {}", "  ".repeat(depth), key, self.role(node, &key));
        if !name.is_empty() {
            line.push_str(": ");
            line.push_str(&name);
        }
        self.lines.push(line);

        if self.request.collect_urls {
            if let Some(url) = node.property("url").map(str::trim).filter(|u| !u.is_empty()) {
                self.url_map.insert(key, url.to_string());
            }
        }

        for child in drop_redundant_text(&name, children) {
            self.render(child, depth + 1);
        }
    }

    fn role(&self, node: &AXNode, key: &CompositeKey) -> String {
        let role = node.role().unwrap_or("none");
        let role = match role {
            "generic" | "none" => self
                .request
                .tag_name_map
                .and_then(|tags| tags.get(key))
                .map(String::as_str)
                .unwrap_or(role),
            other => other,
        };
        let scrollable = self
            .request
            .scrollable_map
            .and_then(|m| m.get(key))
            .copied()
            .unwrap_or(false);
        if scrollable {
            format!("scrollable, {}", role)
        } else {
            role.to_string()
        }
    }
}

/// Drop `StaticText` children that only repeat the parent's name.
fn drop_redundant_text<'a>(parent_name: &str, children: Vec<&'a AXNode>) -> Vec<&'a AXNode> {
    if parent_name.is_empty() {
        return children;
    }
    let combined: String = children
        .iter()
        .filter(|c| c.role() == Some("StaticText"))
        .filter_map(|c| c.name())
        .map(normalize_whitespace)
        .collect();
    if combined != parent_name {
        return children;
    }
    children
        .into_iter()
        .filter(|c| c.role() != Some("StaticText"))
        .collect()
}

fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "outline_tests.rs"]
mod tests;
