//! DOM addressing data: per-session indexes and per-frame maps.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::ids::{BackendNodeId, CompositeKey};

pub type XPathMap = BTreeMap<CompositeKey, String>;
pub type TagNameMap = BTreeMap<CompositeKey, String>;
pub type ScrollableMap = BTreeMap<CompositeKey, bool>;
pub type UrlMap = BTreeMap<CompositeKey, String>;

/// Result of one full-document walk of a single debugging session.
///
/// Paths in `abs_by_be` are absolute within the session's own document tree,
/// which may contain several same-session documents (same-process iframes).
/// Document roots carry the path of their host iframe (`/` for the session's
/// top document) so frame-relative paths can be derived from them.
#[derive(Debug, Clone, Default)]
pub struct SessionDomIndex {
    pub root_backend: BackendNodeId,
    pub abs_by_be: HashMap<BackendNodeId, String>,
    pub tag_by_be: HashMap<BackendNodeId, String>,
    pub scroll_by_be: HashMap<BackendNodeId, bool>,
    /// Element -> document root that contains it.
    pub doc_root_of: HashMap<BackendNodeId, BackendNodeId>,
    /// Same-session iframe element -> its content document root.
    pub content_doc_root_by_iframe: HashMap<BackendNodeId, BackendNodeId>,
}

impl SessionDomIndex {
    /// Document root for a frame hosted by `iframe` (or the session's top
    /// document when the host is unknown or lives in another session).
    pub fn document_root_for(&self, iframe: Option<BackendNodeId>) -> BackendNodeId {
        iframe
            .and_then(|be| self.content_doc_root_by_iframe.get(&be).copied())
            .unwrap_or(self.root_backend)
    }

    /// Project the session-wide maps down to one document, keyed by
    /// `"{ordinal}-{backendNodeId}"` with paths relative to that document.
    pub fn project_document(&self, doc_root: BackendNodeId, ordinal: u32) -> DomMaps {
        let prefix = self
            .abs_by_be
            .get(&doc_root)
            .map(String::as_str)
            .unwrap_or("/");

        let mut maps = DomMaps::default();
        for (be, root) in &self.doc_root_of {
            if *root != doc_root {
                continue;
            }
            let key = CompositeKey::new(ordinal, *be);
            if let Some(abs) = self.abs_by_be.get(be) {
                maps.xpath_map.insert(key, relative_xpath(abs, prefix));
            }
            if let Some(tag) = self.tag_by_be.get(be) {
                maps.tag_name_map.insert(key, tag.clone());
            }
            if let Some(scrollable) = self.scroll_by_be.get(be) {
                maps.scrollable_map.insert(key, *scrollable);
            }
        }
        maps
    }

    /// Number of indexed nodes, documents excluded.
    pub fn node_count(&self) -> usize {
        self.doc_root_of.len()
    }
}

/// Strip the path of a containing document from a session-absolute path.
///
/// The result always starts with `/`. Paths outside `doc_prefix` are
/// returned unchanged (normalized).
pub fn relative_xpath(abs: &str, doc_prefix: &str) -> String {
    let prefix = doc_prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return normalize_xpath(abs);
    }
    match abs.strip_prefix(prefix) {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => normalize_xpath(abs),
    }
}

/// Join an absolute frame prefix and a frame-relative path.
pub fn join_xpath(prefix: &str, relative: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return normalize_xpath(relative);
    }
    if relative.is_empty() || relative == "/" {
        return prefix.to_string();
    }
    format!("{}{}", prefix, normalize_xpath(relative))
}

fn normalize_xpath(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// DOM maps for a single document, already keyed by composite key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomMaps {
    pub xpath_map: XPathMap,
    pub tag_name_map: TagNameMap,
    pub scrollable_map: ScrollableMap,
}

/// All maps produced for one successfully processed frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerFrameMaps {
    pub xpath_map: XPathMap,
    pub tag_name_map: TagNameMap,
    pub scrollable_map: ScrollableMap,
    pub url_map: UrlMap,
}

impl PerFrameMaps {
    pub fn from_dom_maps(maps: DomMaps) -> Self {
        Self {
            xpath_map: maps.xpath_map,
            tag_name_map: maps.tag_name_map,
            scrollable_map: maps.scrollable_map,
            url_map: UrlMap::new(),
        }
    }

    /// Total number of entries across the four maps.
    pub fn total_len(&self) -> usize {
        self.xpath_map.len()
            + self.tag_name_map.len()
            + self.scrollable_map.len()
            + self.url_map.len()
    }
}

#[cfg(test)]
#[path = "dom_tests.rs"]
mod tests;
