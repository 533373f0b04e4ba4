//! Capture entry point: scoped fast path and full multi-frame path.

use std::sync::Arc;

use framesnap_protocols::{
    CaptureError, CollaboratorError, CombinedSnapshot, DomIndexer, DomMapsRequest, FocusResolver,
    FrameSummary, OutlineProvider, OutlineRequest, Page, PerFrameOutline, ScopeInfo,
};
use tracing::{debug, info};

use crate::frame_context::build_frame_context;
use crate::merge::merge_snapshot;
use crate::projector::{collect_per_frame_maps, ProjectionOptions};
use crate::session_index::{build_session_indexes, SessionIndexCache};

/// Options for one capture.
#[derive(Debug, Clone, Default)]
pub struct CaptureOptions {
    /// Selector of the element whose context is wanted. Enables the scoped path.
    pub focus_selector: Option<String>,
    /// Use the alternate DOM walk.
    pub experimental: bool,
    /// Return per-frame outlines alongside the combined tree.
    pub include_per_frame: bool,
    /// Caller-owned cache reused across captures of the same page.
    pub session_index_cache: Option<Arc<SessionIndexCache>>,
}

impl CaptureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_focus_selector(mut self, selector: impl Into<String>) -> Self {
        self.focus_selector = Some(selector.into());
        self
    }

    pub fn with_experimental(mut self, experimental: bool) -> Self {
        self.experimental = experimental;
        self
    }

    pub fn with_per_frame(mut self, include: bool) -> Self {
        self.include_per_frame = include;
        self
    }

    pub fn with_cache(mut self, cache: Arc<SessionIndexCache>) -> Self {
        self.session_index_cache = Some(cache);
        self
    }

    fn focus(&self) -> Option<&str> {
        self.focus_selector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Captures hybrid snapshots using a set of collaborators.
#[derive(Clone)]
pub struct HybridSnapshotter {
    dom: Arc<dyn DomIndexer>,
    outlines: Arc<dyn OutlineProvider>,
    focus: Arc<dyn FocusResolver>,
}

impl HybridSnapshotter {
    pub fn new(
        dom: Arc<dyn DomIndexer>,
        outlines: Arc<dyn OutlineProvider>,
        focus: Arc<dyn FocusResolver>,
    ) -> Self {
        Self {
            dom,
            outlines,
            focus,
        }
    }

    /// Capture one snapshot of `page`.
    ///
    /// With a focus selector the scoped path runs first and returns directly
    /// on success. Any scoped failure falls through to the full capture.
    pub async fn capture(
        &self,
        page: &dyn Page,
        options: &CaptureOptions,
    ) -> Result<CombinedSnapshot, CaptureError> {
        if let Some(selector) = options.focus() {
            match self.capture_scoped(page, selector, options).await {
                Ok(Some(snapshot)) => {
                    info!(
                        path = "scoped",
                        frames = 1,
                        nodes = snapshot.combined_xpath_map.len(),
                        "Captured hybrid snapshot"
                    );
                    return Ok(snapshot);
                }
                Ok(None) => {
                    debug!(selector, "Focus selector not applied, running full capture");
                }
                Err(e) => {
                    debug!(selector, error = %e, "Scoped capture failed, running full capture");
                }
            }
        }
        self.capture_full(page, options).await
    }

    async fn capture_scoped(
        &self,
        page: &dyn Page,
        selector: &str,
        options: &CaptureOptions,
    ) -> Result<Option<CombinedSnapshot>, CollaboratorError> {
        let Some(target) = self.focus.resolve(page, selector).await? else {
            return Ok(None);
        };
        let frame_id = target.target_frame_id.clone();
        let session = page.session_for_frame(&frame_id)?;
        let ordinal = page.ordinal(&frame_id);

        let maps = self
            .dom
            .dom_maps_for_session(
                session.as_ref(),
                &DomMapsRequest {
                    frame_id: frame_id.clone(),
                    ordinal,
                    experimental: options.experimental,
                },
            )
            .await?;

        let request = OutlineRequest {
            frame_id: &frame_id,
            ordinal,
            focus_xpath: Some(target.tail_xpath.as_deref().unwrap_or("/")),
            xpath_map: Some(&maps.xpath_map),
            tag_name_map: Some(&maps.tag_name_map),
            scrollable_map: Some(&maps.scrollable_map),
            collect_urls: true,
            experimental: options.experimental,
        };
        let outline = self
            .outlines
            .outline_for_frame(session.as_ref(), &request)
            .await?;
        if !outline.scope_applied {
            return Ok(None);
        }

        let per_frame = options.include_per_frame.then(|| {
            vec![PerFrameOutline {
                frame_id: frame_id.clone(),
                outline: outline.outline.clone(),
            }]
        });

        Ok(Some(CombinedSnapshot {
            combined_tree: outline.outline,
            combined_xpath_map: maps.xpath_map,
            combined_tag_name_map: maps.tag_name_map,
            combined_scrollable_map: maps.scrollable_map,
            combined_url_map: outline.url_map,
            per_frame,
            frames: vec![FrameSummary {
                frame_id: frame_id.clone(),
                ordinal,
                parent_id: None,
                owner_key: None,
            }],
            scope: Some(ScopeInfo {
                frame_id,
                tail_xpath: target.tail_xpath,
                abs_prefix: target.abs_prefix,
            }),
            diagnostics: Vec::new(),
        }))
    }

    async fn capture_full(
        &self,
        page: &dyn Page,
        options: &CaptureOptions,
    ) -> Result<CombinedSnapshot, CaptureError> {
        let cache = options
            .session_index_cache
            .clone()
            .unwrap_or_else(|| Arc::new(SessionIndexCache::new()));

        let context = build_frame_context(page)?;
        debug!(frames = context.frames.len(), root = %context.root_id, "Built frame context");

        let report = build_session_indexes(
            page,
            &context.frames,
            options.experimental,
            &cache,
            self.dom.as_ref(),
        )
        .await;
        if report.available() == 0 {
            return Err(CaptureError::NoSessions);
        }

        let results = collect_per_frame_maps(
            page,
            &context,
            &cache,
            &report,
            ProjectionOptions {
                experimental: options.experimental,
                collect_urls: true,
            },
            self.dom.as_ref(),
            self.outlines.as_ref(),
        )
        .await;

        let sessions = report.available();
        let mut diagnostics = report.diagnostics;
        diagnostics.extend(results.diagnostics.iter().cloned());
        if results.per_frame_outlines.is_empty() {
            return Err(CaptureError::NothingCaptured {
                diagnostics: diagnostics.len(),
            });
        }

        let snapshot = merge_snapshot(results, options.include_per_frame, diagnostics);
        info!(
            path = "full",
            frames = snapshot.frames.len(),
            sessions,
            nodes = snapshot.combined_xpath_map.len(),
            dropped = snapshot.diagnostics.len(),
            "Captured hybrid snapshot"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
#[path = "capture_tests.rs"]
mod tests;
