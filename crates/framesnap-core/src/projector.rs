//! Per-frame map projection.
//!
//! Turns session-wide DOM indexes into frame-local maps keyed by composite
//! key, locates each child frame's host iframe, and fetches every frame's
//! accessibility outline.

use std::collections::BTreeMap;

use framesnap_protocols::{
    BackendNodeId, CaptureDiagnostic, CollaboratorError, CompositeKey, DiagnosticStage,
    DomIndexer, FrameContext, FrameId, FrameSummary, OutlineProvider, OutlineRequest, Page,
    PerFrameMaps, PerFrameOutline, Session, SessionError,
};
use futures::future::join_all;
use serde_json::json;
use tracing::{debug, warn};

use crate::session_index::{SessionIndexCache, SessionIndexReport};

/// Options for [`collect_per_frame_maps`].
#[derive(Debug, Clone, Copy)]
pub struct ProjectionOptions {
    pub experimental: bool,
    /// Merge link URLs from outlines into the per-frame url maps.
    pub collect_urls: bool,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            experimental: false,
            collect_urls: true,
        }
    }
}

/// Everything collected for the frames that survived projection.
#[derive(Debug, Default)]
pub struct PerFrameResults {
    /// In frame traversal order.
    pub per_frame_outlines: Vec<PerFrameOutline>,
    pub per_frame_maps: BTreeMap<FrameId, PerFrameMaps>,
    /// In frame traversal order.
    pub frames: Vec<FrameSummary>,
    pub diagnostics: Vec<CaptureDiagnostic>,
}

struct FrameProjection {
    summary: FrameSummary,
    outline: PerFrameOutline,
    maps: PerFrameMaps,
}

struct ProjectionEnv<'a> {
    page: &'a dyn Page,
    context: &'a FrameContext,
    cache: &'a SessionIndexCache,
    report: &'a SessionIndexReport,
    options: ProjectionOptions,
    indexer: &'a dyn DomIndexer,
    outlines: &'a dyn OutlineProvider,
}

/// Project every frame of `context`. Frames are processed concurrently; a
/// failing frame is dropped with a diagnostic and never affects the others.
pub async fn collect_per_frame_maps(
    page: &dyn Page,
    context: &FrameContext,
    cache: &SessionIndexCache,
    report: &SessionIndexReport,
    options: ProjectionOptions,
    indexer: &dyn DomIndexer,
    outlines: &dyn OutlineProvider,
) -> PerFrameResults {
    let env = ProjectionEnv {
        page,
        context,
        cache,
        report,
        options,
        indexer,
        outlines,
    };

    let pending: Vec<_> = context
        .frames
        .iter()
        .filter(|frame_id| {
            if report.unresolved.contains(*frame_id) {
                debug!(frame = %frame_id, "Skipping frame without a session");
                return false;
            }
            if let Some(key) = report.session_by_frame.get(*frame_id) {
                if report.failed.contains(key) {
                    debug!(frame = %frame_id, session = %key, "Skipping frame of failed session");
                    return false;
                }
            }
            true
        })
        .collect();

    let projections = join_all(pending.iter().map(|frame_id| project_frame(&env, frame_id))).await;

    let mut results = PerFrameResults::default();
    for projection in projections {
        match projection {
            Ok(p) => {
                results.per_frame_maps.insert(p.summary.frame_id.clone(), p.maps);
                results.per_frame_outlines.push(p.outline);
                results.frames.push(p.summary);
            }
            Err(diagnostic) => {
                warn!(
                    frame = ?diagnostic.frame_id,
                    stage = ?diagnostic.stage,
                    error = %diagnostic.message,
                    "Dropping frame from snapshot"
                );
                results.diagnostics.push(diagnostic);
            }
        }
    }
    results
}

async fn project_frame(
    env: &ProjectionEnv<'_>,
    frame_id: &FrameId,
) -> Result<FrameProjection, CaptureDiagnostic> {
    let fail = |stage: DiagnosticStage, message: String| {
        CaptureDiagnostic::frame(stage, frame_id, message)
    };

    let session = env
        .page
        .session_for_frame(frame_id)
        .map_err(|e| fail(DiagnosticStage::SessionResolve, e.to_string()))?;
    let session_key = session.key();
    if env.report.failed.contains(&session_key) {
        return Err(fail(
            DiagnosticStage::SessionBuild,
            format!("no DOM index for session {}", session_key),
        ));
    }
    let (index, _) = env
        .cache
        .get_or_build(&session_key, || {
            env.indexer
                .build_session_dom_index(session.as_ref(), env.options.experimental)
        })
        .await
        .map_err(|e| fail(DiagnosticStage::SessionBuild, e.to_string()))?;

    let ordinal = env.page.ordinal(frame_id);
    let parent_id = env.context.parent_of(frame_id).cloned();

    let (owner_key, doc_root) = match parent_id.as_ref() {
        None => (None, index.root_backend),
        Some(parent) => {
            let parent_session = env
                .page
                .session_for_frame(parent)
                .map_err(|e| fail(DiagnosticStage::FrameOwner, e.to_string()))?;
            let owner = frame_owner(parent_session.as_ref(), frame_id)
                .await
                .map_err(|e| fail(DiagnosticStage::FrameOwner, e.to_string()))?;
            // backend ids are only comparable within one session
            let doc_root = if parent_session.key() == session_key {
                index.document_root_for(Some(owner))
            } else {
                index.root_backend
            };
            let parent_ordinal = env.page.ordinal(parent);
            (Some(CompositeKey::new(parent_ordinal, owner)), doc_root)
        }
    };

    let mut maps = PerFrameMaps::from_dom_maps(index.project_document(doc_root, ordinal));
    debug!(
        frame = %frame_id,
        ordinal,
        session = %session_key,
        nodes = maps.xpath_map.len(),
        "Projected frame DOM maps"
    );

    let request = OutlineRequest {
        frame_id,
        ordinal,
        focus_xpath: None,
        xpath_map: Some(&maps.xpath_map),
        tag_name_map: Some(&maps.tag_name_map),
        scrollable_map: Some(&maps.scrollable_map),
        collect_urls: env.options.collect_urls,
        experimental: env.options.experimental,
    };
    let outline = env
        .outlines
        .outline_for_frame(session.as_ref(), &request)
        .await
        .map_err(|e| fail(DiagnosticStage::Outline, e.to_string()))?;

    if env.options.collect_urls {
        maps.url_map.extend(outline.url_map);
    }

    Ok(FrameProjection {
        summary: FrameSummary {
            frame_id: frame_id.clone(),
            ordinal,
            parent_id,
            owner_key,
        },
        outline: PerFrameOutline {
            frame_id: frame_id.clone(),
            outline: outline.outline,
        },
        maps,
    })
}

/// Backend id of the iframe element hosting `frame_id`, asked of the session
/// that owns the parent document.
pub async fn frame_owner(
    session: &dyn Session,
    frame_id: &FrameId,
) -> Result<BackendNodeId, CollaboratorError> {
    let result = session
        .send("DOM.getFrameOwner", Some(json!({ "frameId": frame_id.as_str() })))
        .await?;
    result["backendNodeId"]
        .as_i64()
        .map(BackendNodeId)
        .ok_or_else(|| {
            SessionError::InvalidResponse(format!("missing backendNodeId for frame {}", frame_id))
                .into()
        })
}

#[cfg(test)]
#[path = "projector_tests.rs"]
mod tests;
