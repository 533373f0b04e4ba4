//! Session index cache: one DOM index per distinct debugging session.
//!
//! The cache is owned by the caller and may outlive a single capture. Each
//! session key maps to a once-cell, so concurrent requests for the same key
//! await a single in-flight build instead of walking the DOM twice.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use framesnap_protocols::{
    CaptureDiagnostic, CollaboratorError, DiagnosticStage, DomIndexer, FrameId, Page, Session,
    SessionDomIndex, SessionKey,
};
use futures::future::join_all;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

type Slot = Arc<OnceCell<Arc<SessionDomIndex>>>;

/// Reusable map of session key to DOM index.
#[derive(Default)]
pub struct SessionIndexCache {
    slots: DashMap<SessionKey, Slot>,
}

impl SessionIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed index for a key, if any.
    pub fn get(&self, key: &SessionKey) -> Option<Arc<SessionDomIndex>> {
        self.slots.get(key).and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, key: &SessionKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of completed indexes.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.value().initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys with a completed index.
    pub fn keys(&self) -> Vec<SessionKey> {
        self.slots
            .iter()
            .filter(|slot| slot.value().initialized())
            .map(|slot| slot.key().clone())
            .collect()
    }

    /// Seed the cache with a prebuilt index. Existing entries are kept.
    pub fn insert(&self, key: SessionKey, index: SessionDomIndex) -> bool {
        let slot = self.slots.entry(key).or_default().clone();
        slot.set(Arc::new(index)).is_ok()
    }

    /// Forget one session, e.g. after its document navigated.
    pub fn invalidate(&self, key: &SessionKey) {
        self.slots.remove(key);
    }

    pub fn clear(&self) {
        self.slots.clear();
    }

    /// Return the index for `key`, running `build` only if no index exists
    /// and no other task is already building one.
    ///
    /// The boolean is true when this call ran the build. A failed build
    /// leaves the key empty.
    pub async fn get_or_build<F, Fut>(
        &self,
        key: &SessionKey,
        build: F,
    ) -> Result<(Arc<SessionDomIndex>, bool), CollaboratorError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SessionDomIndex, CollaboratorError>>,
    {
        // clone the slot out so no map guard is held across the await
        let slot = self.slots.entry(key.clone()).or_default().clone();
        let built = AtomicBool::new(false);
        let index = slot
            .get_or_try_init(|| {
                built.store(true, Ordering::Relaxed);
                let fut = build();
                async move { fut.await.map(Arc::new) }
            })
            .await?;
        Ok((index.clone(), built.load(Ordering::Relaxed)))
    }
}

impl std::fmt::Debug for SessionIndexCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIndexCache")
            .field("keys", &self.keys())
            .finish()
    }
}

/// Outcome of [`build_session_indexes`].
#[derive(Debug, Default)]
pub struct SessionIndexReport {
    /// Owning session of every resolved frame.
    pub session_by_frame: HashMap<FrameId, SessionKey>,
    /// Frames whose session could not be resolved.
    pub unresolved: HashSet<FrameId>,
    /// Keys built by this call.
    pub built: Vec<SessionKey>,
    /// Keys already present in the cache.
    pub reused: Vec<SessionKey>,
    /// Keys whose DOM walk failed; their frames are excluded.
    pub failed: HashSet<SessionKey>,
    pub diagnostics: Vec<CaptureDiagnostic>,
}

impl SessionIndexReport {
    /// Sessions with a usable index.
    pub fn available(&self) -> usize {
        self.built.len() + self.reused.len()
    }

    /// True if the frame's session was resolved and indexed.
    pub fn is_usable(&self, frame_id: &FrameId) -> bool {
        self.session_by_frame
            .get(frame_id)
            .is_some_and(|key| !self.failed.contains(key))
    }
}

/// Resolve the owning session of every frame and make sure each distinct
/// session has a DOM index in `cache`.
///
/// The DOM walk runs at most once per session key. Failures are reported,
/// not returned.
pub async fn build_session_indexes(
    page: &dyn Page,
    frames: &[FrameId],
    experimental: bool,
    cache: &SessionIndexCache,
    indexer: &dyn DomIndexer,
) -> SessionIndexReport {
    let mut report = SessionIndexReport::default();
    let mut sessions: Vec<(SessionKey, Arc<dyn Session>)> = Vec::new();

    for frame_id in frames {
        match page.session_for_frame(frame_id) {
            Ok(session) => {
                let key = session.key();
                if !sessions.iter().any(|(k, _)| k == &key) {
                    sessions.push((key.clone(), session));
                }
                report.session_by_frame.insert(frame_id.clone(), key);
            }
            Err(e) => {
                warn!(frame = %frame_id, error = %e, "Failed to resolve session for frame");
                report.unresolved.insert(frame_id.clone());
                report.diagnostics.push(CaptureDiagnostic::frame(
                    DiagnosticStage::SessionResolve,
                    frame_id,
                    e.to_string(),
                ));
            }
        }
    }

    let builds = sessions.iter().map(|(key, session)| async move {
        let result = cache
            .get_or_build(key, || indexer.build_session_dom_index(session.as_ref(), experimental))
            .await;
        (key, result)
    });

    for (key, result) in join_all(builds).await {
        match result {
            Ok((index, true)) => {
                debug!(session = %key, nodes = index.node_count(), "Built session DOM index");
                report.built.push(key.clone());
            }
            Ok((_, false)) => {
                debug!(session = %key, "Reusing cached session DOM index");
                report.reused.push(key.clone());
            }
            Err(e) => {
                warn!(session = %key, error = %e, "Session DOM walk failed, excluding its frames");
                report.failed.insert(key.clone());
                report.diagnostics.push(CaptureDiagnostic::session(
                    DiagnosticStage::SessionBuild,
                    key,
                    e.to_string(),
                ));
            }
        }
    }

    report
}

#[cfg(test)]
#[path = "session_index_tests.rs"]
mod tests;
