//! Test doubles for the collaborator tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use framesnap_protocols::{FrameId, FrameTreeNode, Page, Session, SessionError};
use parking_lot::Mutex;
use serde_json::Value;

/// Session that answers each method with a canned result.
///
/// Answers are queued per method so consecutive calls can return different
/// values. Unscripted methods fail with a protocol error.
#[derive(Default)]
pub struct ScriptedSession {
    id: Option<String>,
    responses: Mutex<HashMap<String, Vec<Result<Value, SessionError>>>>,
    calls: Mutex<Vec<(String, Option<Value>)>>,
}

impl ScriptedSession {
    pub fn new(id: Option<&str>) -> Self {
        Self {
            id: id.map(|s| s.to_string()),
            ..Default::default()
        }
    }

    /// Queue a result for `method`. The last queued result repeats.
    pub fn on(self, method: &str, result: Value) -> Self {
        self.push(method, Ok(result));
        self
    }

    pub fn on_error(self, method: &str, message: &str) -> Self {
        self.push(
            method,
            Err(SessionError::Protocol {
                code: -32000,
                message: message.to_string(),
            }),
        );
        self
    }

    fn push(&self, method: &str, result: Result<Value, SessionError>) {
        self.responses
            .lock()
            .entry(method.to_string())
            .or_default()
            .push(result);
    }

    pub fn calls(&self) -> Vec<(String, Option<Value>)> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Option<Value>> {
        self.calls
            .lock()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl Session for ScriptedSession {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    async fn send(&self, method: &str, params: Option<Value>) -> Result<Value, SessionError> {
        self.calls.lock().push((method.to_string(), params));
        let mut responses = self.responses.lock();
        match responses.get_mut(method) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(SessionError::Protocol {
                code: -32601,
                message: format!("'{}' wasn't found", method),
            }),
        }
    }
}

/// Page with a flat frame list and one scripted session per frame.
pub struct StaticPage {
    main: FrameId,
    sessions: HashMap<FrameId, Arc<ScriptedSession>>,
}

impl StaticPage {
    pub fn new(main: &str, session: Arc<ScriptedSession>) -> Self {
        let main = FrameId::from(main);
        let mut sessions = HashMap::new();
        sessions.insert(main.clone(), session);
        Self { main, sessions }
    }

    pub fn with_frame(mut self, frame: &str, session: Arc<ScriptedSession>) -> Self {
        self.sessions.insert(FrameId::from(frame), session);
        self
    }
}

impl Page for StaticPage {
    fn main_frame_id(&self) -> FrameId {
        self.main.clone()
    }

    fn frame_tree(&self) -> FrameTreeNode {
        FrameTreeNode::new(self.main.clone())
    }

    fn list_all_frame_ids(&self) -> Vec<FrameId> {
        self.sessions.keys().cloned().collect()
    }

    fn session_for_frame(&self, frame_id: &FrameId) -> Result<Arc<dyn Session>, SessionError> {
        self.sessions
            .get(frame_id)
            .map(|s| s.clone() as Arc<dyn Session>)
            .ok_or_else(|| SessionError::FrameNotAttached(frame_id.to_string()))
    }

    fn ordinal(&self, frame_id: &FrameId) -> u32 {
        if frame_id == &self.main { 0 } else { 1 }
    }
}
