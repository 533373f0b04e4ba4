//! Flattened CDP session attached to one page or iframe target.

use std::sync::Arc;

use async_trait::async_trait;
use framesnap_protocols::{Session, SessionError};
use serde_json::Value;
use tracing::debug;

use super::client::Connection;
use super::error::CdpError;

/// A session attached to a single target.
pub struct CdpSession {
    target_id: String,
    session_id: String,
    conn: Arc<Connection>,
}

impl CdpSession {
    pub(crate) fn new(target_id: String, session_id: String, conn: Arc<Connection>) -> Self {
        Self {
            target_id,
            session_id,
            conn,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a CDP command to this session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.conn.call(method, params, Some(&self.session_id)).await
    }

    /// Enable the domains used during capture.
    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("DOM.enable", None).await?;
        self.call("Runtime.enable", None).await?;
        self.call("Accessibility.enable", None).await?;

        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }
}

#[async_trait]
impl Session for CdpSession {
    fn id(&self) -> Option<&str> {
        Some(&self.session_id)
    }

    async fn send(&self, method: &str, params: Option<Value>) -> Result<Value, SessionError> {
        Ok(self.call(method, params).await?)
    }
}
