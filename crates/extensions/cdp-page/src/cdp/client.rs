//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};
use url::Url;

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpRequest, CdpResponse, PageInfo, TargetInfo};
use super::session::CdpSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>>;

/// Default timeout for a single protocol call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared half of the browser connection used by the client and every
/// flattened session.
pub(crate) struct Connection {
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    pending: PendingMap,
    call_timeout: Duration,
}

impl Connection {
    /// Send a CDP command and wait for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(self.call_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(method.to_string()))
            }
        }
    }
}

/// CDP client for one browser.
///
/// Holds a single WebSocket to the browser target. Page and iframe targets
/// are reached through flattened sessions multiplexed over it.
pub struct CdpClient {
    /// HTTP endpoint, when connected through discovery.
    http_endpoint: Option<String>,
    /// Browser WebSocket URL.
    browser_ws_url: String,
    conn: Arc<Connection>,
    /// Background task handle.
    recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to Chrome.
    ///
    /// `endpoint` is either the DevTools HTTP endpoint
    /// (e.g. `http://localhost:9222`) or a browser `ws://` URL.
    ///
    /// ```rust,ignore
    /// let client = CdpClient::connect("http://localhost:9222", DEFAULT_CALL_TIMEOUT).await?;
    /// ```
    pub async fn connect(endpoint: &str, call_timeout: Duration) -> Result<Self, CdpError> {
        let browser_ws_url = Self::discover_ws_url(endpoint).await?;
        let http_endpoint = Url::parse(endpoint)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .map(|_| endpoint.trim_end_matches('/').to_string());

        let (ws_stream, _) = tokio_tungstenite::connect_async(&browser_ws_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        let recv_task = {
            let pending = pending.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, pending).await;
            })
        };

        debug!("CDP client connected to {}", browser_ws_url);

        Ok(Self {
            http_endpoint,
            browser_ws_url,
            conn: Arc::new(Connection {
                ws_tx: tokio::sync::Mutex::new(ws_sink),
                request_id: AtomicU64::new(1),
                pending,
                call_timeout,
            }),
            recv_task,
        })
    }

    /// Resolve the browser WebSocket URL for an endpoint.
    pub(crate) async fn discover_ws_url(endpoint: &str) -> Result<String, CdpError> {
        let parsed = Url::parse(endpoint)?;
        match parsed.scheme() {
            "ws" | "wss" => Ok(endpoint.to_string()),
            "http" | "https" => {
                let version_url = format!("{}/json/version", endpoint.trim_end_matches('/'));
                debug!("Fetching browser version from {}", version_url);

                let version: BrowserVersion = reqwest::get(&version_url)
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
                    .json()
                    .await
                    .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?;

                debug!("Connected to browser: {}", version.browser);
                Ok(version.web_socket_debugger_url)
            }
            other => Err(CdpError::ConnectionFailed(format!(
                "unsupported endpoint scheme '{}'",
                other
            ))),
        }
    }

    /// WebSocket receive loop.
    async fn receive_loop(mut ws_source: WsSource, pending: PendingMap) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(resp) => Self::dispatch(resp, &pending),
                        Err(e) => warn!("Failed to parse CDP message: {}", e),
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
        // dropping the senders fails every waiter with SessionClosed
        pending.lock().clear();
    }

    fn dispatch(resp: CdpResponse, pending: &PendingMap) {
        let Some(id) = resp.id else {
            // events are not consumed
            return;
        };
        let Some(tx) = pending.lock().remove(&id) else {
            return;
        };
        let result = match resp.error {
            Some(error) => Err(CdpError::Protocol {
                code: error.code,
                message: error.message,
            }),
            None => Ok(resp.result.unwrap_or(Value::Null)),
        };
        let _ = tx.send(result);
    }

    /// Send a browser-level CDP command.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.conn.call(method, params, None).await
    }

    /// Get browser WebSocket URL.
    pub fn browser_ws_url(&self) -> &str {
        &self.browser_ws_url
    }

    pub fn call_timeout(&self) -> Duration {
        self.conn.call_timeout
    }

    // ========================================================================
    // Target Management
    // ========================================================================

    /// List pages through the HTTP endpoint, or `Target.getTargets` when
    /// connected directly over WebSocket.
    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        match &self.http_endpoint {
            Some(http) => {
                let url = format!("{}/json/list", http);
                let pages: Vec<PageInfo> = reqwest::get(&url).await?.json().await?;
                Ok(pages.into_iter().filter(|p| p.page_type == "page").collect())
            }
            None => Ok(self
                .get_targets()
                .await?
                .into_iter()
                .filter(TargetInfo::is_page)
                .map(|t| PageInfo {
                    id: t.target_id,
                    page_type: t.target_type,
                    title: t.title,
                    url: t.url,
                    web_socket_debugger_url: None,
                })
                .collect()),
        }
    }

    /// Get all targets.
    pub async fn get_targets(&self) -> Result<Vec<TargetInfo>, CdpError> {
        let result = self.call("Target.getTargets", None).await?;
        let targets: Vec<TargetInfo> = serde_json::from_value(result["targetInfos"].clone())?;
        Ok(targets)
    }

    /// Attach a flattened session to a target and enable the domains the
    /// capture needs.
    pub async fn attach(&self, target_id: &str) -> Result<CdpSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let session = CdpSession::new(target_id.to_string(), session_id, self.conn.clone());
        session.enable_domains().await?;
        Ok(session)
    }

    /// Detach a flattened session from its target.
    pub async fn detach(&self, session: &CdpSession) -> Result<(), CdpError> {
        self.call(
            "Target.detachFromTarget",
            Some(json!({ "sessionId": session.session_id() })),
        )
        .await?;
        debug!("Detached session {} from {}", session.session_id(), session.target_id());
        Ok(())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
