//! Chrome DevTools Protocol client.
//!
//! One WebSocket per browser; page and iframe targets are reached through
//! flattened sessions (`Target.attachToTarget { flatten: true }`).
//!
//! Start Chrome with remote debugging:
//!
//! ```bash
//! google-chrome --remote-debugging-port=9222
//! ```

mod client;
mod error;
mod protocol;
mod session;

pub use client::{CdpClient, DEFAULT_CALL_TIMEOUT};
pub use error::CdpError;
pub use protocol::*;
pub use session::CdpSession;
