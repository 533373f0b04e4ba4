//! # framesnap CDP
//!
//! Chrome DevTools Protocol implementations of the framesnap page and
//! collaborator protocols.
//!
//! ## Components
//!
//! - [`CdpClient`] - Browser WebSocket connection and target management
//! - [`CdpPage`] - Page plus out-of-process iframe sessions
//! - [`CdpDomIndexer`] - `DOM.getDocument` walk and per-frame maps
//! - [`CdpOutlineProvider`] - Accessibility outline per frame
//! - [`CdpFocusResolver`] - XPath/CSS focus resolution across iframes
//!
//! ## Usage
//!
//! ```rust,ignore
//! let client = CdpClient::connect("http://localhost:9222", DEFAULT_CALL_TIMEOUT).await?;
//! let page = CdpPage::attach(&client, None).await?;
//! ```

pub mod cdp;
mod dom_index;
mod focus;
mod js;
mod outline;
mod page;

#[cfg(test)]
mod testing;

pub use cdp::{CdpClient, CdpError, CdpSession, DEFAULT_CALL_TIMEOUT};
pub use dom_index::{index_document, mark_scrollable, CdpDomIndexer};
pub use focus::CdpFocusResolver;
pub use outline::{render_outline, CdpOutlineProvider};
pub use page::CdpPage;
