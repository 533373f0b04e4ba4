//! # framesnap Protocols
//!
//! Protocol definitions (traits) and the data model for hybrid page
//! snapshots. Contains only interface definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`Page`] - A browser page whose frames may span several sessions
//! - [`Session`] - A remote debugging session
//! - [`DomIndexer`] - Per-session DOM walk
//! - [`OutlineProvider`] - Per-frame accessibility outline
//! - [`FocusResolver`] - Selector to frame/path resolution

pub mod collaborators;
pub mod error;
pub mod page;
pub mod types;

pub use collaborators::{
    DomIndexer, DomMapsRequest, FocusResolver, FocusTarget, FrameOutline, OutlineProvider,
    OutlineRequest,
};
pub use error::{CaptureError, CollaboratorError, SessionError};
pub use page::{Page, Session};
pub use types::*;
