//! Data model shared by the capture core and its collaborators.

mod dom;
mod frame;
mod ids;
mod snapshot;

pub use dom::*;
pub use frame::*;
pub use ids::*;
pub use snapshot::*;
