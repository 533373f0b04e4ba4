//! Error types for the framesnap protocol layer.

mod capture;
mod collaborator;
mod session;

pub use capture::*;
pub use collaborator::*;
pub use session::*;
