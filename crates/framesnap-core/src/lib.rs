//! # framesnap Core
//!
//! Captures one structural snapshot of a page whose frames may be owned by
//! several debugging sessions: the combined accessibility outline plus DOM
//! addressing maps (xpaths, tag names, scrollability, link URLs) keyed by
//! `"{ordinal}-{backendNodeId}"`.
//!
//! ## Pipeline
//!
//! 1. [`build_frame_context`] - ordered frame list and parent pointers
//! 2. [`build_session_indexes`] - one DOM walk per distinct session
//! 3. [`collect_per_frame_maps`] - frame-local maps and outlines
//! 4. [`merge_snapshot`] - disjoint map union and outline splicing
//!
//! [`HybridSnapshotter::capture`] runs the pipeline, or a cheaper scoped
//! single-frame capture when a focus selector resolves.

mod capture;
mod frame_context;
mod merge;
mod projector;
mod session_index;

#[cfg(test)]
mod testing;

pub use capture::{CaptureOptions, HybridSnapshotter};
pub use frame_context::build_frame_context;
pub use merge::{marker_key, merge_outlines, merge_snapshot};
pub use projector::{collect_per_frame_maps, frame_owner, PerFrameResults, ProjectionOptions};
pub use session_index::{build_session_indexes, SessionIndexCache, SessionIndexReport};
