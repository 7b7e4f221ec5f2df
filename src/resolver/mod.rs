//! Reference resolution.
//!
//! # Architecture
//!
//! ```text
//! Session::fetch_*()
//!   │
//!   ├─► entity fetch (memoized on the pass)
//!   │     └─► entity resolver ─► resolve_references ─► schedule tasks
//!   │                                                     │
//!   │           ┌─────────────────────────────────────────┘
//!   │           ▼
//!   ├─► await_all_scheduled   (tasks fetch and schedule more, until quiet)
//!   │
//!   └─► Document::materialize (splice resolved documents, cut cycles)
//! ```

mod links;
pub mod marker;
pub mod pass;
pub mod tree;

pub use marker::{Detected, MARKER_KEY, ReferenceMarker};
pub use pass::{ResolutionPass, SharedFetch};
pub use tree::{Document, resolve_references};
