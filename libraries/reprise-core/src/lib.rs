//! Reprise Core
//!
//! Platform-agnostic types, collaborator traits and error handling shared by
//! the playback engine, the coordinator and the storage layer.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `MediaFile`, `LoopRange`, `Segment`, `RepeatMode`
//! - **Collaborator Traits**: `MediaLibrary`, `FolderListing`,
//!   `SegmentRepository`, `SessionTracker`
//! - **Error Handling**: Unified `RepriseError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use reprise_core::types::{LoopRange, LoopEdit};
//!
//! let mut range = LoopRange::default();
//! assert_eq!(range.set_point_a(10.0), LoopEdit::Applied);
//! assert_eq!(range.set_point_b(20.0), LoopEdit::Applied);
//! assert!(range.is_valid());
//!
//! // B must be strictly after A
//! assert_eq!(range.set_point_b(5.0), LoopEdit::Rejected);
//! assert_eq!(range.point_b(), Some(20.0));
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{RepriseError, Result};
pub use traits::{FolderListing, MediaLibrary, SegmentRepository, SessionTracker};
pub use types::{
    clamp_time, format_timestamp, FileId, FolderId, LoopEdit, LoopRange, MediaFile, MediaLocation,
    PlaybackRecord, RepeatMode, Segment, SegmentId, TimeRange,
};
