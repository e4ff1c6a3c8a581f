/// Domain types for Reprise
pub mod ids;
pub mod loop_range;
pub mod media_file;
pub mod repeat_mode;
pub mod segment;
pub mod time;

pub use ids::{FileId, FolderId, SegmentId};
pub use loop_range::{LoopEdit, LoopRange};
pub use media_file::{MediaFile, MediaLocation, PlaybackRecord};
pub use repeat_mode::RepeatMode;
pub use segment::{Segment, TimeRange};
pub use time::{clamp_time, format_timestamp};
