//! Data models.
//!
//! Value types shared by the classifier, the advisor, the timeline
//! reconstructor and the summary renderer.

mod advisory;
mod event;
mod summary;
mod timeline;

pub use advisory::{Advisory, AdvisoryBody, MatchResult};
pub use event::{Event, EventKind, FileOperation, FileTarget};
pub use summary::{FileTouch, IconClass, SessionStatistics, SessionSummary};
pub use timeline::{SessionTimeline, TimelineError, TimelineErrorKind};
