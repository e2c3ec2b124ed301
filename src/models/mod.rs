pub mod posture;
pub mod session;

pub use posture::{ActivityKind, Frame, Keypoint, PostureStatus};
pub use session::SessionRecord;
