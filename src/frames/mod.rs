pub mod controller;
pub mod input;
pub mod loop_worker;
pub mod source;

pub use controller::FrameLoopController;
pub use input::{parse_input_line, InputMessage};
pub use source::{ChannelFrameSource, FrameFeeder, FrameResult, FrameSource};
