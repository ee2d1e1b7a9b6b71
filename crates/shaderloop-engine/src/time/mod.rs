//! Frame timing and scheduling.
//!
//! Both types take the current instant as an argument so loop behavior can be
//! exercised without real waiting.

mod frame_clock;
mod schedule;

pub use frame_clock::{FrameClock, FrameTime};
pub use schedule::FrameSchedule;
