//! Frame loop orchestration.
//!
//! [`RenderLoop`] is independent of any window system: it is driven by
//! [`RenderLoop::tick`] with an explicit timestamp and draws into any
//! [`DrawTarget`](crate::device::DrawTarget). The window runtime and headless
//! tests both drive it the same way.

mod ctx;
mod hooks;
mod options;
mod render_loop;

pub use ctx::FrameCtx;
pub use hooks::{FnHooks, FrameHooks, on_frame};
pub use options::LoopOptions;
pub use render_loop::{FrameOutcome, RenderLoop, RunState, RunSummary, run_render_loop};
