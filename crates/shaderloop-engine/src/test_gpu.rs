//! Device access for unit tests. Tests return early when no adapter exists.

use crate::device::{Gpu, GpuInit};

/// A headless device, or `None` on machines without a usable adapter.
pub(crate) fn headless() -> Option<Gpu> {
    match pollster::block_on(Gpu::headless(GpuInit::default())) {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("skipping device test: {err:#}");
            None
        }
    }
}
