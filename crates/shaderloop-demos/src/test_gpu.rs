//! Device access for demo tests. Tests return early when no adapter exists.

use shaderloop_engine::device::{Gpu, GpuInit};

pub(crate) fn headless() -> Option<Gpu> {
    match pollster::block_on(Gpu::headless(GpuInit::default())) {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("skipping device test: {err:#}");
            None
        }
    }
}
