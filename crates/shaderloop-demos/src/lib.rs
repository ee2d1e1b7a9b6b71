//! Shader sketches on top of `shaderloop-engine`: fractals, Game of Life
//! variants and a particle system. Each module exposes a setup function for
//! [`Runtime::run`] plus typed setters for its uniforms.

pub mod conway_compute;
pub mod conway_fragment;
pub mod fractals;
pub mod particles;

#[cfg(test)]
pub(crate) mod test_gpu;

use anyhow::Result;

use shaderloop_engine::window::{Runtime, RuntimeConfig};

pub const DEMOS: [&str; 6] = [
    "mandelbrot",
    "julia",
    "conway-compute",
    "conway-paced",
    "conway-fragment",
    "particles",
];
pub const DEFAULT_DEMO: &str = "conway-compute";

fn runtime(name: &str) -> Runtime {
    Runtime::new(RuntimeConfig {
        title: format!("shaderloop · {name}"),
        ..RuntimeConfig::default()
    })
}

/// Runs the demo called `name` in a window until it is closed.
pub fn run(name: &str) -> Result<()> {
    let runtime = runtime(name);
    match name {
        "mandelbrot" => runtime.run(fractals::mandelbrot),
        "julia" => runtime.run(fractals::julia),
        "conway-compute" => runtime.run(conway_compute::setup),
        "conway-paced" => runtime
            .with_loop_options(conway_compute::paced_loop_options())
            .run(conway_compute::setup_paced),
        "conway-fragment" => runtime
            .with_surface_options(conway_fragment::surface_options())
            .run(conway_fragment::setup),
        "particles" => runtime.run(particles::setup),
        other => anyhow::bail!("unknown demo `{other}`, expected one of: {}", DEMOS.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_demo_is_rejected_before_opening_a_window() {
        let err = run("lorenz").unwrap_err().to_string();
        assert!(err.contains("unknown demo `lorenz`"));
        assert!(err.contains(DEFAULT_DEMO));
        assert!(err.contains("conway-paced"));
    }
}
