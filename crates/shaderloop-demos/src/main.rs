//! Usage: `shaderloop-demos [mandelbrot|julia|conway-compute|conway-paced|conway-fragment|particles]`

use shaderloop_engine::logging::{LoggingConfig, init_logging};

fn main() {
    init_logging(LoggingConfig::default());

    let name = std::env::args()
        .nth(1)
        .unwrap_or_else(|| shaderloop_demos::DEFAULT_DEMO.to_owned());
    log::info!("starting demo `{name}`");

    if let Err(err) = shaderloop_demos::run(&name) {
        eprintln!("shaderloop-demos: {err:#}");
        std::process::exit(1);
    }
}
