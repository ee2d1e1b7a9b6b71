use std::sync::Once;

/// Filter applied when neither [`LoggingConfig::env_filter`] nor `RUST_LOG` is
/// set. The device stack logs every object it creates at info.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Logger configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter directives, e.g. "shaderloop_engine=trace".
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    pub fn with_write_style(mut self, write_style: env_logger::WriteStyle) -> Self {
        self.write_style = write_style;
        self
    }

    /// Directives in effect: explicit filter, then `RUST_LOG`, then the default.
    fn directives(&self) -> String {
        self.env_filter
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| DEFAULT_FILTER.to_owned())
    }
}

static INIT: Once = Once::new();

/// Installs `env_logger` as the global logger. Only the first call has an
/// effect; a logger installed by someone else is left in place.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let directives = config.directives();
        let installed = env_logger::Builder::new()
            .parse_filters(&directives)
            .write_style(config.write_style)
            .try_init();

        match installed {
            Ok(()) => log::debug!("logging initialized ({directives})"),
            Err(_) => log::debug!("a global logger was already installed"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        let config = LoggingConfig::default().with_filter("shaderloop_engine=trace");
        assert_eq!(config.directives(), "shaderloop_engine=trace");
    }

    #[test]
    fn init_is_idempotent() {
        init_logging(LoggingConfig::default().with_write_style(env_logger::WriteStyle::Never));
        init_logging(LoggingConfig::default());
        log::info!("still logging");
    }
}
