use std::sync::Once;

/// Filter used when neither the config nor `RUST_LOG` names one.
///
/// wgpu is chatty at info level; keep it at warn.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info", "warn",
/// "fastcanvas_engine=debug,wgpu=warn").
///
/// `write_style` controls ANSI coloring behavior.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
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
    /// Config with an explicit filter, overriding `RUST_LOG`.
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            env_filter: Some(filter.into()),
            ..Self::default()
        }
    }

    /// The filter string that will be applied.
    pub fn resolved_filter(&self) -> String {
        self.env_filter
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string())
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Idempotent; later calls are ignored. Call early in `main`, before the
/// render thread starts.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.resolved_filter();

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter);
        builder.write_style(config.write_style);

        // A host may have installed its own logger already.
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized ({filter})");
    });
}
