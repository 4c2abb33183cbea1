//! Tracing bootstrap shared by the service and the launchers.
//!
//! `RUST_LOG` wins over the configured level. Initialization is once per
//! process; later calls are no-ops.

use anyhow::Context;
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use libadmin_kernel::settings::{LogFormat, TelemetrySettings};

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// Install the global tracing subscriber described by `settings`.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    INSTALLED
        .get_or_try_init(|| -> anyhow::Result<LogFormat> {
            let filter = build_filter(&settings.level)?;
            let registry = tracing_subscriber::registry().with(filter);

            match settings.log_format {
                LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
                LogFormat::Json => registry
                    .with(fmt::layer().json().flatten_event(true))
                    .try_init(),
            }
            .context("failed to install tracing subscriber")?;

            Ok(settings.log_format.clone())
        })
        .map(|format| {
            tracing::debug!(target: "libadmin-telemetry", ?format, "telemetry ready");
        })
}

fn build_filter(level: &str) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log filter directive '{}'", level)),
    }
}
