//! Tracing setup: console layer (pretty or JSON) on stderr, plus an
//! optional JSON file layer from `[logging]`.
use std::io;
use std::path::Path;

use eyre::WrapErr;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::FILE_GUARD;

/// `RUST_LOG` wins over the `--log-level` flag.
fn console_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

pub fn init(level: &str, json: bool, cfg: &geiger_config::Logging) -> eyre::Result<()> {
    let pretty = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(io::stderr)
            .with_filter(console_filter(level))
    });
    let structured = json.then(|| {
        fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_filter(console_filter(level))
    });

    let file = match cfg.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {:?}", path))?;
            let appender = match cfg.rotation.as_deref() {
                Some("daily") => rolling::daily(dir, name),
                Some("hourly") => rolling::hourly(dir, name),
                _ => rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            // Flushes on drop; must outlive every log call.
            let _ = FILE_GUARD.set(guard);
            let file_level = cfg.level.as_deref().unwrap_or("info");
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(EnvFilter::new(file_level)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(pretty)
        .with(structured)
        .with(file)
        .try_init()
        .wrap_err("install tracing subscriber")
}
