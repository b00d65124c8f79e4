//! Logging and tracing initialization.

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber with the given configuration.
///
/// `RUST_LOG` takes precedence over `config.level`. When `config.file` is
/// set and can be opened, log lines are appended there instead of stderr.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file = config.file.as_ref().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    if config.json {
        let builder = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json();
        match file {
            Some(file) => {
                let subscriber = builder.with_writer(std::sync::Mutex::new(file)).finish();
                tracing::subscriber::set_global_default(subscriber).ok();
            }
            None => {
                let subscriber = builder.with_writer(std::io::stderr).finish();
                tracing::subscriber::set_global_default(subscriber).ok();
            }
        }
    } else {
        let builder = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false);
        match file {
            Some(file) => {
                let subscriber = builder
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file))
                    .finish();
                tracing::subscriber::set_global_default(subscriber).ok();
            }
            None => {
                let subscriber = builder.with_writer(std::io::stderr).finish();
                tracing::subscriber::set_global_default(subscriber).ok();
            }
        }
    }
}
