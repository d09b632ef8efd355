use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE: &str = "gateway.log";

/// Log directory from `LOG_DIR`, file logging is off when unset
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var_os("LOG_DIR")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Initialize logger system
///
/// Console output always; a daily rolling file when `LOG_DIR` is set.
pub fn init_logger() {
    let log_dir = get_log_dir();
    // Capture log macro logs
    let _ = tracing_log::LogTracer::init();

    // Console output layer
    let console_layer = fmt::Layer::new()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    // File output layer (disable ANSI formatting)
    let file_layer = log_dir.as_deref().and_then(|dir| match prepare_log_dir(dir) {
        Ok(()) => {
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            // Leak guard so buffered lines are flushed until program exit
            std::mem::forget(guard);
            Some(
                fmt::Layer::new()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true)
                    .with_level(true),
            )
        }
        Err(e) => {
            eprintln!("Failed to initialize log directory: {}", e);
            None
        }
    });

    // Default to INFO and above
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // try_init avoids a crash on re-initialization
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    if let Some(dir) = &log_dir {
        info!("Logger system initialized (Console + File: {})", dir.display());
    } else {
        info!("Logger system initialized (Console)");
    }
}

fn prepare_log_dir(dir: &Path) -> Result<(), String> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| format!("Failed to create log directory: {}", e))?;
    }
    Ok(())
}
