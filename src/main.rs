mod app;
mod clipboard;
mod config;
mod debounce;
mod language;
mod runtime;
mod translator;

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

// stdout belongs to the translator view, so logs go to a file.
fn setup_logging() {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let log_dir = config::Config::app_dir();
    let _ = std::fs::create_dir_all(&log_dir);
    let log_path = log_dir.join("debug.log");

    // Overwrite each launch to keep the file small
    match std::fs::File::create(&log_path) {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            let _ = LOG_GUARD.set(guard);
            tracing::info!("Logging to {}", log_path.display());
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            tracing::warn!("Failed to open {}: {}, logging to stderr", log_path.display(), e);
        }
    }
}

#[tokio::main]
async fn main() {
    setup_logging();

    std::panic::set_hook(Box::new(|info| {
        tracing::error!("PANIC: {}", info);
        eprintln!("quick-translate crashed: {}", info);
    }));

    tracing::info!("quick-translate starting");

    let config = config::Config::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}, using defaults", e);
        config::Config::default()
    });

    let clipboard = Box::new(clipboard::SystemClipboard::new());
    if let Err(e) = runtime::run(&config, clipboard).await {
        tracing::error!("Fatal: {:#}", e);
        eprintln!("quick-translate: {:#}", e);
    }

    tracing::info!("quick-translate exiting");
}
