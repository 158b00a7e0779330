use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// Logs go to `log_file` when given (the full-screen dashboard owns the
/// terminal), otherwise to stderr so stdout stays clean for command output.
pub fn init_logging(json: bool, log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sentinel=info"));
    let writer = log_file.and_then(open_log_file).unwrap_or_else(|| BoxMakeWriter::new(std::io::stderr));
    let to_file = log_file.is_some();

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_writer(writer),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(!to_file)
                    .with_writer(writer),
            )
            .init();
    }
}

fn open_log_file(path: &Path) -> Option<BoxMakeWriter> {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("sentinel: failed to create log directory {}: {}", parent.display(), e);
            return None;
        }
    }

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(BoxMakeWriter::new(Mutex::new(file))),
        Err(e) => {
            eprintln!("sentinel: failed to open log file {}: {}", path.display(), e);
            None
        }
    }
}
