//! Console logging with optional rotating log files.

use std::fs;
use std::io;
use std::path::Path;

use chrono::Local;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_NAME: &str = "chanmap.log";

/// Initialize logging.
///
/// # Arguments
/// * `level` - Default filter when `RUST_LOG` is not set
/// * `log_dir` - Also write daily rotated log files here if set
/// * `retention_days` - Number of days to keep log files
pub fn init_logging(
    level: &str,
    log_dir: Option<&Path>,
    retention_days: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_level(true)
        .with_timer(LocalTimeTimer);

    let file = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            clean_old_logs(dir, retention_days)?;

            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            // keep the writer alive for the program lifetime
            let _ = Box::leak(Box::new(guard));

            Some(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false)
                    .with_timer(LocalTimeTimer),
            )
        }
        None => None,
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to set default subscriber: {}", e))?;

    // chanmap-core logs through the `log` facade
    tracing_log::LogTracer::init().map_err(|e| format!("Failed to initialize LogTracer: {}", e))?;

    Ok(())
}

/// Remove log files older than `retention_days`.
fn clean_old_logs(log_dir: &Path, retention_days: u64) -> io::Result<()> {
    let cutoff = Local::now() - chrono::Duration::days(retention_days as i64);

    for entry in fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(LOG_FILE_NAME))
            .unwrap_or(false);
        if !is_log || !path.is_file() {
            continue;
        }

        let modified: chrono::DateTime<Local> = match entry.metadata().and_then(|m| m.modified()) {
            Ok(t) => t.into(),
            Err(_) => continue,
        };
        if modified < cutoff {
            if let Err(e) = fs::remove_file(&path) {
                eprintln!("Failed to remove old log file {:?}: {}", path, e);
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct LocalTimeTimer;

impl fmt::time::FormatTime for LocalTimeTimer {
    fn format_time(&self, w: &mut fmt::format::Writer) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_old_logs_keeps_recent_and_foreign_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let recent = tmp.path().join("chanmap.log.2026-10-19");
        let other = tmp.path().join("notes.txt");
        fs::write(&recent, b"x").unwrap();
        fs::write(&other, b"y").unwrap();

        clean_old_logs(tmp.path(), 7).unwrap();
        assert!(recent.exists());
        assert!(other.exists());

        // zero retention drops everything with the log prefix
        std::thread::sleep(std::time::Duration::from_millis(20));
        clean_old_logs(tmp.path(), 0).unwrap();
        assert!(!recent.exists());
        assert!(other.exists());
    }
}
