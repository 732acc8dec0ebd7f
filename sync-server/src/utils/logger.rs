//! Logging setup
//!
//! Console output plus an optional daily-rotated file under the log
//! directory. Rotated files fall out of a retention window and are removed
//! by a background task; there is one log family, no audit split.

use std::fs;
use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Rotated files older than this are deleted
const LOG_RETENTION_DAYS: i64 = 14;

/// Daily rotation names files `sync.YYYY-MM-DD`
const LOG_FILE_PREFIX: &str = "sync";

/// Initialize console-only logging
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    init_logger_with_file(level, json_format, None)
}

/// Initialize logging with an optional daily-rotated file sink
///
/// `RUST_LOG` overrides `level` when set. With `json_format` both sinks emit
/// machine-readable lines; otherwise the console stays human-oriented and
/// the file only drops ANSI colors.
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = if json_format {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .boxed()
    };

    let file = match log_dir {
        Some(dir) => {
            let dir = Path::new(dir);
            fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(std::sync::Mutex::new(appender));
            let layer = if json_format {
                layer.json().boxed()
            } else {
                layer.boxed()
            };

            tokio::spawn(retention_task(dir.to_path_buf()));
            Some(layer)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();

    Ok(())
}

/// Delete rotated log files that left the retention window
///
/// Files are matched by the `sync.YYYY-MM-DD` rotation naming; anything
/// else in the directory is left alone.
pub fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<()> {
    let cutoff = chrono::Utc::now().date_naive() - chrono::Duration::days(LOG_RETENTION_DAYS);
    let prefix = format!("{LOG_FILE_PREFIX}.");

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(date_part) = name.strip_prefix(&prefix) else {
            continue;
        };
        if let Ok(date) = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            && date < cutoff
        {
            fs::remove_file(&path)?;
            tracing::info!(file = %name, "Deleted rotated log file");
        }
    }

    Ok(())
}

/// Daily cleanup loop for the file sink
async fn retention_task(log_dir: PathBuf) {
    loop {
        if let Err(e) = cleanup_old_logs(&log_dir) {
            tracing::warn!("Log cleanup failed: {e}");
        }
        tokio::time::sleep(std::time::Duration::from_secs(24 * 3600)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_respects_retention_and_naming() {
        let dir = tempfile::tempdir().unwrap();
        let today = chrono::Utc::now().date_naive();

        let stale = dir.path().join("sync.2020-01-01");
        let fresh = dir.path().join(format!("sync.{today}"));
        let unrelated = dir.path().join("notes.txt");
        for path in [&stale, &fresh, &unrelated] {
            fs::write(path, b"x").unwrap();
        }

        cleanup_old_logs(dir.path()).unwrap();

        assert!(!stale.exists());
        assert!(fresh.exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn test_cleanup_ignores_undated_files() {
        let dir = tempfile::tempdir().unwrap();
        let odd = dir.path().join("sync.current");
        fs::write(&odd, b"x").unwrap();

        cleanup_old_logs(dir.path()).unwrap();
        assert!(odd.exists());
    }
}
