use std::io;
use std::io::Write;
use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Create `log_dir` and its parents if missing
pub fn ensure_log_dir<P: AsRef<Path>>(log_dir: P) -> io::Result<()> {
    std::fs::create_dir_all(log_dir)
}

/// Hourly rolling file under `log_dir`, or a sink when it cannot be opened
///
/// The subscriber is not up yet, so failures can only be reported on stderr.
fn file_writer(app_name: &str, log_dir: &str) -> Box<dyn Write + Send> {
    if let Err(err) = ensure_log_dir(log_dir) {
        eprintln!("failed to create log directory {log_dir}: {err}; file logging disabled");
        return Box::new(io::sink());
    }

    match RollingFileAppender::builder().rotation(Rotation::HOURLY).filename_prefix(format!("{app_name}.log")).build(log_dir) {
        Ok(appender) => Box::new(appender),
        Err(err) => {
            eprintln!("failed to open log file in {log_dir}: {err}; file logging disabled");
            Box::new(io::sink())
        }
    }
}

/// Initialise tracing with a non-blocking hourly file appender, optionally mirrored to stderr
///
/// Respects `RUST_LOG`, falling back to `default_level`. Keep the returned guard
/// alive for the whole process or buffered lines are lost on exit.
pub fn init(app_name: &str, log_dir: &str, default_level: Level, console: bool) -> WorkerGuard {
    let (non_blocking, guard) = tracing_appender::non_blocking(file_writer(app_name, log_dir));

    let env_filter = EnvFilter::builder().with_default_directive(default_level.into()).from_env_lossy();

    let file_layer = fmt::layer().with_writer(non_blocking).with_target(true).with_thread_ids(true).with_line_number(true).with_ansi(false).compact();

    // stderr keeps stdout free for command output
    let console_layer = console.then(|| fmt::layer().with_writer(io::stderr).with_target(false).with_ansi(true).compact());

    tracing_subscriber::registry().with(env_filter).with(file_layer).with(console_layer).init();

    guard
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("flowstop_logs_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_ensure_log_dir_creates_nested_dirs() {
        let root = scratch("nested");
        let dir = root.join("a").join("b");

        ensure_log_dir(&dir).unwrap();
        assert!(dir.is_dir());

        // existing directory is fine
        ensure_log_dir(&dir).unwrap();
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_ensure_log_dir_reports_failure() {
        let file = scratch("blocker");
        std::fs::write(&file, "not a directory").unwrap();

        let result = ensure_log_dir(file.join("logs"));
        std::fs::remove_file(&file).unwrap();

        assert!(result.is_err());
    }

    #[test]
    fn test_file_writer_falls_back_to_sink() {
        let file = scratch("writer_blocker");
        std::fs::write(&file, "not a directory").unwrap();
        let log_dir = file.join("logs");

        let mut writer = file_writer("flowstop", log_dir.to_str().unwrap());
        writer.write_all(b"dropped\n").unwrap();
        writer.flush().unwrap();
        std::fs::remove_file(&file).unwrap();

        assert!(!log_dir.exists());
    }

    #[test]
    fn test_file_writer_opens_log_in_new_dir() {
        let root = scratch("writer_ok");
        let log_dir = root.join("logs");

        let mut writer = file_writer("flowstop", log_dir.to_str().unwrap());
        writer.write_all(b"kept\n").unwrap();
        writer.flush().unwrap();
        drop(writer);

        let files: Vec<_> = std::fs::read_dir(&log_dir).unwrap().map(|entry| entry.unwrap().file_name()).collect();
        std::fs::remove_dir_all(&root).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].to_string_lossy().starts_with("flowstop.log"));
    }
}
