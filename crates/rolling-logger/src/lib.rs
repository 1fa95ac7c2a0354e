//! Rolling Logger
//!
//! File logger for the taskboard backend. Records emitted through `tracing`
//! or the `log` facade are written to `<app>.log`. Once the file passes the
//! size limit it is rotated to `<app>.log.1`, older backups move up by one
//! and the oldest backup is dropped.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use log::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;

/// Name of the application the global logger was installed for.
static INSTALLED: OnceLock<String> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("failed to prepare log file: {0}")]
    Io(#[from] io::Error),
    #[error("logger already initialized")]
    AlreadyInitialized,
    #[error("logger not initialized")]
    NotInitialized,
}

/// Tuning for the rolling file
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    /// Size in bytes after which the active file is rotated
    pub max_bytes: u64,
    /// Number of rotated files kept next to the active one
    pub backups: usize,
    /// Default level when `RUST_LOG` is not set
    pub level: LevelFilter,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
            backups: 3,
            level: LevelFilter::Info,
        }
    }
}

/// A log file that rotates itself when it grows past `max_bytes`.
pub struct RollingFile {
    dir: PathBuf,
    name: String,
    max_bytes: u64,
    backups: usize,
    file: File,
    written: u64,
}

impl RollingFile {
    pub fn open(dir: &Path, app_name: &str, max_bytes: u64, backups: usize) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let name = format!("{}.log", app_name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(&name))?;
        let written = file.metadata()?.len();

        Ok(Self {
            dir: dir.to_path_buf(),
            name,
            max_bytes,
            backups,
            file,
            written,
        })
    }

    /// Path of the active log file
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}.{}", self.name, index))
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backups == 0 {
            self.file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(self.path())?;
            self.written = 0;
            return Ok(());
        }

        let oldest = self.backup_path(self.backups);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }
        fs::rename(self.path(), self.backup_path(1))?;

        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path())?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // A single record larger than the limit still lands in a fresh file
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Local wall-clock timestamps with millisecond precision
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Install the global logger writing to `<log_dir>/<app_name>.log`
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with(&log_dir, app_name, LoggerOptions::default())
}

/// Install the global logger with explicit options
pub fn init_logger_with(
    log_dir: &Path,
    app_name: &str,
    options: LoggerOptions,
) -> Result<(), LoggerError> {
    if INSTALLED.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let file = RollingFile::open(log_dir, app_name, options.max_bytes, options.backups)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.level.as_str()));

    // The fmt subscriber also installs the `log` bridge
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(LocalTimer)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    let _ = INSTALLED.set(app_name.to_string());
    Ok(())
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    let app = INSTALLED.get().ok_or(LoggerError::NotInitialized)?;
    tracing::info!(app = %app, "{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    let app = INSTALLED.get().ok_or(LoggerError::NotInitialized)?;
    tracing::error!(app = %app, "{}", message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> Vec<u8> {
        format!("line {:04}\n", n).into_bytes()
    }

    #[test]
    fn test_rotates_when_limit_is_reached() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "board", 20, 2).unwrap();

        // Each line is 10 bytes, so every third write rotates
        for n in 0..3 {
            file.write_all(&line(n)).unwrap();
        }
        file.flush().unwrap();

        let active = fs::read_to_string(dir.path().join("board.log")).unwrap();
        let backup = fs::read_to_string(dir.path().join("board.log.1")).unwrap();
        assert_eq!(active, "line 0002\n");
        assert_eq!(backup, "line 0000\nline 0001\n");
    }

    #[test]
    fn test_keeps_bounded_number_of_backups() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "board", 10, 2).unwrap();

        for n in 0..6 {
            file.write_all(&line(n)).unwrap();
        }
        file.flush().unwrap();

        assert!(dir.path().join("board.log.1").exists());
        assert!(dir.path().join("board.log.2").exists());
        assert!(!dir.path().join("board.log.3").exists());
        let oldest = fs::read_to_string(dir.path().join("board.log.2")).unwrap();
        assert_eq!(oldest, "line 0003\n");
    }

    #[test]
    fn test_reopen_continues_size_accounting() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut file = RollingFile::open(dir.path(), "board", 15, 1).unwrap();
            file.write_all(&line(0)).unwrap();
        }
        let mut file = RollingFile::open(dir.path(), "board", 15, 1).unwrap();
        file.write_all(&line(1)).unwrap();
        file.flush().unwrap();

        assert_eq!(fs::read_to_string(file.path()).unwrap(), "line 0001\n");
    }

    #[test]
    fn test_global_logger_lifecycle() {
        assert!(matches!(info("too early"), Err(LoggerError::NotInitialized)));

        let dir = tempfile::tempdir().unwrap();
        init_logger_with(dir.path(), "lifecycle", LoggerOptions::default()).unwrap();
        info("board opened").unwrap();
        log::warn!("bridged record");

        let contents = fs::read_to_string(dir.path().join("lifecycle.log")).unwrap();
        assert!(contents.contains("board opened"));
        assert!(contents.contains("bridged record"));
        assert!(matches!(
            init_logger(dir.path().to_path_buf(), "again"),
            Err(LoggerError::AlreadyInitialized)
        ));
    }
}
