use anyhow::{Context, Result};
use log::LevelFilter;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

use crate::config::ConfigManager;

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Initialize the logging system
///
/// With `debug` set, everything down to `Debug` goes to stderr. Otherwise the
/// console stays quiet and all records are appended to the log file in the
/// config directory, because the user is talked to through notifications.
///
/// The level can be overridden with `RUST_LOG`:
///
/// ```bash
/// # Only warnings and errors in the log file
/// RUST_LOG=warn milestones show report.docx
///
/// # Trace everything to the terminal
/// RUST_LOG=trace milestones --debug show report.docx
/// ```
pub fn init_logger(debug: bool) -> Result<()> {
    ConfigManager::ensure_config_dir()?;

    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Debug);

    let target = if debug {
        env_logger::Target::Stderr
    } else {
        let log_path = ConfigManager::log_file_path()?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;
        env_logger::Target::Pipe(Box::new(file))
    };

    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:5}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .target(target)
        .try_init()
        .ok(); // Ignore error if logger is already initialized

    log::debug!("Logger initialized with level: {level:?}");

    Ok(())
}

/// Rotate log file if it exceeds the size limit (10MB)
pub fn rotate_log_if_needed() -> Result<()> {
    let log_path = ConfigManager::log_file_path()?;

    if log_path.exists() {
        let metadata = fs::metadata(&log_path)?;

        if metadata.len() > MAX_LOG_SIZE {
            let old_log_path = log_path.with_extension("log.old");

            if old_log_path.exists() {
                fs::remove_file(&old_log_path)?;
            }

            fs::rename(&log_path, &old_log_path)?;
        }
    }

    Ok(())
}

/// Read at most `max_bytes` from the end of the log file
///
/// Returns an empty string when there is no log yet.
pub fn read_log_tail(max_bytes: u64) -> Result<String> {
    let log_path = ConfigManager::log_file_path()?;

    let mut file = match fs::File::open(&log_path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(String::new()),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to open log file: {}", log_path.display()))
        }
    };

    let len = file.metadata()?.len();
    if len > max_bytes {
        file.seek(SeekFrom::Start(len - max_bytes))?;
    }

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
