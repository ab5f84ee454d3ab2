//! Last-run marker: a UNIX timestamp persisted in the download directory.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the marker inside the download directory.
pub const LAST_RUN_FILE: &str = "last_run.txt";

#[derive(Debug, Error)]
pub enum LastRunError {
    #[error("Cannot read last-run marker {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write last-run marker {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid last-run marker {path}: '{content}' is not a UNIX timestamp")]
    Parse { path: PathBuf, content: String },
}

pub fn marker_path(dir: &Path) -> PathBuf {
    dir.join(LAST_RUN_FILE)
}

/// Instant stored in `dir`, or the earliest representable instant when no marker exists.
pub fn read_last_run(dir: &Path) -> Result<DateTime<Utc>, LastRunError> {
    let path = marker_path(dir);
    let content = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no last-run marker");
            return Ok(DateTime::<Utc>::MIN_UTC);
        }
        Err(e) => return Err(LastRunError::Read { path, source: e }),
    };
    parse_timestamp(content.trim()).ok_or_else(|| LastRunError::Parse {
        path,
        content: content.trim().to_string(),
    })
}

/// Overwrite the marker in `dir` with the current time. Returns the stored instant.
pub fn write_last_run(dir: &Path) -> Result<DateTime<Utc>, LastRunError> {
    let now = Utc::now();
    write_last_run_at(dir, now)?;
    Ok(now)
}

pub fn write_last_run_at(dir: &Path, instant: DateTime<Utc>) -> Result<(), LastRunError> {
    let path = marker_path(dir);
    std::fs::write(&path, format_timestamp(instant))
        .map_err(|e| LastRunError::Write { path, source: e })
}

/// Seconds since the epoch with microsecond precision, e.g. `1704844800.250000`.
/// Pre-epoch instants keep the sign on the whole value: -0.5s is `-0.500000`.
fn format_timestamp(instant: DateTime<Utc>) -> String {
    let micros = instant.timestamp_micros();
    let sign = if micros < 0 { "-" } else { "" };
    let abs = micros.unsigned_abs();
    format!("{}{}.{:06}", sign, abs / 1_000_000, abs % 1_000_000)
}

/// Parse a decimal UNIX timestamp. Integer and fractional seconds are both accepted.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let secs: f64 = s.parse().ok()?;
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1_000_000_000.0).round() as u32;
    // Rounding can carry a full second.
    let (whole, nanos) = if nanos >= 1_000_000_000 {
        (whole + 1.0, 0)
    } else {
        (whole, nanos)
    };
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp(whole as i64, nanos)
}
