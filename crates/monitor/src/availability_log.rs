//! Append-only CSV availability log.
//!
//! One row per probe result. The file is created with a fixed header the
//! first time it is opened and is never truncated afterwards; each row is
//! written with a single append.
//!
//! Row timestamps are UTC wall-clock time, not local time.

use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use sitewatch_core::probe::ProbeResult;
use sitewatch_core::types::{format_timestamp, Timestamp};

/// Header row written when the log is created. The `timestamp` column is UTC.
pub const LOG_HEADER: &str = "timestamp,site,status,elapsed_ms,detail";

/// Error type for availability log failures.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Availability log I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to the availability log file.
#[derive(Debug, Clone)]
pub struct AvailabilityLog {
    path: PathBuf,
}

impl AvailabilityLog {
    /// Open the log at `path`, creating it with the header if it is missing.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let log = Self { path: path.into() };
        log.init().await?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with its header row. Existing files are left alone.
    pub async fn init(&self) -> Result<(), LogError> {
        let created = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await;

        match created {
            Ok(mut file) => {
                let header = format!("{LOG_HEADER}\n");
                file.write_all(header.as_bytes())
                    .await
                    .map_err(|e| self.io_error(e))?;
                file.flush().await.map_err(|e| self.io_error(e))?;
                tracing::info!(path = %self.path.display(), "Availability log created");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Append one probe result taken during the cycle started at `timestamp`.
    ///
    /// If the file disappeared since it was opened it is recreated with its
    /// header before the row is written.
    pub async fn append(&self, timestamp: &Timestamp, result: &ProbeResult) -> Result<(), LogError> {
        let row = format_row(timestamp, result);

        let mut file = match OpenOptions::new().append(true).open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "Availability log missing, recreating");
                self.init().await?;
                OpenOptions::new()
                    .append(true)
                    .open(&self.path)
                    .await
                    .map_err(|e| self.io_error(e))?
            }
            Err(e) => return Err(self.io_error(e)),
        };

        file.write_all(row.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> LogError {
        LogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Render one CSV row, including the trailing newline.
pub fn format_row(timestamp: &Timestamp, result: &ProbeResult) -> String {
    format!(
        "{},{},{},{},{}\n",
        format_timestamp(timestamp),
        escape_field(&result.endpoint),
        result.signal,
        result.elapsed_ms,
        escape_field(&result.detail),
    )
}

/// Quote a field if it contains a separator, quote, or line break.
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;
    use sitewatch_core::probe::ProbeOutcome;

    use super::*;

    fn ts() -> Timestamp {
        chrono::Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .unwrap()
    }

    fn result(outcome: ProbeOutcome, elapsed_ms: u64) -> ProbeResult {
        ProbeResult::classify(
            "https://a.test",
            outcome,
            Duration::from_millis(elapsed_ms),
            Duration::from_secs(30),
        )
    }

    #[test]
    fn green_row_format() {
        let row = format_row(&ts(), &result(ProbeOutcome::Response { status_code: 200 }, 120));
        assert_eq!(row, "2024-05-01 12:00:00,https://a.test,green,120,OK\n");
    }

    #[test]
    fn timeout_row_format() {
        let row = format_row(&ts(), &result(ProbeOutcome::TimedOut, 31_000));
        assert_eq!(row, "2024-05-01 12:00:00,https://a.test,yellow,30000,TIMEOUT\n");
    }

    #[test]
    fn detail_with_separator_is_quoted() {
        let r = result(
            ProbeOutcome::Failed {
                reason: "error sending request, \"refused\"".to_string(),
            },
            5,
        );
        let row = format_row(&ts(), &r);
        assert_eq!(
            row,
            "2024-05-01 12:00:00,https://a.test,red,5,\"error sending request, \"\"refused\"\"\"\n"
        );
    }

    #[test]
    fn row_timestamp_is_utc_wall_clock() {
        let local = chrono::FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 14, 0, 0)
            .single()
            .unwrap();
        let row = format_row(
            &local.with_timezone(&chrono::Utc),
            &result(ProbeOutcome::Response { status_code: 200 }, 120),
        );
        assert!(row.starts_with("2024-05-01 12:00:00,"));
    }

    #[test]
    fn plain_field_is_borrowed() {
        assert!(matches!(escape_field("OK"), Cow::Borrowed("OK")));
    }

    #[tokio::test]
    async fn open_creates_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("availability.csv");

        let log = AvailabilityLog::open(&path).await.unwrap();
        log.append(&ts(), &result(ProbeOutcome::Response { status_code: 200 }, 1))
            .await
            .unwrap();

        // Re-initialising an existing log must not touch it.
        AvailabilityLog::open(&path).await.unwrap();
        log.init().await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(
            contents,
            "timestamp,site,status,elapsed_ms,detail\n2024-05-01 12:00:00,https://a.test,green,1,OK\n"
        );
    }

    #[tokio::test]
    async fn existing_content_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("availability.csv");
        tokio::fs::write(&path, "timestamp,site,status,elapsed_ms,detail\nold,row,red,1,x\n")
            .await
            .unwrap();

        let log = AvailabilityLog::open(&path).await.unwrap();
        log.append(&ts(), &result(ProbeOutcome::Response { status_code: 503 }, 9))
            .await
            .unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "old,row,red,1,x");
        assert_eq!(lines[2], "2024-05-01 12:00:00,https://a.test,red,9,HTTP 503");
    }

    #[tokio::test]
    async fn deleted_log_is_recreated_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("availability.csv");
        let log = AvailabilityLog::open(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        log.append(&ts(), &result(ProbeOutcome::TimedOut, 0))
            .await
            .unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(contents.starts_with(LOG_HEADER));
        assert_eq!(contents.lines().count(), 2);
    }

    #[tokio::test]
    async fn unwritable_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("availability.csv");
        let err = AvailabilityLog::open(&path).await.unwrap_err();
        assert!(err.to_string().contains("missing-dir"));
    }
}
