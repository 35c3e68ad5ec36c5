//! JSON fallback storage for posts that could not be emailed.
//!
//! # Output Structure
//!
//! One pretty-printed file per failed run, named by local creation time:
//! ```text
//! failed_posts/
//! ├── failed_20250506_093015.json
//! └── failed_20250507_093002.json
//! ```
//!
//! Names have second granularity. If a name is already taken, `_1`, `_2`, …
//! is appended rather than overwriting the earlier record.

use crate::error::PersistError;
use crate::models::FailureRecord;
use chrono::{DateTime, Local};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, instrument};

/// File stem for a record created at `now`, e.g. `failed_20250506_093015`.
pub fn failure_file_stem(now: DateTime<Local>) -> String {
    format!("failed_{}", now.format("%Y%m%d_%H%M%S"))
}

/// Write `record` as a new file under `dir`, creating `dir` if needed.
///
/// # Returns
///
/// The path of the file that was written.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn write_failure_record(
    dir: &Path,
    record: &FailureRecord,
    now: DateTime<Local>,
) -> Result<PathBuf, PersistError> {
    if let Err(e) = fs::create_dir_all(dir).await {
        error!(error = %e, "Failed to create fallback directory");
        return Err(e.into());
    }

    let json = serde_json::to_string_pretty(record)?;
    let stem = failure_file_stem(now);

    let mut suffix = 0u32;
    loop {
        let name = if suffix == 0 {
            format!("{stem}.json")
        } else {
            format!("{stem}_{suffix}.json")
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => {
                finish_record(file, &path, json.as_bytes()).await?;
                info!(path = %path.display(), "Wrote failure record");
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "Failure record name taken; trying next suffix");
                suffix += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Write `bytes` to the freshly created file at `path` and flush it.
///
/// If writing or flushing fails, the partial file at `path` is removed so no
/// truncated record is left behind.
///
/// # Arguments
///
/// * `writer` - Handle to the file just created at `path`
/// * `path` - Location of that file, removed on failure
/// * `bytes` - The serialized record
async fn finish_record<W>(mut writer: W, path: &Path, bytes: &[u8]) -> Result<(), PersistError>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(bytes).await?;
        writer.flush().await
    }
    .await;
    drop(writer);

    if let Err(e) = written {
        error!(path = %path.display(), error = %e, "Failed writing failure record; removing partial file");
        if let Err(rm) = fs::remove_file(path).await {
            error!(path = %path.display(), error = %rm, "Could not remove partial failure record");
        }
        return Err(e.into());
    }
    Ok(())
}

/// Read a previously saved record back from disk.
///
/// # Returns
///
/// The parsed [`FailureRecord`], or an error if the file is missing or is
/// not a valid record.
pub async fn read_failure_record(path: &Path) -> Result<FailureRecord, PersistError> {
    let raw = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Accepts nothing; every write fails as if the disk were full.
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::other("No space left on device")))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 5, 6, 9, 30, 15).unwrap()
    }

    fn record() -> FailureRecord {
        FailureRecord {
            timestamp: "2025-05-06 09:30:15.000000".to_string(),
            error: "535 5.7.8 Username and Password not accepted".to_string(),
            content: "Markets fell 2% 📉\n\n\"Stay the course\" - tips:\n1. SIP\n".to_string(),
            subject: "LinkedIn Advisory Post - 06 May 2025".to_string(),
        }
    }

    #[test]
    fn test_failure_file_stem() {
        assert_eq!(failure_file_stem(now()), "failed_20250506_093015");
    }

    #[tokio::test]
    async fn test_write_creates_directory_and_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("failed_posts");

        let path = write_failure_record(&dir, &record(), now()).await.unwrap();
        assert_eq!(path, dir.join("failed_20250506_093015.json"));

        let back = read_failure_record(&path).await.unwrap();
        assert_eq!(back.subject, record().subject);
        assert_eq!(back.content, record().content);
        assert_eq!(back, record());
    }

    #[tokio::test]
    async fn test_written_file_is_pretty_printed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_failure_record(tmp.path(), &record(), now()).await.unwrap();

        let raw = std::fs::read_to_string(path).unwrap();
        assert!(raw.starts_with("{\n  \"timestamp\""));
        assert!(raw.contains("\n  \"subject\": "));
    }

    #[tokio::test]
    async fn test_same_second_does_not_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let first = write_failure_record(tmp.path(), &record(), now()).await.unwrap();
        let second = write_failure_record(tmp.path(), &record(), now()).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(second, tmp.path().join("failed_20250506_093015_1.json"));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_unwritable_directory_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not_a_dir");
        std::fs::write(&blocker, "file").unwrap();

        let err = write_failure_record(&blocker, &record(), now()).await.unwrap_err();
        assert!(matches!(err, PersistError::Io(_)));
    }

    #[tokio::test]
    async fn test_failed_write_removes_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("failed_20250506_093015.json");
        std::fs::write(&path, "{\n  \"timest").unwrap();

        let err = finish_record(FullDisk, &path, b"{}").await.unwrap_err();

        assert!(matches!(err, PersistError::Io(_)));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_finish_record_keeps_complete_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("failed_20250506_093015.json");
        let file = fs::File::create(&path).await.unwrap();

        finish_record(file, &path, b"{\"ok\": true}").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"ok\": true}");
    }
}
