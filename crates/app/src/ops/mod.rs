pub mod address;
pub mod cleanup;
pub mod init;
pub mod register;
pub mod upload;
pub mod version;
pub mod view;

use std::path::{Path, PathBuf};

use common::crypto::PublicKey;
use common::file::PlainFile;
use common::share::Status;

pub use address::WalletAddress;
pub use cleanup::Cleanup;
pub use init::Init;
pub use register::Register;
pub use upload::Upload;
pub use version::Version;
pub use view::View;

/// Default lifetime of a share
pub const DEFAULT_EXPIRY_DAYS: u32 = 7;

#[derive(Debug, thiserror::Error)]
#[error("failed to read {path}: {source}")]
pub struct ReadError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

/// Read each path into memory, guessing its MIME type from the name
pub async fn read_files(paths: &[PathBuf]) -> Result<Vec<PlainFile>, ReadError> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let data = tokio::fs::read(path).await.map_err(|source| ReadError {
            path: path.clone(),
            source,
        })?;
        files.push(PlainFile::from_path(path, data));
    }
    Ok(files)
}

/// Status lines go to stderr; stdout carries the command's result
pub fn print_status(status: Status) {
    eprintln!("{}", status);
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn parse_wallet(raw: &str) -> Result<PublicKey, String> {
    raw.parse::<PublicKey>()
        .map_err(|e| format!("{}: {}", raw, e))
}

pub fn format_timestamp(unix: i64) -> String {
    chrono::DateTime::from_timestamp(unix, 0)
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| unix.to_string())
}

/// Output path for a decrypted file, keeping only the final name component
pub fn output_path(dir: &Path, name: &str, index: usize) -> PathBuf {
    let name = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("file-{}", index));
    dir.join(name)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_output_path_strips_directories() {
        let dir = Path::new("/tmp/out");
        assert_eq!(output_path(dir, "notes.txt", 0), dir.join("notes.txt"));
        assert_eq!(output_path(dir, "../../etc/passwd", 1), dir.join("passwd"));
        assert_eq!(output_path(dir, "", 2), dir.join("file-2"));
        assert_eq!(output_path(dir, "..", 3), dir.join("file-3"));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn test_read_files() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("data.json");
        tokio::fs::write(&path, b"{}").await.unwrap();

        let files = read_files(&[path]).await.unwrap();
        assert_eq!(files[0].name, "data.json");
        assert_eq!(files[0].mime_type, "application/json");

        let err = read_files(&[temp.path().join("missing")]).await.unwrap_err();
        assert!(err.path.ends_with("missing"));
    }
}
