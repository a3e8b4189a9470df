//! Update package storage.
//!
//! Files are written under the configured upload directory as
//! `<uuid>_<sanitized original name>`; the database stores that relative name.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Longest kept portion of an uploaded file name.
const MAX_NAME_LENGTH: usize = 100;

/// Local directory holding uploaded update files.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write `bytes` under a fresh unique name and return that name.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory or file cannot be written.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> io::Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let name = format!("{}_{}", Uuid::new_v4().simple(), sanitize_file_name(original_name));
        tokio::fs::write(self.dir.join(&name), bytes).await?;
        tracing::info!(file = %name, size = bytes.len(), "Update file saved");
        Ok(name)
    }

    /// Remove a stored file. A file that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns any other I/O error.
    pub async fn remove(&self, name: &str) -> io::Result<()> {
        // Names come from the database, but never follow one out of the directory.
        let Some(file_name) = Path::new(name).file_name() else {
            return Ok(());
        };
        match tokio::fs::remove_file(self.dir.join(file_name)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// The final path component of an uploaded name, limited to ASCII letters,
/// digits, `.`, `-` and `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LENGTH)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("patch-1.2.zip"), "patch-1.2.zip");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(r"C:\tmp\release notes.pdf"), "release_notes.pdf");
        assert_eq!(sanitize_file_name(".."), "upload");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = std::env::temp_dir().join(format!("metra-uploads-{}", Uuid::new_v4()));
        let store = UploadStore::new(&dir);

        let name = store.save("firmware.bin", b"\x00\x01").await.unwrap();
        assert!(name.ends_with("_firmware.bin"));
        assert_eq!(tokio::fs::read(dir.join(&name)).await.unwrap(), b"\x00\x01");

        store.remove(&name).await.unwrap();
        assert!(!dir.join(&name).exists());
        // Removing twice is fine.
        store.remove(&name).await.unwrap();

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
