use std::io;
use std::path::Path;

use tokio::io::AsyncWriteExt;

pub mod record;

/// Filesystem operations the record store needs. Kept thin so the store can run
/// against something other than the local disk.
#[allow(async_fn_in_trait)]
pub trait Storage {
    async fn ensure_directory(&self, path: &Path) -> io::Result<()>;

    /// Names of the regular files directly inside `path`.
    async fn list_files(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Writes a new file. Fails with [`io::ErrorKind::AlreadyExists`] rather than
    /// replacing one that is already there.
    async fn write_text(&self, path: &Path, content: &str) -> io::Result<()>;

    async fn read_text(&self, path: &Path) -> io::Result<String>;

    async fn exists(&self, path: &Path) -> bool;
}

/// [`Storage`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStorage;

impl Storage for FileStorage {
    async fn ensure_directory(&self, path: &Path) -> io::Result<()> {
        if tokio::fs::metadata(path).await.is_ok_and(|meta| meta.is_dir()) {
            log::debug!("Folder at {} already exists", path.display());
            return Ok(());
        }
        tokio::fs::create_dir_all(path).await?;
        log::info!("Created folder {}", path.display());
        Ok(())
    }

    async fn list_files(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_owned());
            }
        }
        Ok(names)
    }

    async fn write_text(&self, path: &Path, content: &str) -> io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await
    }

    async fn read_text(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}
