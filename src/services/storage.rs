use crate::config::StorageConfig;
use crate::error::Error;
use anyhow::Result;
use log::{info, warn};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

const STAGING_DIR: &str = "staging";

/// What a stored file is for. Each kind has its own directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Image,
    QrCode,
}

impl ImageKind {
    /// Directory name under the storage root, also the public URL prefix
    pub fn dir_name(&self) -> &'static str {
        match self {
            ImageKind::Image => "images",
            ImageKind::QrCode => "qr_codes",
        }
    }

    fn purpose(&self) -> &'static str {
        match self {
            ImageKind::Image => "image",
            ImageKind::QrCode => "qr",
        }
    }
}

/// File extension for an accepted upload MIME type
pub fn extension_for_mime(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Image storage rooted at one directory:
/// `{root}/{kind}/{ownerKey}/{itemId}-{purpose}.{ext}`.
///
/// The database keeps the path below the kind directory. New files are written
/// to `{root}/staging` first and renamed into place once the row that
/// references them is written.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    max_upload_bytes: usize,
    generate_qr_labels: bool,
}

impl ImageStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.root.clone(),
            max_upload_bytes: config.max_upload_bytes,
            generate_qr_labels: config.generate_qr_labels,
        }
    }

    /// Create the kind and staging directories
    pub async fn ensure_layout(&self) -> Result<()> {
        for dir in [
            self.kind_dir(ImageKind::Image),
            self.kind_dir(ImageKind::QrCode),
            self.root.join(STAGING_DIR),
        ] {
            if tokio::fs::metadata(&dir).await.is_err() {
                tokio::fs::create_dir_all(&dir).await?;
                info!("Created storage folder {}", dir.display());
            }
        }
        Ok(())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn generate_qr_labels(&self) -> bool {
        self.generate_qr_labels
    }

    pub fn kind_dir(&self, kind: ImageKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Stored reference for an item's file
    pub fn reference(&self, owner: &str, item_id: i32, kind: ImageKind, extension: &str) -> Result<String> {
        check_segment(owner)?;
        check_segment(extension)?;
        Ok(format!("{}/{}-{}.{}", owner, item_id, kind.purpose(), extension))
    }

    /// Public URL a stored reference is served under
    pub fn public_url(&self, kind: ImageKind, reference: &str) -> String {
        format!("/{}/{}", kind.dir_name(), reference)
    }

    /// Absolute path of a stored reference
    pub fn resolve(&self, kind: ImageKind, reference: &str) -> Result<PathBuf> {
        let relative = Path::new(reference);
        let plain = !reference.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(Error::Validation(format!("Invalid file reference: {}", reference)).into());
        }
        Ok(self.kind_dir(kind).join(relative))
    }

    /// Write bytes to a new staging file
    pub async fn stage(&self, bytes: &[u8], extension: &str) -> Result<StagedFile> {
        check_segment(extension)?;
        let path = self
            .root
            .join(STAGING_DIR)
            .join(format!("{}.{}", Uuid::new_v4(), extension));
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        Ok(StagedFile {
            path,
            extension: extension.to_string(),
        })
    }

    /// Move a staged file to its canonical location, replacing any file there
    pub async fn finalize(&self, mut staged: StagedFile, kind: ImageKind, reference: &str) -> Result<PathBuf> {
        let target = self.resolve(kind, reference)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&staged.path, &target).await?;
        staged.path = PathBuf::new();

        Ok(target)
    }

    /// Delete a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, kind: ImageKind, reference: &str) -> Result<bool> {
        let path = self.resolve(kind, reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted {} file {}", kind.dir_name(), path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io(format!("Failed to delete {}: {}", path.display(), e)).into()),
        }
    }

    /// Delete a finalized file path, logging instead of failing
    pub async fn discard(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to discard {}: {}", path.display(), e);
            }
        }
    }

    /// Remove the owner's directory of this kind when nothing is left in it
    pub async fn remove_owner_dir_if_empty(&self, kind: ImageKind, owner: &str) -> Result<bool> {
        check_segment(owner)?;
        let dir = self.kind_dir(kind).join(owner);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(Error::Io(e.to_string()).into()),
        };
        if entries.next_entry().await?.is_some() {
            return Ok(false);
        }

        match tokio::fs::remove_dir(&dir).await {
            Ok(()) => {
                info!("Removed empty folder {}", dir.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io(e.to_string()).into()),
        }
    }
}

/// Upload written to the staging area. Dropping it without finalizing
/// deletes the file with a blocking call; staged files never exceed the
/// upload size limit or one rendered label.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    extension: String,
}

impl StagedFile {
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.path.as_os_str().is_empty() {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove staged upload {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Owner keys and extensions become path segments; keep them to one segment
fn check_segment(segment: &str) -> Result<()> {
    let ok = !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0']);
    if !ok {
        return Err(Error::Validation(format!("Invalid path segment: {:?}", segment)).into());
    }
    Ok(())
}
