//! Upload storage on the local filesystem.
//!
//! Layout under the configured root:
//!
//! - `board/{uuid}_{original}` - board attachments, served by `/api/board/file/*`
//! - `product/{uuid}.{ext}` - item images, served statically at `/product/*`
//! - `banner/{uuid}.{ext}` - banner images, served statically at `/banner/*`

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use thiserror::Error;
use uuid::Uuid;

use crate::config::UploadConfig;

/// Extensions accepted for board attachments.
const BOARD_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt",
    "zip",
];

/// Extensions accepted for item and banner images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Errors from storing or reading uploaded files.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file exceeds the {max} byte limit")]
    TooLarge { max: u64 },

    #[error("file type .{0} is not allowed")]
    DisallowedExtension(String),

    #[error("uploaded file has no name")]
    MissingFilename,

    #[error("file not found")]
    NotFound,

    #[error("file storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file part received from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Metadata of a stored board attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub origin_filename: String,
    pub save_filename: String,
    pub file_size: i64,
    pub file_ext: String,
}

/// Publicly served image directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageDir {
    Product,
    Banner,
}

impl ImageDir {
    const fn name(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Banner => "banner",
        }
    }
}

/// Filesystem-backed upload store.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_file_bytes: u64,
}

impl UploadStore {
    /// Create a store rooted at the configured upload directory.
    #[must_use]
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            root: config.dir.clone(),
            max_file_bytes: config.max_file_bytes,
        }
    }

    /// Directory served statically for an image kind.
    #[must_use]
    pub fn image_dir(&self, dir: ImageDir) -> PathBuf {
        self.root.join(dir.name())
    }

    /// Absolute path of a stored board attachment.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::NotFound` if the stored name tries to leave the board directory.
    pub fn board_file_path(&self, save_filename: &str) -> Result<PathBuf, UploadError> {
        if save_filename.contains(['/', '\\']) || save_filename.starts_with('.') {
            return Err(UploadError::NotFound);
        }
        Ok(self.root.join("board").join(save_filename))
    }

    /// Validate and store a board attachment.
    ///
    /// # Errors
    ///
    /// Returns `UploadError` if the file is too large, has a disallowed
    /// extension or cannot be written.
    pub async fn save_board_file(&self, file: &UploadedFile) -> Result<StoredFile, UploadError> {
        let origin_filename = base_name(&file.file_name);
        if origin_filename.is_empty() {
            return Err(UploadError::MissingFilename);
        }
        let file_ext = allowed_extension(origin_filename, BOARD_EXTENSIONS)?;
        self.check_size(&file.bytes)?;

        let save_filename = format!("{}_{}", Uuid::new_v4(), sanitize_filename(origin_filename));
        let dir = self.root.join("board");
        write_file(&dir, &save_filename, &file.bytes).await?;

        Ok(StoredFile {
            origin_filename: origin_filename.to_owned(),
            save_filename,
            file_size: i64::try_from(file.bytes.len()).unwrap_or(i64::MAX),
            file_ext,
        })
    }

    /// Validate and store an item or banner image, returning its public URL.
    ///
    /// # Errors
    ///
    /// Returns `UploadError` if the file is too large, is not an image or
    /// cannot be written.
    pub async fn save_image(
        &self,
        dir: ImageDir,
        file: &UploadedFile,
    ) -> Result<String, UploadError> {
        let name = base_name(&file.file_name);
        if name.is_empty() {
            return Err(UploadError::MissingFilename);
        }
        let ext = allowed_extension(name, IMAGE_EXTENSIONS)?;
        self.check_size(&file.bytes)?;

        let save_filename = format!("{}.{ext}", Uuid::new_v4());
        write_file(&self.image_dir(dir), &save_filename, &file.bytes).await?;

        Ok(format!("/{}/{save_filename}", dir.name()))
    }

    /// Remove a board attachment. Missing files are ignored.
    pub async fn remove_board_file(&self, save_filename: &str) {
        if let Ok(path) = self.board_file_path(save_filename) {
            remove_quietly(&path).await;
        }
    }

    /// Remove an image previously returned by [`Self::save_image`]. Unknown
    /// URLs and missing files are ignored.
    pub async fn remove_image(&self, url: &str) {
        for dir in [ImageDir::Product, ImageDir::Banner] {
            let prefix = format!("/{}/", dir.name());
            if let Some(file) = url.strip_prefix(&prefix)
                && !file.is_empty()
                && !file.contains(['/', '\\'])
            {
                remove_quietly(&self.image_dir(dir).join(file)).await;
                return;
            }
        }
    }

    fn check_size(&self, bytes: &Bytes) -> Result<(), UploadError> {
        let len = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        if len > self.max_file_bytes {
            return Err(UploadError::TooLarge {
                max: self.max_file_bytes,
            });
        }
        Ok(())
    }
}

/// Whether a file extension denotes an inline-displayable image.
#[must_use]
pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

/// Strip any client-supplied directory components.
fn base_name(file_name: &str) -> &str {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
}

/// Lowercased extension, if it is in `allowed`.
fn allowed_extension(file_name: &str, allowed: &[&str]) -> Result<String, UploadError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if allowed.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(UploadError::DisallowedExtension(ext))
    }
}

/// Replace anything outside letters, digits, `.`, `-` and `_` with `_`.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

async fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> Result<(), UploadError> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(name), bytes).await?;
    Ok(())
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove uploaded file");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store(root: &Path, max: u64) -> UploadStore {
        UploadStore::new(&UploadConfig {
            dir: root.to_path_buf(),
            max_file_bytes: max,
        })
    }

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("modish-upload-test-{}", Uuid::new_v4()))
    }

    fn file(name: &str, body: &'static [u8]) -> UploadedFile {
        UploadedFile {
            file_name: name.to_owned(),
            content_type: None,
            bytes: Bytes::from_static(body),
        }
    }

    #[test]
    fn test_base_name_strips_directories() {
        assert_eq!(base_name("../../etc/passwd"), "passwd");
        assert_eq!(base_name("C:\\Users\\me\\photo.png"), "photo.png");
    }

    #[test]
    fn test_allowed_extension_is_case_insensitive() {
        assert_eq!(allowed_extension("A.PNG", IMAGE_EXTENSIONS).unwrap(), "png");
        assert!(matches!(
            allowed_extension("run.exe", BOARD_EXTENSIONS),
            Err(UploadError::DisallowedExtension(ext)) if ext == "exe"
        ));
        assert!(allowed_extension("noext", BOARD_EXTENSIONS).is_err());
    }

    #[test]
    fn test_sanitize_filename_keeps_unicode_letters() {
        assert_eq!(sanitize_filename("my report (1).pdf"), "my_report__1_.pdf");
        assert_eq!(sanitize_filename("공지.txt"), "공지.txt");
    }

    #[test]
    fn test_board_file_path_rejects_traversal() {
        let store = store(Path::new("/tmp/uploads"), 10);
        assert!(store.board_file_path("../secret").is_err());
        assert!(store.board_file_path(".hidden").is_err());
        assert_eq!(
            store.board_file_path("abc_file.txt").unwrap(),
            PathBuf::from("/tmp/uploads/board/abc_file.txt")
        );
    }

    #[tokio::test]
    async fn test_save_board_file_and_remove() {
        let root = temp_root();
        let store = store(&root, 1024);

        let stored = store
            .save_board_file(&file("notes.TXT", b"hello"))
            .await
            .unwrap();
        assert_eq!(stored.origin_filename, "notes.TXT");
        assert_eq!(stored.file_ext, "txt");
        assert_eq!(stored.file_size, 5);
        assert!(stored.save_filename.ends_with("_notes.TXT"));

        let path = store.board_file_path(&stored.save_filename).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"hello");

        store.remove_board_file(&stored.save_filename).await;
        assert!(!path.exists());

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_save_board_file_rejects_large_files() {
        let store = store(&temp_root(), 3);
        let result = store.save_board_file(&file("big.txt", b"four")).await;
        assert!(matches!(result, Err(UploadError::TooLarge { max: 3 })));
    }

    #[tokio::test]
    async fn test_save_image_returns_public_url() {
        let root = temp_root();
        let store = store(&root, 1024);

        let url = store
            .save_image(ImageDir::Banner, &file("hero.jpg", b"jpeg"))
            .await
            .unwrap();
        assert!(url.starts_with("/banner/"));
        assert!(url.ends_with(".jpg"));

        store.remove_image(&url).await;
        let name = url.trim_start_matches("/banner/");
        assert!(!store.image_dir(ImageDir::Banner).join(name).exists());

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_save_image_rejects_documents() {
        let store = store(&temp_root(), 1024);
        let result = store
            .save_image(ImageDir::Product, &file("manual.pdf", b"pdf"))
            .await;
        assert!(matches!(result, Err(UploadError::DisallowedExtension(_))));
    }
}
