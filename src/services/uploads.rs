use crate::errors::ServiceError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::{
    fs,
    io::{AsyncWrite, AsyncWriteExt},
};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
    pub file_name: String,
    pub size: usize,
}

/// Lowercased extension of an uploaded file name, if it is an accepted image type.
pub fn image_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Stores product and branch images on local disk
#[derive(Clone)]
pub struct UploadService {
    upload_dir: PathBuf,
    max_bytes: usize,
}

impl UploadService {
    pub fn new(upload_dir: PathBuf, max_bytes: usize) -> Self {
        Self {
            upload_dir,
            max_bytes,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Writes the file under a fresh UUID name and returns its public URL.
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn store_image(
        &self,
        original_name: &str,
        content: &[u8],
    ) -> Result<UploadResponse, ServiceError> {
        let ext = image_extension(original_name).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Unsupported file type; allowed: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })?;
        if content.is_empty() {
            return Err(ServiceError::ValidationError("Uploaded file is empty".to_string()));
        }
        if content.len() > self.max_bytes {
            return Err(ServiceError::PayloadTooLarge(format!(
                "File exceeds the {} byte limit",
                self.max_bytes
            )));
        }

        fs::create_dir_all(&self.upload_dir).await.map_err(|e| {
            error!(dir = %self.upload_dir.display(), error = %e, "Cannot create upload directory");
            ServiceError::InternalError("Upload storage unavailable".to_string())
        })?;

        let file_name = format!("{}.{}", Uuid::new_v4(), ext);
        let path = self.upload_dir.join(&file_name);
        let mut file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)
            .await
            .map_err(|e| ServiceError::InternalError(format!("Cannot write upload: {}", e)))?;
        write_or_discard(&mut file, &path, content).await?;

        info!(%file_name, "Image uploaded");
        Ok(UploadResponse {
            url: format!("{}/{}", PUBLIC_PREFIX, file_name),
            file_name,
            size: content.len(),
        })
    }
}

/// Writes `content` to a freshly created file, removing the file again if
/// the write does not complete.
async fn write_or_discard<W>(
    writer: &mut W,
    path: &Path,
    content: &[u8],
) -> Result<(), ServiceError>
where
    W: AsyncWrite + Unpin,
{
    let written = match writer.write_all(content).await {
        Ok(()) => writer.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(path).await {
            warn!(path = %path.display(), error = %cleanup, "Cannot remove partial upload");
        }
        return Err(ServiceError::InternalError(format!("Cannot write upload: {}", e)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn only_images_are_accepted() {
        assert_eq!(image_extension("burger.JPG").as_deref(), Some("jpg"));
        assert_eq!(image_extension("menu.webp").as_deref(), Some("webp"));
        assert_eq!(image_extension("script.sh"), None);
        assert_eq!(image_extension("noext"), None);
    }

    #[tokio::test]
    async fn stores_file_with_uuid_name() {
        let dir = tempfile::tempdir().unwrap();
        let service = UploadService::new(dir.path().join("img"), 1024);

        let response = service.store_image("pizza.png", b"png-bytes").await.unwrap();
        assert!(response.url.starts_with("/uploads/"));
        assert!(response.file_name.ends_with(".png"));
        let stored = std::fs::read(dir.path().join("img").join(&response.file_name)).unwrap();
        assert_eq!(stored, b"png-bytes");
    }

    #[tokio::test]
    async fn rejects_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        let service = UploadService::new(dir.path().to_path_buf(), 4);
        let result = service.store_image("big.gif", b"too large").await;
        assert_matches!(result, Err(ServiceError::PayloadTooLarge(_)));
    }

    struct BrokenDisk;

    impl AsyncWrite for BrokenDisk {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn failed_writes_leave_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.png");
        std::fs::write(&path, b"half").unwrap();

        let result = write_or_discard(&mut BrokenDisk, &path, b"png-bytes").await;
        assert_matches!(result, Err(ServiceError::InternalError(_)));
        assert!(!path.exists());
    }
}
