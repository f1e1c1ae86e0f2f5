use crate::error::{AppError, AppResult};
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

#[derive(Clone)]
pub struct UploadConfig {
    pub upload_dir: String,
}

const MAX_FILE_SIZE: usize = 10 * 1024 * 1024; // 10 MB
pub const MAX_FILES_PER_POST: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Content types accepted for post media, with their file extensions.
fn lookup(content_type: &str) -> Option<(MediaKind, &'static str)> {
    match content_type {
        "image/jpeg" => Some((MediaKind::Image, "jpg")),
        "image/png" => Some((MediaKind::Image, "png")),
        "image/gif" => Some((MediaKind::Image, "gif")),
        "image/webp" => Some((MediaKind::Image, "webp")),
        "video/mp4" => Some((MediaKind::Video, "mp4")),
        "video/webm" => Some((MediaKind::Video, "webm")),
        _ => None,
    }
}

/// Validate file magic bytes match the declared content type.
fn validate_magic_bytes(data: &[u8], content_type: &str) -> bool {
    match content_type {
        "image/jpeg" => data.len() >= 3 && data[..3] == [0xFF, 0xD8, 0xFF],
        "image/png" => data.len() >= 4 && data[..4] == [0x89, 0x50, 0x4E, 0x47],
        "image/gif" => data.len() >= 4 && data[..4] == [0x47, 0x49, 0x46, 0x38],
        "image/webp" => {
            data.len() >= 12
                && data[..4] == [0x52, 0x49, 0x46, 0x46]
                && data[8..12] == [0x57, 0x45, 0x42, 0x50]
        }
        // MP4: "ftyp" brand at offset 4
        "video/mp4" => data.len() >= 8 && data[4..8] == [0x66, 0x74, 0x79, 0x70],
        // WebM: EBML header
        "video/webm" => data.len() >= 4 && data[..4] == [0x1A, 0x45, 0xDF, 0xA3],
        _ => false,
    }
}

pub struct UploadService;

impl UploadService {
    /// Save an uploaded media file to disk.
    /// Returns the media kind and public URL path (e.g. `/uploads/posts/uuid.jpg`).
    pub async fn save_media(
        config: &UploadConfig,
        data: &[u8],
        content_type: &str,
        subdirectory: &str,
    ) -> AppResult<(MediaKind, String)> {
        if data.len() > MAX_FILE_SIZE {
            return Err(AppError::PayloadTooLarge);
        }

        let Some((kind, ext)) = lookup(content_type) else {
            return Err(AppError::Validation(format!(
                "Unsupported file type: {}. Only images and videos are allowed",
                content_type
            )));
        };

        if !validate_magic_bytes(data, content_type) {
            return Err(AppError::Validation(
                "File content does not match declared content type".to_string(),
            ));
        }

        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let dir = Path::new(&config.upload_dir).join(subdirectory);

        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to create upload directory: {}", e))
        })?;

        let file_path = dir.join(&filename);
        fs::write(&file_path, data)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to write file: {}", e)))?;

        Ok((kind, format!("/uploads/{}/{}", subdirectory, filename)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_magic_bytes_valid() {
        let data = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        assert!(validate_magic_bytes(&data, "image/jpeg"));
    }

    #[test]
    fn png_magic_bytes_valid() {
        let data = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A];
        assert!(validate_magic_bytes(&data, "image/png"));
    }

    #[test]
    fn mp4_magic_bytes_valid() {
        // 4-byte size prefix, then "ftyp"
        let data = [0x00, 0x00, 0x00, 0x20, 0x66, 0x74, 0x79, 0x70, 0x69, 0x73];
        assert!(validate_magic_bytes(&data, "video/mp4"));
    }

    #[test]
    fn webm_magic_bytes_valid() {
        let data = [0x1A, 0x45, 0xDF, 0xA3, 0x01, 0x00];
        assert!(validate_magic_bytes(&data, "video/webm"));
    }

    #[test]
    fn wrong_magic_bytes_rejected() {
        let png_data = [0x89, 0x50, 0x4E, 0x47];
        assert!(!validate_magic_bytes(&png_data, "image/jpeg"));
        assert!(!validate_magic_bytes(&png_data, "video/mp4"));
    }

    #[test]
    fn empty_data_rejected() {
        assert!(!validate_magic_bytes(&[], "image/jpeg"));
        assert!(!validate_magic_bytes(&[], "video/mp4"));
    }

    #[test]
    fn unknown_content_type_rejected() {
        assert!(lookup("application/pdf").is_none());
        assert!(!validate_magic_bytes(&[0xFF, 0xD8, 0xFF], "application/pdf"));
    }

    #[test]
    fn kind_classification() {
        assert_eq!(lookup("image/png").unwrap().0, MediaKind::Image);
        assert_eq!(lookup("video/webm").unwrap().0, MediaKind::Video);
    }
}
