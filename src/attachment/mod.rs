use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use fs_err as fs;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions accepted for image questions, with their MIME types.
pub const ALLOWED_IMAGE_TYPES: &[(&str, &str)] = &[("png", "image/png"), ("jpg", "image/jpeg"), ("jpeg", "image/jpeg")];

#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("{} is not a supported image (use png, jpg or jpeg)", path.display())]
    Unsupported { path: PathBuf },
    #[error("{} is {bytes} bytes, above the {max} byte limit", path.display())]
    TooLarge { path: PathBuf, bytes: usize, max: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// An image sent alongside a question.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub mime: &'static str,
    pub data: Bytes,
}

impl fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl ImageAttachment {
    pub fn base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64())
    }
}

/// MIME type for an allowlisted image extension (case-insensitive).
pub fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    ALLOWED_IMAGE_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == ext)
        .map(|(_, mime)| *mime)
}

/// Read an image from disk, rejecting unsupported types and oversized files
/// before the bytes reach a request.
pub fn load_image(path: &Path, max_bytes: usize) -> Result<ImageAttachment, AttachmentError> {
    let mime = mime_for(path).ok_or_else(|| AttachmentError::Unsupported { path: path.to_path_buf() })?;

    let size = fs::metadata(path)?.len() as usize;
    if size > max_bytes {
        return Err(AttachmentError::TooLarge { path: path.to_path_buf(), bytes: size, max: max_bytes });
    }

    let data = fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(ImageAttachment { file_name, mime, data: Bytes::from(data) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, data).unwrap();
        p
    }

    #[test]
    fn loads_allowed_images() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "leaf.JPG", b"\xff\xd8\xff\xe0fake");

        let img = load_image(&p, 1024).unwrap();
        assert_eq!(img.mime, "image/jpeg");
        assert_eq!(img.file_name, "leaf.JPG");
        assert_eq!(img.data.as_ref(), b"\xff\xd8\xff\xe0fake");
    }

    #[test]
    fn rejects_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "notes.pdf", b"%PDF");
        assert!(matches!(load_image(&p, 1024), Err(AttachmentError::Unsupported { .. })));

        let bare = write(dir.path(), "noext", b"x");
        assert!(matches!(load_image(&bare, 1024), Err(AttachmentError::Unsupported { .. })));
    }

    #[test]
    fn rejects_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "big.png", &[0u8; 64]);
        match load_image(&p, 16) {
            Err(AttachmentError::TooLarge { bytes, max, .. }) => {
                assert_eq!(bytes, 64);
                assert_eq!(max, 16);
            }
            other => panic!("expected TooLarge, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_image(&dir.path().join("gone.png"), 1024).unwrap_err();
        assert!(matches!(err, AttachmentError::Io(_)));
        assert!(err.to_string().contains("gone.png"));
    }

    #[test]
    fn data_url_carries_mime_and_base64() {
        let img = ImageAttachment { file_name: "a.png".into(), mime: "image/png", data: Bytes::from_static(b"hi") };
        assert_eq!(img.base64(), "aGk=");
        assert_eq!(img.data_url(), "data:image/png;base64,aGk=");
    }

    #[test]
    fn debug_hides_payload() {
        let img = ImageAttachment { file_name: "a.png".into(), mime: "image/png", data: Bytes::from_static(b"secret-bytes") };
        assert!(!format!("{img:?}").contains("secret"));
    }
}
