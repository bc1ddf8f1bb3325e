/// Embedded image handling
///
/// Artworks carry their image inline as a `data:` URL. This module turns
/// image files into such URLs and back. No pixels are decoded; the format is
/// sniffed from the file's magic bytes only to pick the MIME type.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a recognised image format")]
    UnknownFormat,

    #[error("not a base64 data URL")]
    NotDataUrl,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// An image pulled back out of a data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl EmbeddedImage {
    /// Usual file extension for the image's format, if known
    pub fn extension(&self) -> Option<&'static str> {
        ImageFormat::from_mime_type(&self.mime)
            .and_then(|format| format.extensions_str().first().copied())
    }
}

/// Read an image file and embed it as a `data:` URL
pub fn encode_file(path: &Path) -> Result<String, MediaError> {
    let bytes = std::fs::read(path).map_err(|source| MediaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    encode_bytes(&bytes)
}

/// Embed raw image bytes as a `data:` URL
pub fn encode_bytes(bytes: &[u8]) -> Result<String, MediaError> {
    let format = image::guess_format(bytes).map_err(|_| MediaError::UnknownFormat)?;
    Ok(format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        STANDARD.encode(bytes)
    ))
}

/// Split a base64 `data:` URL into its MIME type and bytes
pub fn decode(data_url: &str) -> Result<EmbeddedImage, MediaError> {
    let rest = data_url.strip_prefix("data:").ok_or(MediaError::NotDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(MediaError::NotDataUrl)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(MediaError::NotDataUrl)?;

    Ok(EmbeddedImage {
        mime: mime.to_string(),
        bytes: STANDARD.decode(payload.trim())?,
    })
}

/// Write an embedded image to `path`, adding the format's extension if `path` has none.
/// Returns the decoded image and the path actually written.
pub fn export(data_url: &str, path: &Path) -> Result<(EmbeddedImage, PathBuf), MediaError> {
    let image = decode(data_url)?;
    let path = match (path.extension(), image.extension()) {
        (None, Some(ext)) => path.with_extension(ext),
        _ => path.to_path_buf(),
    };

    std::fs::write(&path, &image.bytes).map_err(|source| MediaError::Write {
        path: path.clone(),
        source,
    })?;
    Ok((image, path))
}

/// Whether a path looks like an image file, judged by extension
pub fn is_image_path(path: &Path) -> bool {
    ImageFormat::from_path(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_encode_sniffs_mime() {
        let url = encode_bytes(PNG_HEADER).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_encode_rejects_non_images() {
        assert!(matches!(
            encode_bytes(b"just some text"),
            Err(MediaError::UnknownFormat)
        ));
    }

    #[test]
    fn test_decode_returns_original_bytes() {
        let url = encode_bytes(PNG_HEADER).unwrap();
        let image = decode(&url).unwrap();

        assert_eq!(image.mime, "image/png");
        assert_eq!(image.bytes, PNG_HEADER);
        assert_eq!(image.extension(), Some("png"));
    }

    #[test]
    fn test_decode_rejects_plain_paths() {
        assert!(matches!(decode("/tmp/fox.png"), Err(MediaError::NotDataUrl)));
        assert!(matches!(
            decode("data:image/png,rawdata"),
            Err(MediaError::NotDataUrl)
        ));
    }

    #[test]
    fn test_encode_and_export_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("fox.png");
        std::fs::write(&source, PNG_HEADER).unwrap();

        let url = encode_file(&source).unwrap();
        let (_, written) = export(&url, &dir.path().join("out")).unwrap();

        assert_eq!(written, dir.path().join("out.png"));
        assert_eq!(std::fs::read(&written).unwrap(), PNG_HEADER);
    }

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path(Path::new("a/b/fox.PNG")));
        assert!(is_image_path(Path::new("fox.jpeg")));
        assert!(!is_image_path(Path::new("notes.txt")));
        assert!(!is_image_path(Path::new("README")));
    }
}
