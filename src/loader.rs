//! Image sources read from disk.
//!
//! Only the header is decoded: the recording backend needs an image's key
//! and natural size, never its pixels. PNG and GIF are understood.

#[cfg(test)]
#[path = "loader_test.rs"]
mod loader_test;

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use canvas::doc::ImageHandle;
use canvas::error::LoadError;
use canvas::serialize::ImageLoader;
use tokio::io::AsyncReadExt;
use tracing::debug;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const HEADER_LEN: usize = 24;

/// Resolves `src` values relative to a root directory.
#[derive(Debug, Clone)]
pub struct FileImageLoader {
    root: PathBuf,
}

impl FileImageLoader {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path for `src`, refusing anything that climbs out of the root.
    fn resolve(&self, src: &str) -> Result<PathBuf, LoadError> {
        let relative = Path::new(src.strip_prefix("file://").unwrap_or(src));
        let escapes = relative.components().any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(image_error(src, "path leaves the asset directory"));
        }
        Ok(self.root.join(relative))
    }
}

fn image_error(src: &str, reason: impl Into<String>) -> LoadError {
    LoadError::Image { src: src.to_owned(), reason: reason.into() }
}

/// Natural size from a PNG or GIF header.
pub fn header_size(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.starts_with(PNG_SIGNATURE) && bytes.len() >= HEADER_LEN && &bytes[12..16] == b"IHDR" {
        let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
        let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
        return Some((width, height));
    }
    if (bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a")) && bytes.len() >= 10 {
        let width = u16::from_le_bytes([bytes[6], bytes[7]]);
        let height = u16::from_le_bytes([bytes[8], bytes[9]]);
        return Some((u32::from(width), u32::from(height)));
    }
    None
}

#[async_trait(?Send)]
impl ImageLoader for FileImageLoader {
    async fn load(&self, src: &str) -> Result<ImageHandle, LoadError> {
        let path = self.resolve(src)?;
        let file = tokio::fs::File::open(&path).await.map_err(|e| image_error(src, e.to_string()))?;
        let mut header = Vec::with_capacity(HEADER_LEN);
        file.take(HEADER_LEN as u64)
            .read_to_end(&mut header)
            .await
            .map_err(|e| image_error(src, e.to_string()))?;
        let (width, height) = header_size(&header).ok_or_else(|| image_error(src, "unsupported image format"))?;
        debug!(%src, width, height, "image header read");
        Ok(ImageHandle { key: src.to_owned(), width: f64::from(width), height: f64::from(height) })
    }
}
