//! The uploaded image and its temporary backing store.
//!
//! ## Why a temp file at all?
//!
//! The pipeline works from the in-memory bytes, but the upload is also
//! spooled to a [`NamedTempFile`] so collaborators that need a filesystem
//! path (local OCR tools, debugging dumps) can be pointed at one without a
//! second copy. The file is owned exclusively by the pipeline invocation
//! that created it and is deleted unconditionally at the end of the run —
//! explicitly via [`ImageAsset::release`] on the normal and abort paths,
//! and by `Drop` if the request is cancelled mid-flight.

use crate::error::AltTextError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// An uploaded image: opaque bytes plus the declared media type.
///
/// Immutable once captured from the upload.
#[derive(Debug)]
pub struct ImageAsset {
    bytes: Vec<u8>,
    media_type: String,
    backing: Option<NamedTempFile>,
}

impl ImageAsset {
    /// Capture uploaded bytes, spooling them to a temp file.
    ///
    /// An empty upload is rejected as [`AltTextError::InvalidImage`] —
    /// there is nothing to decode or describe.
    pub fn from_bytes(bytes: &[u8], media_type: &str) -> Result<Self, AltTextError> {
        if bytes.is_empty() {
            return Err(AltTextError::InvalidImage {
                detail: "empty upload".into(),
            });
        }

        let mut backing = NamedTempFile::new()
            .map_err(|e| AltTextError::Internal(format!("temp file creation failed: {e}")))?;
        backing
            .write_all(bytes)
            .map_err(|e| AltTextError::Internal(format!("temp file write failed: {e}")))?;

        debug!(
            bytes = bytes.len(),
            media_type,
            path = %backing.path().display(),
            "captured upload"
        );

        Ok(Self {
            bytes: bytes.to_vec(),
            media_type: media_type.to_string(),
            backing: Some(backing),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Path of the temp backing store, while it exists.
    pub fn path(&self) -> Option<&Path> {
        self.backing.as_ref().map(|f| f.path())
    }

    /// Delete the temp backing store.
    ///
    /// Deletion failure is logged and swallowed: cleanup trouble must never
    /// change the result already produced for the caller.
    pub fn release(mut self) {
        if let Some(backing) = self.backing.take() {
            let path = backing.path().to_path_buf();
            if let Err(e) = backing.close() {
                warn!(path = %path.display(), error = %e, "temp image cleanup failed");
            } else {
                debug!(path = %path.display(), "temp image released");
            }
        }
    }
}

impl Drop for ImageAsset {
    fn drop(&mut self) {
        // NamedTempFile deletes itself on drop; this only records that the
        // explicit release path was skipped (e.g. cancelled request).
        if self.backing.is_some() {
            debug!("temp image released via drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_upload_is_rejected() {
        let err = ImageAsset::from_bytes(&[], "image/png").unwrap_err();
        assert!(matches!(err, AltTextError::InvalidImage { .. }));
    }

    #[test]
    fn release_deletes_backing_file() {
        let asset = ImageAsset::from_bytes(b"pretend-image", "image/png").unwrap();
        let path = asset.path().unwrap().to_path_buf();
        assert!(path.exists());
        asset.release();
        assert!(!path.exists());
    }

    #[test]
    fn drop_deletes_backing_file() {
        let path = {
            let asset = ImageAsset::from_bytes(b"pretend-image", "image/png").unwrap();
            asset.path().unwrap().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn bytes_round_trip() {
        let asset = ImageAsset::from_bytes(b"abc", "image/jpeg").unwrap();
        assert_eq!(asset.bytes(), b"abc");
        assert_eq!(asset.media_type(), "image/jpeg");
    }
}
