//! Image normalization: bound the upload to a cheap transport form.
//!
//! Vision endpoints accept images as base64 data-URIs embedded in the JSON
//! request body, so payload size directly drives cost and latency. The
//! normalizer caps the width (downscale only — upscaling adds bytes without
//! adding information) and re-encodes to JPEG at a fixed quality, which for
//! photos and screenshots lands well under typical request-size limits while
//! staying legible to the caption model.

use crate::asset::ImageAsset;
use crate::config::PipelineConfig;
use crate::error::AltTextError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// The canonical transport form of an uploaded image.
///
/// JPEG bytes at the configured quality, width capped at the configured
/// maximum. Scoped to a single pipeline run and never persisted.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
}

impl NormalizedImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn media_type(&self) -> &'static str {
        "image/jpeg"
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.jpeg
    }

    /// Base64 data URI for embedding in a chat-completions image part.
    pub fn to_data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(&self.jpeg))
    }
}

/// Decode, downscale, and re-encode the uploaded image.
///
/// Fails only with [`AltTextError::InvalidImage`] when the bytes are not a
/// decodable raster image — the single hard failure of the whole pipeline.
pub fn normalize(asset: &ImageAsset, config: &PipelineConfig) -> Result<NormalizedImage, AltTextError> {
    let decoded =
        image::load_from_memory(asset.bytes()).map_err(|e| AltTextError::InvalidImage {
            detail: e.to_string(),
        })?;

    let (orig_w, orig_h) = (decoded.width(), decoded.height());
    let resized = downscale_to_width(decoded, config.max_width);
    let (width, height) = (resized.width(), resized.height());

    // JPEG has no alpha channel; flatten before encoding.
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), config.jpeg_quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| AltTextError::Internal(format!("JPEG encoding failed: {e}")))?;

    debug!(
        orig_w,
        orig_h,
        width,
        height,
        bytes = jpeg.len(),
        quality = config.jpeg_quality,
        "normalized image"
    );

    Ok(NormalizedImage {
        jpeg,
        width,
        height,
    })
}

/// Scale the image down so `width <= max_width`, preserving aspect ratio.
/// Images already within the cap pass through untouched.
fn downscale_to_width(img: DynamicImage, max_width: u32) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    if w <= max_width {
        return img;
    }
    let new_h = ((h as u64 * max_width as u64) / w as u64).max(1) as u32;
    img.resize_exact(max_width, new_h, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use image::{Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([200, 40, 40]),
        ));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .expect("encode test PNG");
        buf
    }

    fn asset(bytes: Vec<u8>) -> ImageAsset {
        ImageAsset::from_bytes(&bytes, "image/png").expect("test asset")
    }

    #[test]
    fn wide_image_is_downscaled() {
        let config = PipelineConfig::default();
        let normalized = normalize(&asset(png_bytes(1024, 400)), &config).unwrap();
        assert_eq!(normalized.width(), 512);
        assert_eq!(normalized.height(), 200);
    }

    #[test]
    fn narrow_image_is_never_upscaled() {
        let config = PipelineConfig::default();
        let normalized = normalize(&asset(png_bytes(300, 500)), &config).unwrap();
        assert_eq!(normalized.width(), 300);
        assert_eq!(normalized.height(), 500);
    }

    #[test]
    fn output_is_decodable_jpeg() {
        let config = PipelineConfig::default();
        let normalized = normalize(&asset(png_bytes(64, 64)), &config).unwrap();
        let round_trip = image::load_from_memory(normalized.as_bytes()).unwrap();
        assert_eq!(round_trip.width(), 64);
        assert_eq!(normalized.media_type(), "image/jpeg");
    }

    #[test]
    fn data_uri_has_jpeg_prefix() {
        let config = PipelineConfig::default();
        let normalized = normalize(&asset(png_bytes(10, 10)), &config).unwrap();
        let uri = normalized.to_data_uri();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        let b64 = uri.trim_start_matches("data:image/jpeg;base64,");
        assert!(STANDARD.decode(b64).is_ok());
    }

    #[test]
    fn undecodable_bytes_are_invalid_image() {
        let config = PipelineConfig::default();
        let err = normalize(&asset(b"definitely not an image".to_vec()), &config).unwrap_err();
        assert!(matches!(err, AltTextError::InvalidImage { .. }));
    }
}
