//! Raster image codec: png / jpg / webp → [`RasterImage`] → png / jpg / webp.
//!
//! The codec owns two translations the dispatcher must not care about:
//!
//! - extension → encoder identity (`jpg` is the `JPEG` encoder), and
//! - colour normalisation per target. JPEG has no alpha channel, so an
//!   image with alpha is flattened to opaque RGB before encoding. The alpha
//!   values are discarded, not composited. The WebP encoder accepts only
//!   8-bit RGB/RGBA, so other layouts are widened or narrowed to those.

use crate::format::Format;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use std::io::{Cursor, Seek, Write};
use thiserror::Error;
use tracing::debug;

/// Fixed JPEG quality.
pub const JPEG_QUALITY: u8 = 75;

/// A decoded raster plus the colour layout it was stored in.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: DynamicImage,
}

impl RasterImage {
    pub fn new(pixels: DynamicImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn color(&self) -> ColorType {
        self.pixels.color()
    }

    pub fn has_alpha(&self) -> bool {
        self.pixels.color().has_alpha()
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }
}

/// Failure inside the image codec.
#[derive(Debug, Error)]
pub enum ImageCodecError {
    #[error("{0}")]
    Image(#[from] image::ImageError),

    #[error("{0} is not an image format")]
    NotImage(&'static str),
}

/// Canonical encoder identifier for an image target (`JPEG`, not `JPG`).
pub fn encoder_name(format: Format) -> Option<&'static str> {
    match format {
        Format::Png => Some("PNG"),
        Format::Jpeg => Some("JPEG"),
        Format::Webp => Some("WEBP"),
        _ => None,
    }
}

fn image_format(format: Format) -> Result<ImageFormat, ImageCodecError> {
    match format {
        Format::Png => Ok(ImageFormat::Png),
        Format::Jpeg => Ok(ImageFormat::Jpeg),
        Format::Webp => Ok(ImageFormat::WebP),
        other => Err(ImageCodecError::NotImage(other.name())),
    }
}

/// Decode raw file bytes of `format`.
///
/// The declared format is trusted; content sniffing is not attempted.
pub fn decode(bytes: &[u8], format: Format) -> Result<RasterImage, ImageCodecError> {
    let mut reader = ImageReader::new(Cursor::new(bytes));
    reader.set_format(image_format(format)?);
    let pixels = reader.decode()?;
    debug!(
        "Decoded {}x{} {:?} image",
        pixels.width(),
        pixels.height(),
        pixels.color()
    );
    Ok(RasterImage::new(pixels))
}

/// Bring `image` into a colour layout the `target` encoder accepts.
///
/// Returns `None` when the image can be encoded as is.
pub fn normalise_for(image: &RasterImage, target: Format) -> Option<DynamicImage> {
    let color = image.color();
    match target {
        Format::Jpeg => match color {
            ColorType::L8 | ColorType::Rgb8 => None,
            ColorType::L16 => Some(DynamicImage::ImageLuma8(image.pixels.to_luma8())),
            // Alpha is dropped, not blended.
            _ => Some(DynamicImage::ImageRgb8(image.pixels.to_rgb8())),
        },
        Format::Webp => match color {
            ColorType::Rgb8 | ColorType::Rgba8 => None,
            c if c.has_alpha() => Some(DynamicImage::ImageRgba8(image.pixels.to_rgba8())),
            _ => Some(DynamicImage::ImageRgb8(image.pixels.to_rgb8())),
        },
        _ => None,
    }
}

/// Encode `image` as `target` into `out`.
pub fn encode<W: Write + Seek>(
    image: &RasterImage,
    target: Format,
    out: &mut W,
) -> Result<(), ImageCodecError> {
    let image_format = image_format(target)?;
    let normalised = normalise_for(image, target);
    let pixels = normalised.as_ref().unwrap_or(&image.pixels);

    if normalised.is_some() {
        debug!(
            "Converted {:?} → {:?} for {}",
            image.color(),
            pixels.color(),
            encoder_name(target).unwrap_or("?")
        );
    }

    match image_format {
        ImageFormat::Jpeg => {
            pixels.write_with_encoder(JpegEncoder::new_with_quality(out, JPEG_QUALITY))?
        }
        other => pixels.write_to(out, other)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn rgba() -> RasterImage {
        RasterImage::new(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            3,
            Rgba([200, 10, 10, 64]),
        )))
    }

    fn encode_bytes(img: &RasterImage, target: Format) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        encode(img, target, &mut buf).unwrap();
        buf.into_inner()
    }

    #[test]
    fn decodes_png_with_alpha() {
        let img = decode(&png_bytes(rgba().pixels()), Format::Png).unwrap();
        assert_eq!((img.width(), img.height()), (4, 3));
        assert!(img.has_alpha());
    }

    #[test]
    fn rgba_to_jpeg_flattens_alpha() {
        let bytes = encode_bytes(&rgba(), Format::Jpeg);
        let back = decode(&bytes, Format::Jpeg).unwrap();
        assert_eq!(back.color(), ColorType::Rgb8);
        assert!(!back.has_alpha());
        assert_eq!((back.width(), back.height()), (4, 3));
    }

    #[test]
    fn jpeg_normalisation_rules() {
        let gray = RasterImage::new(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            2,
            2,
            Luma([9]),
        )));
        assert!(normalise_for(&gray, Format::Jpeg).is_none());

        let rgb = RasterImage::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            2,
            2,
            Rgb([1, 2, 3]),
        )));
        assert!(normalise_for(&rgb, Format::Jpeg).is_none());

        let flat = normalise_for(&rgba(), Format::Jpeg).unwrap();
        assert_eq!(flat.color(), ColorType::Rgb8);

        let la = RasterImage::new(DynamicImage::ImageLumaA8(image::GrayAlphaImage::from_pixel(
            2,
            2,
            image::LumaA([5, 0]),
        )));
        assert_eq!(
            normalise_for(&la, Format::Jpeg).unwrap().color(),
            ColorType::Rgb8
        );
    }

    #[test]
    fn png_keeps_alpha() {
        assert!(normalise_for(&rgba(), Format::Png).is_none());
        let bytes = encode_bytes(&rgba(), Format::Png);
        let back = decode(&bytes, Format::Png).unwrap();
        assert!(back.has_alpha());
    }

    #[test]
    fn webp_roundtrip_keeps_alpha() {
        let bytes = encode_bytes(&rgba(), Format::Webp);
        let back = decode(&bytes, Format::Webp).unwrap();
        assert!(back.has_alpha());
        assert_eq!((back.width(), back.height()), (4, 3));
    }

    #[test]
    fn webp_widens_grayscale() {
        let gray = RasterImage::new(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            2,
            2,
            Luma([9]),
        )));
        assert_eq!(
            normalise_for(&gray, Format::Webp).unwrap().color(),
            ColorType::Rgb8
        );
        let bytes = encode_bytes(&gray, Format::Webp);
        assert!(decode(&bytes, Format::Webp).is_ok());
    }

    #[test]
    fn encoder_names_are_canonical() {
        assert_eq!(encoder_name(Format::Jpeg), Some("JPEG"));
        assert_eq!(encoder_name(Format::Png), Some("PNG"));
        assert_eq!(encoder_name(Format::Webp), Some("WEBP"));
        assert_eq!(encoder_name(Format::Csv), None);
    }

    #[test]
    fn corrupt_bytes_fail_to_decode() {
        assert!(matches!(
            decode(b"\x89PNG\r\n\x1a\nnope", Format::Png),
            Err(ImageCodecError::Image(_))
        ));
    }

    #[test]
    fn non_image_target_is_rejected() {
        let mut buf = Cursor::new(Vec::new());
        assert!(matches!(
            encode(&rgba(), Format::Pdf, &mut buf),
            Err(ImageCodecError::NotImage("PDF"))
        ));
    }
}
