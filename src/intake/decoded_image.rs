use chrono::{DateTime, Utc};
use image::{imageops, ColorType, DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;

/// Longest side of the preview served back to the browser.
pub const PREVIEW_MAX_SIDE: u32 = 512;

/// Where an image came from, as declared by the user.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOrigin {
    Upload {
        file_name: String,
        declared_mime: String,
        size_bytes: usize,
    },
    Url {
        url: String,
        size_bytes: usize,
    },
}

impl ImageOrigin {
    pub fn size_bytes(&self) -> usize {
        match self {
            ImageOrigin::Upload { size_bytes, .. } | ImageOrigin::Url { size_bytes, .. } => {
                *size_bytes
            }
        }
    }
}

/// An image in the canonical color mode (8-bit RGB, no alpha).
///
/// The pixel buffer can only be built through [`DecodedImage::normalize`],
/// so every instance handed to a classifier is already canonical.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixels: RgbImage,
    preview: RgbImage,
    source_color: ColorType,
    detected_format: Option<ImageFormat>,
    origin: ImageOrigin,
    received_at: DateTime<Utc>,
}

impl DecodedImage {
    pub fn normalize(
        image: DynamicImage,
        detected_format: Option<ImageFormat>,
        origin: ImageOrigin,
    ) -> Self {
        let source_color = image.color();
        let pixels = match image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            // alpha is dropped, color channels are kept as-is
            other => other.to_rgb8(),
        };

        Self {
            preview: bounded_preview(&pixels),
            pixels,
            source_color,
            detected_format,
            origin,
            received_at: Utc::now(),
        }
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Color type of the stored pixels. Always [`ColorType::Rgb8`].
    pub fn color_type(&self) -> ColorType {
        ColorType::Rgb8
    }

    /// Color type the image had before normalization.
    pub fn source_color(&self) -> ColorType {
        self.source_color
    }

    pub fn detected_format(&self) -> Option<ImageFormat> {
        self.detected_format
    }

    pub fn origin(&self) -> &ImageOrigin {
        &self.origin
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// The preview, at most [`PREVIEW_MAX_SIDE`] pixels on its longest side.
    pub fn preview(&self) -> &RgbImage {
        &self.preview
    }

    /// Encodes the preview as PNG for the image endpoint.
    pub fn preview_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buffer = Cursor::new(Vec::new());
        self.preview.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }
}

/// Downscales `pixels` to fit [`PREVIEW_MAX_SIDE`], keeping the aspect ratio.
/// Smaller images are kept at their own size.
fn bounded_preview(pixels: &RgbImage) -> RgbImage {
    let (width, height) = pixels.dimensions();
    let longest = width.max(height);
    if longest <= PREVIEW_MAX_SIDE {
        return pixels.clone();
    }

    let scale = |side: u32| {
        ((u64::from(side) * u64::from(PREVIEW_MAX_SIDE) + u64::from(longest) / 2)
            / u64::from(longest))
        .max(1) as u32
    };
    imageops::thumbnail(pixels, scale(width), scale(height))
}
