use crate::{
    config::IntakeConfig,
    error::{AcquireError, FetchFailure},
    intake::{
        decoded_image::{DecodedImage, ImageOrigin},
        fetcher::ImageFetcher,
        format::AcceptedFormat,
    },
};
use image::{ImageError, ImageFormat, ImageReader, Limits};
use reqwest::Url;
use std::{io::Cursor, sync::Arc};
use tracing::{debug, info, warn};

/// Turns uploads and image URLs into canonical [`DecodedImage`]s.
#[derive(Clone)]
pub struct ImageAcquirer {
    fetcher: Arc<dyn ImageFetcher>,
    max_image_side: u32,
    max_decoder_alloc_bytes: u64,
}

impl ImageAcquirer {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, config: &IntakeConfig) -> Self {
        Self {
            fetcher,
            max_image_side: config.max_image_side,
            max_decoder_alloc_bytes: config.max_decoder_alloc_bytes,
        }
    }

    /// Validates the declared type, then decodes the uploaded bytes.
    pub fn acquire_from_upload(
        &self,
        file_bytes: &[u8],
        declared_mime: &str,
        declared_file_name: &str,
    ) -> Result<DecodedImage, AcquireError> {
        let format = AcceptedFormat::from_mime(declared_mime)?;
        self.decode_upload(file_bytes, format, declared_mime, declared_file_name)
    }

    /// Decodes an upload whose declared type has already been accepted.
    pub fn decode_upload(
        &self,
        file_bytes: &[u8],
        format: AcceptedFormat,
        declared_mime: &str,
        declared_file_name: &str,
    ) -> Result<DecodedImage, AcquireError> {
        let origin = ImageOrigin::Upload {
            file_name: declared_file_name.to_string(),
            declared_mime: declared_mime.to_string(),
            size_bytes: file_bytes.len(),
        };

        let image = self.decode(file_bytes, Some(format.image_format()), origin)?;
        info!(
            "Accepted upload '{}' ({}x{}, {} bytes)",
            declared_file_name,
            image.width(),
            image.height(),
            file_bytes.len()
        );
        Ok(image)
    }

    /// Validates and fetches `raw_url`, then decodes the response body.
    pub async fn acquire_from_url(&self, raw_url: &str) -> Result<DecodedImage, AcquireError> {
        let url = parse_image_url(raw_url)?;
        self.fetch_and_decode(url).await
    }

    pub async fn fetch_and_decode(&self, url: Url) -> Result<DecodedImage, AcquireError> {
        let bytes = self.fetcher.fetch(&url).await.map_err(|cause| {
            warn!("Fetching {} failed: {}", url, cause);
            AcquireError::fetch(url.as_str(), cause)
        })?;

        let origin = ImageOrigin::Url {
            url: url.to_string(),
            size_bytes: bytes.len(),
        };

        let image = self.decode(&bytes, None, origin)?;
        info!(
            "Accepted image from {} ({}x{}, {} bytes)",
            url,
            image.width(),
            image.height(),
            bytes.len()
        );
        Ok(image)
    }

    fn decode(
        &self,
        bytes: &[u8],
        fallback_format: Option<ImageFormat>,
        origin: ImageOrigin,
    ) -> Result<DecodedImage, AcquireError> {
        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| AcquireError::InvalidImageData(ImageError::IoError(e)))?;

        // Content sniffing wins; the declared type only helps when the magic bytes are unknown.
        if reader.format().is_none() {
            if let Some(format) = fallback_format {
                reader.set_format(format);
            }
        }
        let detected_format = reader.format();

        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_image_side);
        limits.max_image_height = Some(self.max_image_side);
        limits.max_alloc = Some(self.max_decoder_alloc_bytes);
        reader.limits(limits);

        let image = reader.decode().map_err(|e| {
            debug!("Decoding {} bytes failed: {}", bytes.len(), e);
            AcquireError::InvalidImageData(e)
        })?;

        Ok(DecodedImage::normalize(image, detected_format, origin))
    }
}

/// Trims `raw_url` and requires an absolute http(s) URL with a host.
pub fn parse_image_url(raw_url: &str) -> Result<Url, AcquireError> {
    let trimmed = raw_url.trim();
    let invalid = |reason: String| AcquireError::fetch(trimmed, FetchFailure::InvalidUrl(reason));

    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::intake::testing::{encode, rgba_png, StaticFetcher};
    use bytes::Bytes;
    use image::{ColorType, DynamicImage};

    fn acquirer_with(response: fn() -> Result<Bytes, FetchFailure>) -> ImageAcquirer {
        ImageAcquirer::new(
            Arc::new(StaticFetcher { response }),
            &IntakeConfig::default(),
        )
    }

    fn acquirer() -> ImageAcquirer {
        acquirer_with(|| Err(FetchFailure::Status(500)))
    }

    #[test]
    fn test_upload_rejects_gif() {
        let error = acquirer()
            .acquire_from_upload(&rgba_png(), "image/gif", "mole.gif")
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_upload_rejects_empty_png() {
        let error = acquirer()
            .acquire_from_upload(&[], "image/png", "empty.png")
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidImageData);
    }

    #[test]
    fn test_upload_rejects_garbage_bytes() {
        let error = acquirer()
            .acquire_from_upload(b"definitely not a jpeg", "image/jpeg", "mole.jpg")
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidImageData);
    }

    #[test]
    fn test_upload_with_alpha_is_normalized() {
        let image = acquirer()
            .acquire_from_upload(&rgba_png(), "image/png", "mole.png")
            .unwrap();

        assert_eq!(image.source_color(), ColorType::Rgba8);
        assert_eq!(image.color_type(), ColorType::Rgb8);
        assert_eq!((image.width(), image.height()), (8, 6));
        assert_eq!(image.pixels().get_pixel(3, 3).0, [10, 20, 30]);
        assert_eq!(image.detected_format(), Some(ImageFormat::Png));
        match image.origin() {
            ImageOrigin::Upload { file_name, .. } => assert_eq!(file_name, "mole.png"),
            other => panic!("unexpected origin {:?}", other),
        }
    }

    #[test]
    fn test_upload_content_is_sniffed_over_declared_type() {
        let jpeg = encode(DynamicImage::new_rgb8(4, 4), ImageFormat::Jpeg);
        let image = acquirer()
            .acquire_from_upload(&jpeg, "image/png", "actually-a-jpeg.png")
            .unwrap();
        assert_eq!(image.detected_format(), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_upload_over_dimension_limit_is_invalid() {
        let acquirer = ImageAcquirer::new(
            Arc::new(StaticFetcher {
                response: || Err(FetchFailure::Timeout),
            }),
            &IntakeConfig {
                max_image_side: 4,
                ..IntakeConfig::default()
            },
        );
        let error = acquirer
            .acquire_from_upload(&rgba_png(), "image/png", "big.png")
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidImageData);
    }

    #[test]
    fn test_parse_image_url() {
        let url = parse_image_url("  https://example.test/mole.png \n").unwrap();
        assert_eq!(url.as_str(), "https://example.test/mole.png");

        for raw in ["ftp://example.test/a.png", "/relative/a.png", "not a url", "file:///etc/passwd"] {
            let error = parse_image_url(raw).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::FetchError, "{raw}");
        }
    }

    #[tokio::test]
    async fn test_url_acquisition_decodes_fetched_bytes() {
        let acquirer = acquirer_with(|| Ok(Bytes::from(rgba_png())));
        let image = acquirer
            .acquire_from_url("http://example.test/mole.png")
            .await
            .unwrap();
        assert_eq!(image.color_type(), ColorType::Rgb8);
        assert!(matches!(image.origin(), ImageOrigin::Url { size_bytes, .. } if *size_bytes > 0));
    }

    #[tokio::test]
    async fn test_url_acquisition_wraps_fetch_failure() {
        let acquirer = acquirer_with(|| Err(FetchFailure::Status(404)));
        let error = acquirer
            .acquire_from_url("http://example.test/missing.png")
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            AcquireError::Fetch {
                cause: FetchFailure::Status(404),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_url_acquisition_rejects_non_image_body() {
        let acquirer = acquirer_with(|| Ok(Bytes::from_static(b"<html>nope</html>")));
        let error = acquirer
            .acquire_from_url("http://example.test/page.html")
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidImageData);
    }
}
