use crate::{error::FetchFailure, intake::fetcher::ImageFetcher};
use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use reqwest::Url;
use std::io::Cursor;

/// Fetcher that answers every URL with the same canned result.
pub struct StaticFetcher {
    pub response: fn() -> Result<Bytes, FetchFailure>,
}

#[async_trait]
impl ImageFetcher for StaticFetcher {
    async fn fetch(&self, _url: &Url) -> Result<Bytes, FetchFailure> {
        (self.response)()
    }
}

pub fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

/// An 8x6 semi-transparent PNG.
pub fn rgba_png() -> Vec<u8> {
    encode(
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 6, Rgba([10, 20, 30, 128]))),
        ImageFormat::Png,
    )
}
