pub mod acquirer;
pub mod decoded_image;
pub mod fetcher;
pub mod format;

#[cfg(test)]
pub(crate) mod testing;

pub use acquirer::{parse_image_url, ImageAcquirer};
pub use decoded_image::{DecodedImage, ImageOrigin};
pub use fetcher::{HttpImageFetcher, ImageFetcher};
pub use format::AcceptedFormat;
