use image::{imageops, imageops::FilterType, RgbImage};
use tract_onnx::prelude::*;

/// Resize, rescale and normalization applied before the forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessing {
    pub input_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Preprocessing {
    /// Produces an NCHW `f32` tensor of shape `[1, 3, input_size, input_size]`.
    pub fn to_tensor(&self, image: &RgbImage) -> Tensor {
        let size = self.input_size;
        let resized = if image.dimensions() == (size, size) {
            image.clone()
        } else {
            imageops::resize(image, size, size, FilterType::Triangle)
        };

        let size = size as usize;
        tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
            let value = resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0;
            (value - self.mean[c]) / self.std[c]
        })
        .into()
    }
}
