use crate::{
    classifier::{
        interface::{LesionClassifier, PredictionSource},
        labels::LesionLabel,
        result::{softmax, ClassificationResult},
    },
    error::InferenceError,
    intake::DecodedImage,
};
use image::RgbImage;

const FEATURE_COUNT: usize = 6;

// One row per label in native order, columns follow `ColorFeatures::as_array`.
const WEIGHTS: [[f32; FEATURE_COUNT]; 7] = [
    [0.8, 0.4, 0.2, 1.2, -0.4, 0.2],  // benign keratosis-like lesions
    [1.0, 0.8, 0.8, -0.6, -0.8, 0.6], // basal cell carcinoma
    [1.2, 0.2, 0.0, 0.6, -0.2, 1.0],  // actinic keratoses
    [1.4, -0.6, 0.4, -0.2, -0.6, 2.2], // vascular lesions
    [0.4, 0.4, 0.2, 0.4, 0.8, 0.0],   // melanocytic nevi
    [-0.2, -0.2, 0.0, 1.8, 1.6, -0.2], // melanoma
    [0.6, 0.4, 0.2, 0.2, 0.2, 0.4],   // dermatofibroma
];
const BIAS: [f32; 7] = [0.2, -0.4, -0.3, -0.9, 1.1, -0.1, -0.6];

/// A model-free classifier that scores labels from simple color
/// statistics. It honours the classifier contract (deterministic, full label
/// set, normalized distribution) but has no diagnostic value; it exists so
/// the application runs without model weights.
#[derive(Debug, Default, Clone)]
pub struct ReferenceClassifier;

impl ReferenceClassifier {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ColorFeatures {
    mean_red: f32,
    mean_green: f32,
    mean_blue: f32,
    luma_std: f32,
    dark_fraction: f32,
    redness: f32,
}

impl ColorFeatures {
    fn extract(image: &RgbImage) -> Option<Self> {
        // f32 sums stop growing past 2^24 pixels
        let mut n = 0u64;
        let mut sums = [0u64; 3];
        let mut dark = 0u64;
        // One-pass mean/variance (Welford)
        let mut mean = 0f64;
        let mut m2 = 0f64;

        for pixel in image.pixels() {
            let [r, g, b] = pixel.0;
            n += 1;
            sums[0] += u64::from(r);
            sums[1] += u64::from(g);
            sums[2] += u64::from(b);

            let luma = rgb_to_luma([r, g, b].map(|c| f64::from(c) / 255.0));
            if luma < 0.3 {
                dark += 1;
            }
            let delta = luma - mean;
            mean += delta / n as f64;
            m2 += delta * (luma - mean);
        }

        if n == 0 {
            return None;
        }

        let count = n as f64;
        let [mean_red, mean_green, mean_blue] = sums.map(|s| (s as f64 / (count * 255.0)) as f32);
        Some(Self {
            mean_red,
            mean_green,
            mean_blue,
            luma_std: if n < 2 { 0.0 } else { (m2 / (count - 1.0)).sqrt() as f32 },
            dark_fraction: (dark as f64 / count) as f32,
            redness: (mean_red - (mean_green + mean_blue) / 2.0).max(0.0),
        })
    }

    fn as_array(&self) -> [f32; FEATURE_COUNT] {
        [
            self.mean_red,
            self.mean_green,
            self.mean_blue,
            self.luma_std,
            self.dark_fraction,
            self.redness,
        ]
    }
}

fn rgb_to_luma([r, g, b]: [f64; 3]) -> f64 {
    // Rec. 709 luminance
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

impl LesionClassifier for ReferenceClassifier {
    fn classify(&self, image: &DecodedImage) -> Result<ClassificationResult, InferenceError> {
        let features = ColorFeatures::extract(image.pixels())
            .ok_or_else(|| InferenceError::Model("image has no pixels".to_string()))?
            .as_array();

        let logits: Vec<f32> = LesionLabel::ALL
            .iter()
            .map(|label| {
                let row = &WEIGHTS[label.index()];
                BIAS[label.index()]
                    + row
                        .iter()
                        .zip(features.iter())
                        .map(|(w, f)| w * f)
                        .sum::<f32>()
            })
            .collect();

        ClassificationResult::from_native_order(&softmax(&logits))
    }

    fn name(&self) -> &'static str {
        "reference"
    }

    fn source(&self) -> PredictionSource {
        PredictionSource::Demo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::ImageOrigin;
    use image::{DynamicImage, Rgb};

    fn decoded(image: RgbImage) -> DecodedImage {
        DecodedImage::normalize(
            DynamicImage::ImageRgb8(image),
            None,
            ImageOrigin::Url {
                url: "http://example.test/a.png".to_string(),
                size_bytes: 0,
            },
        )
    }

    fn gradient() -> RgbImage {
        RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, 90]))
    }

    #[test]
    fn test_distribution_covers_label_set_and_sums_to_one() {
        let classifier = ReferenceClassifier::new();
        for image in [
            gradient(),
            RgbImage::from_pixel(10, 10, Rgb([0, 0, 0])),
            RgbImage::from_pixel(10, 10, Rgb([255, 255, 255])),
            RgbImage::from_pixel(1, 1, Rgb([180, 40, 60])),
        ] {
            let result = classifier.classify(&decoded(image)).unwrap();
            assert!(result.covers_label_set());
            assert!((result.probability_sum() - 1.0).abs() <= 1e-4);
        }
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = ReferenceClassifier::new();
        let image = decoded(gradient());
        let first = classifier.classify(&image).unwrap();
        let second = classifier.classify(&image).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_different_images_score_differently() {
        let classifier = ReferenceClassifier::new();
        let dark = classifier
            .classify(&decoded(RgbImage::from_pixel(8, 8, Rgb([20, 10, 10]))))
            .unwrap();
        let red = classifier
            .classify(&decoded(RgbImage::from_pixel(8, 8, Rgb([220, 40, 60]))))
            .unwrap();
        assert_ne!(dark, red);
    }

    #[test]
    fn test_uniform_image_scores_the_same_at_any_size() {
        let color = Rgb([200, 120, 80]);
        let small = RgbImage::from_pixel(64, 64, color);
        // past 2^24 pixels
        let large = RgbImage::from_pixel(4400, 4400, color);

        let small_features = ColorFeatures::extract(&small).unwrap();
        let large_features = ColorFeatures::extract(&large).unwrap();
        assert_eq!(small_features, large_features);
        assert!((small_features.mean_red - 200.0 / 255.0).abs() < 1e-6);
        assert_eq!(small_features.luma_std, 0.0);

        let classifier = ReferenceClassifier::new();
        assert_eq!(
            classifier.classify(&decoded(small)).unwrap(),
            classifier.classify(&decoded(large)).unwrap()
        );
    }

    #[test]
    fn test_empty_image_is_inference_error() {
        let result = ReferenceClassifier::new().classify(&decoded(RgbImage::new(0, 0)));
        assert!(matches!(result, Err(InferenceError::Model(_))));
    }
}
