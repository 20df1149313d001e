use crate::{
    classifier::{
        interface::LesionClassifier,
        labels::LesionLabel,
        preprocess::Preprocessing,
        result::{softmax, ClassificationResult},
    },
    config::ModelConfig,
    error::{AppError, InferenceError},
    intake::DecodedImage,
};
use tract_onnx::prelude::*;
use tracing::{debug, info};

/// Runs an ONNX export of the pretrained lesion model with tract.
pub struct TractOnnxClassifier {
    model: TypedRunnableModel<TypedModel>,
    preprocessing: Preprocessing,
}

impl TractOnnxClassifier {
    pub fn load(config: &ModelConfig) -> Result<Self, AppError> {
        let path = config.onnx_model_path.display().to_string();
        let load_error = |e: TractError| AppError::ModelLoad {
            path: path.clone(),
            reason: format!("{:#}", e),
        };

        info!("Loading ONNX model from {}", path);
        let model = tract_onnx::onnx()
            .model_for_path(&config.onnx_model_path)
            .map_err(load_error)?;
        let classifier = Self::from_model(model, config).map_err(load_error)?;
        info!("ONNX model loaded");
        Ok(classifier)
    }

    /// Fixes the input to `[1, 3, input_size, input_size]` and optimizes
    /// `model` for repeated runs.
    fn from_model(model: InferenceModel, config: &ModelConfig) -> TractResult<Self> {
        let size = config.input_size as usize;
        let model = model
            .with_input_fact(0, f32::fact([1, 3, size, size]).into())?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self {
            model,
            preprocessing: Preprocessing {
                input_size: config.input_size,
                mean: config.mean,
                std: config.std,
            },
        })
    }

    fn logits(&self, image: &DecodedImage) -> Result<Vec<f32>, InferenceError> {
        let input = self.preprocessing.to_tensor(image.pixels());
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::Model(format!("{:#}", e)))?;

        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::Model("model returned no outputs".to_string()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::Model(format!("{:#}", e)))?;

        // [1, num_labels] or [num_labels]
        let shape = view.shape().to_vec();
        let expected = LesionLabel::ALL.len();
        if view.len() != expected || shape.iter().filter(|d| **d != 1).count() > 1 {
            return Err(InferenceError::OutputShape { expected, shape });
        }

        Ok(view.iter().copied().collect())
    }
}

impl LesionClassifier for TractOnnxClassifier {
    fn classify(&self, image: &DecodedImage) -> Result<ClassificationResult, InferenceError> {
        let logits = self.logits(image)?;
        debug!("Model logits: {:?}", logits);
        ClassificationResult::from_native_order(&softmax(&logits))
    }

    fn name(&self) -> &'static str {
        "onnx"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::ImageOrigin;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::path::PathBuf;
    use tract_onnx::pb::{
        self, tensor_proto::DataType, tensor_shape_proto::dimension, type_proto,
    };

    const INPUT_SIZE: u32 = 8;

    fn config() -> ModelConfig {
        ModelConfig {
            input_size: INPUT_SIZE,
            ..ModelConfig::default()
        }
    }

    fn float_input(name: &str, dims: &[i64]) -> pb::ValueInfoProto {
        pb::ValueInfoProto {
            name: name.to_string(),
            r#type: Some(pb::TypeProto {
                value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                    elem_type: DataType::Float as i32,
                    shape: Some(pb::TensorShapeProto {
                        dim: dims
                            .iter()
                            .map(|d| pb::tensor_shape_proto::Dimension {
                                value: Some(dimension::Value::DimValue(*d)),
                                ..Default::default()
                            })
                            .collect(),
                    }),
                })),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn node(op_type: &str, inputs: &[&str], output: &str) -> pb::NodeProto {
        pb::NodeProto {
            input: inputs.iter().map(|i| i.to_string()).collect(),
            output: vec![output.to_string()],
            name: output.to_string(),
            op_type: op_type.to_string(),
            ..Default::default()
        }
    }

    /// image -> GlobalAveragePool -> Flatten -> MatMul(weights), giving
    /// `[1, labels]` logits from the three channel means.
    fn channel_mean_model(labels: usize) -> InferenceModel {
        let weights: Vec<f32> = (0..3 * labels)
            .map(|i| (i % 5) as f32 * 0.5 - 1.0)
            .collect();
        let size = i64::from(INPUT_SIZE);

        let graph = pb::GraphProto {
            name: "channel_means".to_string(),
            node: vec![
                node("GlobalAveragePool", &["pixel_values"], "pooled"),
                node("Flatten", &["pooled"], "flat"),
                node("MatMul", &["flat", "weights"], "logits"),
            ],
            initializer: vec![pb::TensorProto {
                name: "weights".to_string(),
                dims: vec![3, labels as i64],
                data_type: DataType::Float as i32,
                float_data: weights,
                ..Default::default()
            }],
            input: vec![float_input("pixel_values", &[1, 3, size, size])],
            output: vec![pb::ValueInfoProto {
                name: "logits".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let proto = pb::ModelProto {
            ir_version: 7,
            opset_import: vec![pb::OperatorSetIdProto {
                domain: String::new(),
                version: 13,
            }],
            graph: Some(graph),
            ..Default::default()
        };

        tract_onnx::onnx().model_for_proto_model(&proto).unwrap()
    }

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
        RgbImage::from_fn(40, 30, |x, y| Rgb([(x * 6) as u8, (y * 8) as u8, 120]))
    }

    #[test]
    fn test_model_output_becomes_distribution() {
        let classifier =
            TractOnnxClassifier::from_model(channel_mean_model(LesionLabel::ALL.len()), &config())
                .unwrap();

        let result = classifier.classify(&decoded(gradient())).unwrap();
        assert!(result.covers_label_set());
        assert!((result.probability_sum() - 1.0).abs() <= 1e-4);
        assert_eq!(result.predictions()[0].label, LesionLabel::ALL[0]);

        // the same image always gets the same scores
        assert_eq!(result, classifier.classify(&decoded(gradient())).unwrap());

        let other = classifier
            .classify(&decoded(RgbImage::from_pixel(5, 5, Rgb([250, 10, 10]))))
            .unwrap();
        assert_ne!(result, other);
    }

    #[test]
    fn test_wrong_label_count_is_output_shape_error() {
        let classifier = TractOnnxClassifier::from_model(channel_mean_model(4), &config()).unwrap();

        let error = classifier.classify(&decoded(gradient())).unwrap_err();
        match error {
            InferenceError::OutputShape { expected, shape } => {
                assert_eq!(expected, 7);
                assert_eq!(shape, vec![1, 4]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_model_fails_to_load() {
        let config = ModelConfig {
            onnx_model_path: PathBuf::from("does/not/exist.onnx"),
            ..ModelConfig::default()
        };
        let error = TractOnnxClassifier::load(&config).err().unwrap();
        assert!(matches!(error, AppError::ModelLoad { .. }));
        assert!(error.to_string().contains("does/not/exist.onnx"));
    }
}
