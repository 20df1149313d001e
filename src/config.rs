use crate::error::AppError;
use serde::Deserialize;
use std::{net::SocketAddr, path::PathBuf, time::Duration};

const DEFAULT_CONFIG_FILE: &str = "lesion-scan";
const ENV_PREFIX: &str = "LESION_SCAN";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub log_level: String,
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub intake: IntakeConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    /// ONNX export of the pretrained model, run with tract.
    Onnx,
    /// Model-free demo classifier based on color statistics. Opt-in only,
    /// its scores are not predictions of the pretrained model.
    Reference,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub backend: ClassifierBackend,
    pub onnx_model_path: PathBuf,
    pub input_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
    pub inference_timeout_secs: u64,
    pub max_concurrent_inferences: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub fetch_timeout_secs: u64,
    pub max_payload_bytes: usize,
    pub max_image_side: u32,
    pub max_decoder_alloc_bytes: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub idle_ttl_secs: u64,
    pub max_sessions: usize,
    pub cookie_name: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            intake: IntakeConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8501)),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::Onnx,
            onnx_model_path: PathBuf::from("models/skin_cancer_vit.onnx"),
            input_size: 224,
            // ViT image processor normalization
            mean: [0.5, 0.5, 0.5],
            std: [0.5, 0.5, 0.5],
            inference_timeout_secs: 30,
            max_concurrent_inferences: 4,
        }
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 10,
            max_payload_bytes: 10 * 1024 * 1024,
            max_image_side: 8192,
            max_decoder_alloc_bytes: 512 * 1024 * 1024,
            user_agent: format!("lesion-scan/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: 30 * 60,
            max_sessions: 1024,
            cookie_name: "lesion_scan_session".to_string(),
        }
    }
}

impl Configuration {
    /// Loads the configuration from an optional file layered under
    /// `LESION_SCAN__*` environment variables, e.g. `LESION_SCAN__MODEL__BACKEND=onnx`.
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        let file = match path {
            Some(path) => config::File::with_name(path),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let configuration: Configuration = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        configuration.validate()?;
        Ok(configuration)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AppError> {
        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(AppError::InvalidConfig(format!(
                "log_level '{}' is not one of trace, debug, info, warn or error",
                self.log_level
            )));
        }
        if self.model.input_size == 0 {
            return Err(AppError::InvalidConfig(
                "model.input_size must be greater than zero".to_string(),
            ));
        }
        if self.model.std.iter().any(|s| *s <= 0.0) {
            return Err(AppError::InvalidConfig(
                "model.std values must be positive".to_string(),
            ));
        }
        if self.model.max_concurrent_inferences == 0 {
            return Err(AppError::InvalidConfig(
                "model.max_concurrent_inferences must be at least 1".to_string(),
            ));
        }
        if self.intake.fetch_timeout_secs == 0 {
            return Err(AppError::InvalidConfig(
                "intake.fetch_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.intake.max_payload_bytes == 0 {
            return Err(AppError::InvalidConfig(
                "intake.max_payload_bytes must be greater than zero".to_string(),
            ));
        }
        if self.session.idle_ttl_secs == 0 {
            return Err(AppError::InvalidConfig(
                "session.idle_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.session.max_sessions == 0 {
            return Err(AppError::InvalidConfig(
                "session.max_sessions must be at least 1".to_string(),
            ));
        }
        if self.session.cookie_name.is_empty()
            || !self
                .session
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AppError::InvalidConfig(format!(
                "session.cookie_name '{}' is not a valid cookie name",
                self.session.cookie_name
            )));
        }
        Ok(())
    }

    /// The parsed `log_level`. Only meaningful after `validate` succeeded.
    pub fn log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

impl ModelConfig {
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }
}

impl IntakeConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl SessionConfig {
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration_is_valid() {
        let configuration = Configuration::default();
        assert!(configuration.validate().is_ok());
        assert_eq!(configuration.model.backend, ClassifierBackend::Onnx);
        assert_eq!(configuration.model.input_size, 224);
        assert_eq!(configuration.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut configuration = Configuration::default();
        configuration.model.max_concurrent_inferences = 0;
        assert!(configuration.validate().is_err());

        let mut configuration = Configuration::default();
        configuration.session.cookie_name = "bad cookie;".to_string();
        assert!(configuration.validate().is_err());
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let mut configuration = Configuration::default();
        configuration.log_level = "verbose".to_string();
        let error = configuration.validate().unwrap_err();
        assert!(matches!(error, AppError::InvalidConfig(_)));
        assert!(error.to_string().contains("verbose"));

        configuration.log_level = "WARN".to_string();
        assert!(configuration.validate().is_ok());
        assert_eq!(configuration.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_config_source_rejects_bad_log_level() {
        let configuration: Configuration = config::Config::builder()
            .add_source(config::File::from_str(
                "log_level = \"loud\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert!(configuration.validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let configuration: Configuration = config::Config::builder()
            .add_source(config::File::from_str(
                "log_level = \"debug\"\n[model]\nbackend = \"reference\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(configuration.model.backend, ClassifierBackend::Reference);
        assert_eq!(configuration.model.input_size, 224);
        assert_eq!(configuration.intake.fetch_timeout_secs, 10);
        assert_eq!(configuration.log_level(), tracing::Level::DEBUG);
    }
}
