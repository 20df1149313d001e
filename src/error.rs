use std::net::SocketAddr;
use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to load classifier model from {path}: {reason}")]
    ModelLoad { path: String, reason: String },
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("Failed to bind to {1}: {0}")]
    Bind(#[source] std::io::Error, SocketAddr),
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// The user-facing error categories. Every error shown on the page belongs
/// to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedFormat,
    InvalidImageData,
    FetchError,
    InferenceError,
}

impl ErrorKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedFormat => "error-unsupported-format",
            ErrorKind::InvalidImageData => "error-invalid-image",
            ErrorKind::FetchError => "error-fetch",
            ErrorKind::InferenceError => "error-inference",
        }
    }
}

// Image acquisition error type
#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("Unsupported file type '{declared}'. Please upload a PNG, JPEG or WEBP image.")]
    UnsupportedFormat { declared: String },
    #[error("The provided data is not a valid image: {0}")]
    InvalidImageData(#[source] image::ImageError),
    #[error("Could not fetch an image from '{url}': {cause}")]
    Fetch {
        url: String,
        #[source]
        cause: FetchFailure,
    },
}

impl AcquireError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AcquireError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            AcquireError::InvalidImageData(_) => ErrorKind::InvalidImageData,
            AcquireError::Fetch { .. } => ErrorKind::FetchError,
        }
    }

    pub fn fetch(url: impl Into<String>, cause: FetchFailure) -> Self {
        AcquireError::Fetch {
            url: url.into(),
            cause,
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchFailure {
    #[error("not an absolute http(s) URL ({0})")]
    InvalidUrl(String),
    #[error("the server answered with HTTP status {0}")]
    Status(u16),
    #[error("the request timed out")]
    Timeout,
    #[error("the response is larger than {limit} bytes")]
    TooLarge { limit: usize },
    #[error("{0}")]
    Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for FetchFailure {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchFailure::Timeout
        } else if let Some(status) = error.status() {
            FetchFailure::Status(status.as_u16())
        } else {
            FetchFailure::Transport(error)
        }
    }
}

// Classifier boundary error type
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Model run failed: {0}")]
    Model(String),
    #[error("Unexpected model output: expected {expected} scores, got shape {shape:?}")]
    OutputShape { expected: usize, shape: Vec<usize> },
    #[error("Model produced an invalid distribution: {0}")]
    InvalidDistribution(String),
    #[error("Inference did not finish within {0:?}")]
    Timeout(std::time::Duration),
    #[error("Inference task failed: {0}")]
    Task(String),
}

impl InferenceError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InferenceError
    }

    /// The message shown to the user. The detail is logged, not displayed.
    pub fn user_message(&self) -> &'static str {
        "An error occurred while processing the image. Please try again or use a different photo."
    }
}
