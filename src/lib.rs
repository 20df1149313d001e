pub mod app;
pub mod classifier;
pub mod config;
pub mod error;
pub mod intake;
pub mod presenter;
pub mod session;

pub use error::{AcquireError, AppError, ErrorKind, FetchFailure, InferenceError};
