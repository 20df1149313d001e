use crate::{
    classifier::{
        interface::{LesionClassifier, PredictionSource},
        result::ClassificationResult,
    },
    config::ModelConfig,
    error::InferenceError,
    intake::DecodedImage,
};
use futures::future::BoxFuture;
use std::{
    sync::Arc,
    task::{Context, Poll},
    time::{Duration, Instant},
};
use tokio::sync::Semaphore;
use tower::{limit::GlobalConcurrencyLimitLayer, BoxError, Service, ServiceBuilder, ServiceExt};
use tracing::{debug, error};

/// Runs a [`LesionClassifier`] on the blocking thread pool.
#[derive(Clone)]
pub struct ClassificationService {
    classifier: Arc<dyn LesionClassifier>,
}

impl ClassificationService {
    pub fn new(classifier: Arc<dyn LesionClassifier>) -> Self {
        Self { classifier }
    }
}

impl Service<Arc<DecodedImage>> for ClassificationService {
    type Response = ClassificationResult;
    type Error = InferenceError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, image: Arc<DecodedImage>) -> Self::Future {
        let classifier = self.classifier.clone();

        Box::pin(async move {
            let started = Instant::now();
            let result = tokio::task::spawn_blocking(move || classifier.classify(&image))
                .await
                .map_err(|e| InferenceError::Task(e.to_string()))??;
            debug!("Classification finished in {}us", started.elapsed().as_micros());
            Ok(result)
        })
    }
}

/// Shared entry point to the classifier: every call goes through a
/// process-wide concurrency limit and a per-call timeout.
#[derive(Clone)]
pub struct ClassifierHandle {
    service: ClassificationService,
    name: &'static str,
    source: PredictionSource,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl ClassifierHandle {
    pub fn new(classifier: Arc<dyn LesionClassifier>, config: &ModelConfig) -> Self {
        Self {
            name: classifier.name(),
            source: classifier.source(),
            service: ClassificationService::new(classifier),
            permits: Arc::new(Semaphore::new(config.max_concurrent_inferences)),
            timeout: config.inference_timeout(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn source(&self) -> PredictionSource {
        self.source
    }

    pub async fn classify(
        &self,
        image: Arc<DecodedImage>,
    ) -> Result<ClassificationResult, InferenceError> {
        let timeout = self.timeout;
        ServiceBuilder::new()
            .map_err(inference_error_mapper(timeout))
            .layer(GlobalConcurrencyLimitLayer::with_semaphore(
                self.permits.clone(),
            ))
            .timeout(timeout)
            .service(self.service.clone())
            .oneshot(image)
            .await
            .inspect_err(|e| error!("Classification with '{}' failed: {}", self.name, e))
    }
}

fn inference_error_mapper(timeout: Duration) -> impl FnOnce(BoxError) -> InferenceError + Clone {
    move |e: BoxError| into_inference_error(e, timeout)
}

fn into_inference_error(error: BoxError, timeout: Duration) -> InferenceError {
    if error.is::<tower::timeout::error::Elapsed>() {
        return InferenceError::Timeout(timeout);
    }
    match error.downcast::<InferenceError>() {
        Ok(inference_error) => *inference_error,
        Err(other) => InferenceError::Task(other.to_string()),
    }
}
