use crate::{
    app::{router, AppState},
    classifier::{self, ClassifierHandle, LesionClassifier},
    config::Configuration,
    error::AppError,
    intake::{HttpImageFetcher, ImageAcquirer, ImageFetcher},
    session::SessionStore,
};
use axum::Router;
use std::{future::Future, net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

/// A bound, ready-to-run HTTP server.
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
}

impl Server {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves until Ctrl-C.
    pub async fn run(self) -> Result<(), AppError> {
        self.run_until(shutdown_signal()).await
    }

    /// Serves until `shutdown` completes, then lets in-flight requests finish.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Serving on http://{}", self.local_addr);

        let result = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(AppError::Serve);

        info!("Server stopped");
        result
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            // without a signal handler the server runs until killed
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

pub struct ServerBuilder {
    configuration: Option<Configuration>,
    classifier: Option<Arc<dyn LesionClassifier>>,
    fetcher: Option<Arc<dyn ImageFetcher>>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            configuration: None,
            classifier: None,
            fetcher: None,
        }
    }

    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Uses `classifier` instead of loading the configured backend.
    pub fn with_classifier(mut self, classifier: Arc<dyn LesionClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn ImageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Loads the classifier and binds the listener. Any failure here is fatal.
    pub async fn build(self) -> Result<Server, AppError> {
        let configuration = self.configuration.unwrap_or_default();
        configuration.validate()?;

        let classifier = match self.classifier {
            Some(classifier) => classifier,
            None => classifier::load(&configuration.model)?,
        };
        let fetcher: Arc<dyn ImageFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpImageFetcher::new(&configuration.intake)?),
        };

        let state = AppState::new(
            Arc::new(SessionStore::new(&configuration.session)),
            ImageAcquirer::new(fetcher, &configuration.intake),
            ClassifierHandle::new(classifier, &configuration.model),
            &configuration.session,
        );

        let bind_address = configuration.server.bind_address;
        let listener = TcpListener::bind(bind_address)
            .await
            .map_err(|e| AppError::Bind(e, bind_address))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| AppError::Bind(e, bind_address))?;

        Ok(Server {
            listener,
            local_addr,
            router: router(state, configuration.intake.max_payload_bytes),
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
