pub mod cookie;
pub mod handlers;
pub mod interactions;
pub mod server;

pub use server::{Server, ServerBuilder};

use crate::{
    classifier::ClassifierHandle,
    config::SessionConfig,
    intake::ImageAcquirer,
    session::{ResolvedSession, SessionStore},
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderMap, HeaderName},
    response::AppendHeaders,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Room for the multipart framing around an upload of the maximum size.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub acquirer: ImageAcquirer,
    pub classifier: ClassifierHandle,
    pub cookie_name: Arc<str>,
}

impl AppState {
    pub fn new(
        sessions: Arc<SessionStore>,
        acquirer: ImageAcquirer,
        classifier: ClassifierHandle,
        config: &SessionConfig,
    ) -> Self {
        Self {
            sessions,
            acquirer,
            classifier,
            cookie_name: Arc::from(config.cookie_name.as_str()),
        }
    }

    pub(crate) fn resolve_session(&self, headers: &HeaderMap) -> ResolvedSession {
        self.sessions
            .resolve(cookie::session_id(headers, &self.cookie_name))
    }

    /// `Set-Cookie` for sessions created by this request, nothing otherwise.
    pub(crate) fn session_cookie(
        &self,
        session: &ResolvedSession,
    ) -> AppendHeaders<Option<(HeaderName, String)>> {
        AppendHeaders(session.created.then(|| {
            (
                header::SET_COOKIE,
                cookie::session_cookie(&self.cookie_name, session.id),
            )
        }))
    }
}

pub fn router(state: AppState, max_payload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/fetch", post(handlers::fetch))
        .route("/panels/{label}/toggle", post(handlers::toggle_panel))
        .route("/session/reset", post(handlers::reset))
        .route("/image", get(handlers::image))
        .route("/api/labels", get(handlers::labels))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(
            max_payload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
