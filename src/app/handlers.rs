use crate::{
    app::{
        cookie,
        interactions::{self, Upload},
        AppState,
    },
    classifier::{LesionLabel, PredictionSource, LABEL_METADATA},
    session::Notice,
};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct UrlForm {
    #[serde(default)]
    pub url: String,
}

pub async fn index(State(app): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let session = app.resolve_session(&headers);
    let html = {
        let mut state = session.state.lock().await;
        interactions::render_session(&mut state, &app.classifier).await
    };
    (
        app.session_cookie(&session),
        [(header::CACHE_CONTROL, "no-store")],
        Html(html),
    )
}

pub async fn upload(
    State(app): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> impl IntoResponse {
    let session = app.resolve_session(&headers);
    let received = read_upload(multipart).await;

    {
        let mut state = session.state.lock().await;
        match received {
            Ok(Some(upload)) => interactions::submit_upload(&mut state, &app.acquirer, &upload),
            Ok(None) => state.set_notice(Notice::info("Choose a file to upload first.")),
            Err(e) => interactions::upload_unreadable(&mut state, &e.body_text()),
        }
    }

    (app.session_cookie(&session), Redirect::to("/"))
}

/// Returns the last non-empty `file` field of the form.
async fn read_upload(mut multipart: Multipart) -> Result<Option<Upload>, MultipartError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;

        // browsers send an empty part when no file was picked
        if file_name.is_empty() && bytes.is_empty() {
            continue;
        }
        upload = Some(Upload {
            file_name,
            content_type,
            bytes,
        });
    }
    Ok(upload)
}

pub async fn fetch(
    State(app): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<UrlForm>,
) -> impl IntoResponse {
    let session = app.resolve_session(&headers);
    {
        let mut state = session.state.lock().await;
        interactions::submit_url(&mut state, &app.acquirer, &form.url).await;
    }
    (app.session_cookie(&session), Redirect::to("/"))
}

pub async fn toggle_panel(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(label): Path<String>,
) -> Response {
    let Ok(label) = label.parse::<LesionLabel>() else {
        return (StatusCode::NOT_FOUND, "Unknown label").into_response();
    };

    let session = app.resolve_session(&headers);
    {
        let mut state = session.state.lock().await;
        interactions::toggle_panel(&mut state, label);
    }

    let location = format!("/#label-{}", label.id());
    (app.session_cookie(&session), Redirect::to(&location)).into_response()
}

pub async fn reset(State(app): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(id) = cookie::session_id(&headers, &app.cookie_name) {
        app.sessions.end(&id);
    }
    (
        AppendHeaders([(header::SET_COOKIE, cookie::expired_cookie(&app.cookie_name))]),
        Redirect::to("/"),
    )
}

/// A bounded preview of the session's current image, as PNG.
pub async fn image(State(app): State<AppState>, headers: HeaderMap) -> Response {
    let Some(handle) =
        cookie::session_id(&headers, &app.cookie_name).and_then(|id| app.sessions.get(&id))
    else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let Some(image) = handle.lock().await.current_image().cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match image.preview_png() {
        Ok(png) => (
            [
                (header::CONTENT_TYPE, "image/png"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            png,
        )
            .into_response(),
        Err(e) => {
            error!("Encoding the preview failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn labels() -> impl IntoResponse {
    Json(&LABEL_METADATA[..])
}

pub async fn health(State(app): State<AppState>) -> impl IntoResponse {
    let stats = app.sessions.stats();
    Json(json!({
        "status": "ok",
        "classifier": app.classifier.name(),
        "demo_classifier": app.classifier.source() == PredictionSource::Demo,
        "active_sessions": stats.active_sessions,
        "max_sessions": stats.max_sessions,
    }))
}
