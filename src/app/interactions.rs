use crate::{
    classifier::{ClassifierHandle, LesionLabel},
    error::{AcquireError, ErrorKind},
    intake::{parse_image_url, AcceptedFormat, ImageAcquirer},
    presenter::{render_page, PageView, Presentation, ResultsView},
    session::{Notice, SessionState},
};
use bytes::Bytes;
use tracing::{debug, warn};

/// A file as received from the upload form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Replaces the session's image with the uploaded file. The outcome is left
/// in the session's notice.
///
/// A declared type other than png, jpeg or webp is rejected before anything
/// changes. Past that check the current image is cleared first, so a failed
/// decode leaves no image behind.
pub fn submit_upload(state: &mut SessionState, acquirer: &ImageAcquirer, upload: &Upload) {
    let outcome = accept_upload(state, acquirer, upload);
    report(state, outcome, || format!("Loaded '{}'.", upload.file_name));
}

/// The upload body itself could not be read (too large, truncated or
/// malformed multipart). The previous image does not survive a failed
/// upload.
pub fn upload_unreadable(state: &mut SessionState, reason: &str) {
    warn!("Reading the upload failed: {}", reason);
    state.clear_image();
    state.set_notice(Notice::error(
        ErrorKind::InvalidImageData,
        format!("The upload could not be read: {}", reason),
    ));
}

fn accept_upload(
    state: &mut SessionState,
    acquirer: &ImageAcquirer,
    upload: &Upload,
) -> Result<(), AcquireError> {
    let format = AcceptedFormat::from_mime(&upload.content_type)?;
    state.clear_image();
    let image = acquirer.decode_upload(
        &upload.bytes,
        format,
        &upload.content_type,
        &upload.file_name,
    )?;
    state.set_image(image);
    Ok(())
}

/// Replaces the session's image with the one behind `raw_url`. The outcome
/// is left in the session's notice.
pub async fn submit_url(state: &mut SessionState, acquirer: &ImageAcquirer, raw_url: &str) {
    let outcome = accept_url(state, acquirer, raw_url).await;
    report(state, outcome, || "Loaded image from URL.".to_string());
}

async fn accept_url(
    state: &mut SessionState,
    acquirer: &ImageAcquirer,
    raw_url: &str,
) -> Result<(), AcquireError> {
    let url = parse_image_url(raw_url)?;
    state.clear_image();
    let image = acquirer.fetch_and_decode(url).await?;
    state.set_image(image);
    Ok(())
}

fn report(
    state: &mut SessionState,
    outcome: Result<(), AcquireError>,
    success: impl FnOnce() -> String,
) {
    match outcome {
        Ok(()) => state.set_notice(Notice::info(success())),
        Err(e) => {
            warn!("Image acquisition failed: {}", e);
            state.set_notice(Notice::error(e.kind(), e.to_string()));
        }
    }
}

/// Flips the description panel of `label`, returning whether it is now open.
pub fn toggle_panel(state: &mut SessionState, label: LesionLabel) -> bool {
    let open = state.panels_mut().toggle(label);
    debug!("Panel '{}' is now {}", label, if open { "open" } else { "closed" });
    open
}

/// Renders the page for one session.
///
/// The current image is classified afresh on every render. Each label shown
/// gets its panel entry registered, and the pending notice is consumed.
pub async fn render_session(state: &mut SessionState, classifier: &ClassifierHandle) -> String {
    let notice = state.take_notice();
    let image = state.current_image().cloned();

    let classification = match &image {
        Some(image) => Some(classifier.classify(image.clone()).await),
        None => None,
    };

    let presentation = match &classification {
        Some(Ok(result)) => {
            let presentation = Presentation::new(result);
            for prediction in presentation.ranking() {
                state.panels_mut().register(prediction.label);
            }
            Some(presentation)
        }
        _ => None,
    };

    let results = match (&classification, &presentation) {
        (Some(Err(error)), _) => ResultsView::Failed(error),
        (_, Some(presentation)) => ResultsView::Classified(presentation, classifier.source()),
        _ => ResultsView::Empty,
    };

    render_page(&PageView {
        notice: notice.as_ref(),
        image: image.as_deref(),
        results,
        panels: state.panels(),
    })
}
