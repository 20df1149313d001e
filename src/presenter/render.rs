use crate::{
    classifier::{LesionLabel, PredictionSource},
    error::InferenceError,
    intake::{AcceptedFormat, DecodedImage, ImageOrigin},
    presenter::{chart::render_bar_chart, content, ranking::Presentation},
    session::{Notice, NoticeLevel, PanelState},
};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

/// What the results area shows.
pub enum ResultsView<'a> {
    /// No image loaded.
    Empty,
    Classified(&'a Presentation, PredictionSource),
    /// Classification failed; no prediction UI at all.
    Failed(&'a InferenceError),
}

/// Everything needed to draw one page.
pub struct PageView<'a> {
    pub notice: Option<&'a Notice>,
    pub image: Option<&'a DecodedImage>,
    pub results: ResultsView<'a>,
    pub panels: &'a PanelState,
}

pub fn render_page(view: &PageView<'_>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>{title}</title><style>{style}</style></head><body>"#,
        title = content::PAGE_TITLE,
        style = content::STYLESHEET,
    );
    let _ = write!(
        html,
        r#"<header><h1>{}</h1><p>{}</p><p class="disclaimer">{}</p></header>"#,
        content::PAGE_TITLE,
        content::INTRO,
        content::DISCLAIMER
    );

    html.push_str(&render_forms());
    if let Some(notice) = view.notice {
        html.push_str(&render_notice(notice));
    }
    if let Some(image) = view.image {
        html.push_str(&render_image_details(image));
    }

    match view.results {
        ResultsView::Empty => {}
        ResultsView::Classified(presentation, source) => {
            html.push_str(&render_results(presentation, view.panels, source));
        }
        ResultsView::Failed(error) => {
            let _ = write!(
                html,
                r#"<section class="results"><p class="notice error {}">{}</p></section>"#,
                error.kind().css_class(),
                encode_text(error.user_message())
            );
        }
    }

    html.push_str(&render_reference_sections());
    html.push_str("</body></html>");
    html
}

fn render_forms() -> String {
    format!(
        r#"<section class="intake"><form method="post" action="/upload" enctype="multipart/form-data"><label>Import photo of your skin issue <input type="file" name="file" accept="{accept}" required></label> <button type="submit">Classify</button></form><form method="post" action="/fetch"><label>Or paste an image URL <input type="url" name="url" placeholder="https://" pattern="https?://.+" required></label> <button type="submit">Fetch</button></form><form method="post" action="/session/reset"><button type="submit">Start over</button></form></section>"#,
        accept = AcceptedFormat::accept_attribute()
    )
}

fn render_notice(notice: &Notice) -> String {
    let class = match notice.level {
        NoticeLevel::Info => "info".to_string(),
        NoticeLevel::Error(kind) => format!("error {}", kind.css_class()),
    };
    format!(
        r#"<p class="notice {}" role="status">{}</p>"#,
        class,
        encode_text(&notice.message)
    )
}

fn render_image_details(image: &DecodedImage) -> String {
    let mut rows: Vec<(&str, String)> = Vec::new();
    match image.origin() {
        ImageOrigin::Upload {
            file_name,
            declared_mime,
            size_bytes,
        } => {
            rows.push(("File name", file_name.clone()));
            rows.push(("File type", declared_mime.clone()));
            rows.push(("File size", format!("{} bytes", size_bytes)));
        }
        ImageOrigin::Url { url, size_bytes } => {
            rows.push(("URL", url.clone()));
            rows.push(("File size", format!("{} bytes", size_bytes)));
        }
    }
    if let Some(format) = image.detected_format() {
        rows.push(("Detected format", format!("{:?}", format)));
    }
    rows.push((
        "Dimensions",
        format!("{} x {} px", image.width(), image.height()),
    ));
    rows.push(("Color mode", format!("{:?}", image.source_color())));
    rows.push((
        "Received at",
        image.received_at().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    ));

    let mut html = String::from(
        r#"<section class="preview"><h2>Your image</h2><img src="/image" alt="Submitted skin lesion photo"><h3>File Details</h3><table class="details">"#,
    );
    for (name, value) in rows {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td></tr>",
            name,
            encode_text(&value)
        );
    }
    html.push_str("</table></section>");
    html
}

/// The prediction area. A pure function of the presentation, the panel
/// flags and where the scores came from.
pub fn render_results(
    presentation: &Presentation,
    panels: &PanelState,
    source: PredictionSource,
) -> String {
    let top = presentation.top();
    let mut html = String::from(r#"<section class="results"><h2>Prediction</h2>"#);
    if source == PredictionSource::Demo {
        let _ = write!(
            html,
            r#"<p class="notice demo" role="note">{}</p>"#,
            encode_text(content::DEMO_CLASSIFIER_NOTE)
        );
    }
    let _ = write!(
        html,
        r#"<p class="top-prediction">Most likely: <strong>{}</strong> ({})</p>"#,
        encode_text(top.label.display_name()),
        top.percentage()
    );
    html.push_str(&render_bar_chart(presentation));

    html.push_str(r#"<div class="labels">"#);
    for prediction in presentation.ranking() {
        html.push_str(&render_label_row(
            prediction.label,
            &prediction.percentage(),
            panels.is_open(prediction.label),
        ));
    }
    html.push_str("</div></section>");
    html
}

fn render_label_row(label: LesionLabel, percentage: &str, open: bool) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<div class="label-row" id="label-{id}"><span class="name">{name}</span>: <span class="probability">{percentage}</span> <form class="inline" method="post" action="/panels/{id}/toggle"><button type="submit" aria-expanded="{open}">{button}</button></form>"#,
        id = encode_double_quoted_attribute(label.id()),
        name = encode_text(label.display_name()),
        button = if open {
            "Hide description"
        } else {
            "Show description"
        },
    );
    if open {
        let _ = write!(
            html,
            r#"<p class="description">{}</p>"#,
            encode_text(label.description())
        );
    }
    html.push_str("</div>");
    html
}

fn render_reference_sections() -> String {
    let mut html = String::from(
        r#"<section class="reference"><h2>About lesion types</h2><dl>"#,
    );
    for label in LesionLabel::ALL {
        let _ = write!(
            html,
            "<dt>{}</dt><dd>{}</dd>",
            encode_text(label.display_name()),
            encode_text(label.description())
        );
    }
    html.push_str("</dl></section>");

    let _ = write!(
        html,
        r#"<section class="sun-safety"><h2>{}</h2><ul>"#,
        content::SUN_SAFETY_TITLE
    );
    for tip in content::SUN_SAFETY_TIPS {
        let _ = write!(html, "<li>{}</li>", encode_text(tip));
    }
    html.push_str("</ul></section>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassificationResult, Prediction};
    use crate::error::ErrorKind;
    use image::DynamicImage;

    fn presentation() -> Presentation {
        let result = ClassificationResult::new(vec![
            Prediction {
                label: LesionLabel::BenignKeratosisLikeLesions,
                probability: 0.05,
            },
            Prediction {
                label: LesionLabel::Melanoma,
                probability: 0.70,
            },
            Prediction {
                label: LesionLabel::Dermatofibroma,
                probability: 0.25,
            },
        ])
        .unwrap();
        Presentation::new(&result)
    }

    fn results_section(html: &str) -> &str {
        let start = html.find(r#"<div class="labels">"#).unwrap();
        let end = html[start..].find("</section>").unwrap();
        &html[start..start + end]
    }

    #[test]
    fn test_labels_listed_in_descending_order_with_percentages() {
        let html = render_results(&presentation(), &PanelState::new(), PredictionSource::Model);
        let list = results_section(&html);

        let melanoma = list.find("label-melanoma").unwrap();
        let dermatofibroma = list.find("label-dermatofibroma").unwrap();
        let benign = list.find("label-benign_keratosis-like_lesions").unwrap();
        assert!(melanoma < dermatofibroma && dermatofibroma < benign);

        assert!(html.contains("70.00%"));
        assert!(html.contains("25.00%"));
        assert!(html.contains("5.00%"));
        assert!(html.contains("Most likely: <strong>Melanoma</strong> (70.00%)"));
    }

    #[test]
    fn test_open_panel_renders_description_verbatim() {
        let mut panels = PanelState::new();
        let closed = render_results(&presentation(), &panels, PredictionSource::Model);
        assert!(!results_section(&closed).contains(LesionLabel::Melanoma.description()));

        panels.toggle(LesionLabel::Melanoma);
        let open = render_results(&presentation(), &panels, PredictionSource::Model);
        let list = results_section(&open);
        assert!(list.contains(&format!(
            r#"<p class="description">{}</p>"#,
            LesionLabel::Melanoma.description()
        )));
        assert!(!list.contains(LesionLabel::Dermatofibroma.description()));
        assert!(list.contains("Hide description"));
    }

    #[test]
    fn test_demo_scores_are_labelled_as_demo() {
        let panels = PanelState::new();
        let demo = render_results(&presentation(), &panels, PredictionSource::Demo);
        assert!(demo.contains(content::DEMO_CLASSIFIER_NOTE));
        assert!(demo.find(content::DEMO_CLASSIFIER_NOTE) < demo.find("Most likely"));

        let model = render_results(&presentation(), &panels, PredictionSource::Model);
        assert!(!model.contains(content::DEMO_CLASSIFIER_NOTE));
    }

    #[test]
    fn test_toggle_does_not_change_numbers() {
        let mut panels = PanelState::new();
        let before = render_results(&presentation(), &panels, PredictionSource::Model);
        panels.toggle(LesionLabel::Dermatofibroma);
        panels.toggle(LesionLabel::Dermatofibroma);
        let after = render_results(&presentation(), &panels, PredictionSource::Model);
        assert_eq!(before, after);
    }

    #[test]
    fn test_failed_classification_renders_no_prediction_ui() {
        let error = InferenceError::Model("boom".to_string());
        let panels = PanelState::new();
        let html = render_page(&PageView {
            notice: None,
            image: None,
            results: ResultsView::Failed(&error),
            panels: &panels,
        });

        assert!(html.contains(error.user_message()));
        assert!(html.contains(ErrorKind::InferenceError.css_class()));
        assert!(!html.contains("Most likely"));
        assert!(!html.contains("<svg"));
        assert!(!html.contains("boom"));
    }

    #[test]
    fn test_page_shows_details_and_escapes_user_input() {
        let image = DecodedImage::normalize(
            DynamicImage::new_rgba8(3, 2),
            None,
            ImageOrigin::Upload {
                file_name: "<script>.png".to_string(),
                declared_mime: "image/png".to_string(),
                size_bytes: 99,
            },
        );
        let notice = Notice::error(ErrorKind::FetchError, "bad <url> & \"quotes\"");
        let panels = PanelState::new();
        let html = render_page(&PageView {
            notice: Some(&notice),
            image: Some(&image),
            results: ResultsView::Empty,
            panels: &panels,
        });

        assert!(html.contains("&lt;script&gt;.png"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(r#"bad &lt;url&gt; &amp; "quotes""#));
        assert!(html.contains("99 bytes"));
        assert!(html.contains("3 x 2 px"));
        assert!(html.contains("Rgba8"));
        assert!(html.contains(&format!(
            "<tr><td>Received at</td><td>{}</td></tr>",
            image.received_at().format("%Y-%m-%d %H:%M:%S UTC")
        )));
        assert!(html.contains(content::SUN_SAFETY_TITLE));
        assert!(!html.contains("Most likely"));
    }
}
