use crate::presenter::ranking::{Presentation, RankedPrediction};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

const ROW_HEIGHT: u32 = 28;
const BAR_HEIGHT: u32 = 18;
const LABEL_WIDTH: u32 = 230;
const BAR_WIDTH: f32 = 320.0;
const VALUE_WIDTH: u32 = 70;

/// Horizontal bar chart of every label's probability.
///
/// Rows are laid out from the bottom up in chart order, so the most likely
/// label ends up on top.
pub fn render_bar_chart(presentation: &Presentation) -> String {
    let rows: Vec<&RankedPrediction> = presentation.chart_order().collect();
    let height = ROW_HEIGHT * rows.len() as u32;
    let width = LABEL_WIDTH + BAR_WIDTH as u32 + VALUE_WIDTH;
    let top_label = presentation.top().label;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg class="chart" role="img" aria-label="Prediction confidence" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );

    for (position, row) in rows.iter().enumerate() {
        let y = height - ROW_HEIGHT * (position as u32 + 1);
        let bar_y = y + (ROW_HEIGHT - BAR_HEIGHT) / 2;
        let text_y = y + ROW_HEIGHT / 2 + 4;
        let bar_width = (row.probability.clamp(0.0, 1.0) * BAR_WIDTH).round();
        let class = if row.label == top_label { "bar top" } else { "bar" };

        let _ = write!(
            svg,
            r#"<g data-label="{id}"><text x="0" y="{text_y}">{name}</text><rect class="{class}" x="{LABEL_WIDTH}" y="{bar_y}" width="{bar_width}" height="{BAR_HEIGHT}"></rect><text x="{value_x}" y="{text_y}">{value}</text></g>"#,
            id = encode_double_quoted_attribute(row.label.id()),
            name = encode_text(row.label.display_name()),
            value_x = LABEL_WIDTH as f32 + bar_width + 6.0,
            value = row.percentage(),
        );
    }

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassificationResult, LesionLabel, Prediction};

    #[test]
    fn test_most_likely_label_is_drawn_on_top() {
        let result = ClassificationResult::new(vec![
            Prediction {
                label: LesionLabel::Melanoma,
                probability: 0.2,
            },
            Prediction {
                label: LesionLabel::MelanocyticNevi,
                probability: 0.8,
            },
        ])
        .unwrap();
        let svg = render_bar_chart(&Presentation::new(&result));

        // the top row (y = 0) comes last in document order
        let melanoma = svg.find(r#"data-label="melanoma""#).unwrap();
        let nevi = svg.find(r#"data-label="melanocytic_Nevi""#).unwrap();
        assert!(melanoma < nevi);
        assert!(svg.contains(r#"<rect class="bar top" x="230" y="5""#));
        assert!(svg.contains(r#"<rect class="bar" x="230" y="33""#));
        assert!(svg.contains("80.00%"));
        assert!(svg.starts_with("<svg") && svg.ends_with("</svg>"));
    }
}
