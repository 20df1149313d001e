pub mod chart;
pub mod content;
pub mod ranking;
pub mod render;

pub use ranking::{format_percentage, Presentation, RankedPrediction};
pub use render::{render_page, render_results, PageView, ResultsView};
