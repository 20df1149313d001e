pub const PAGE_TITLE: &str = "Skin cancer recognition";

pub const INTRO: &str = "This app uses a machine learning model to classify skin lesions from a \
    photo. Upload a picture of your skin issue or paste a link to one.";

pub const DISCLAIMER: &str = "This is a demonstration, not a medical device. A prediction is not \
    a diagnosis: if a spot on your skin worries you, changes, itches or bleeds, see a \
    dermatologist.";

/// Shown with every result of the model-free demo classifier.
pub const DEMO_CLASSIFIER_NOTE: &str = "Demo classifier: these scores come from simple color \
    statistics, not from a model prediction.";

pub const SUN_SAFETY_TITLE: &str = "Sun safety";

pub const SUN_SAFETY_TIPS: [&str; 6] = [
    "Seek shade, especially between 10 a.m. and 4 p.m. when UV radiation is strongest.",
    "Use a broad-spectrum sunscreen with SPF 30 or higher and reapply every two hours, and \
        after swimming or sweating.",
    "Wear protective clothing, a wide-brimmed hat and UV-blocking sunglasses.",
    "Avoid tanning beds and deliberate tanning.",
    "Check your skin every month and look for new spots or spots that change in size, shape \
        or color.",
    "Remember the ABCDE rule for moles: Asymmetry, Border, Color, Diameter, Evolving.",
];

pub const STYLESHEET: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; color: #1f2933; }
h1 { margin-bottom: 0.25rem; }
section { margin: 1.5rem 0; }
.disclaimer { font-size: 0.9rem; color: #52606d; border-left: 4px solid #f0b429; padding-left: 0.75rem; }
.notice { padding: 0.75rem 1rem; border-radius: 6px; }
.notice.info { background: #e3f8ff; }
.notice.error { background: #ffe3e3; color: #8a1c1c; }
.notice.demo { background: #fff4d6; color: #6b4a00; }
form.inline { display: inline; }
.preview img { max-width: 100%; max-height: 24rem; border-radius: 6px; }
.details td { padding: 0.15rem 0.75rem 0.15rem 0; }
.top-prediction { font-size: 1.25rem; }
.chart text { font-size: 12px; fill: #1f2933; }
.chart rect.bar { fill: #3e7cb1; }
.chart rect.bar.top { fill: #d64545; }
.label-row { border-bottom: 1px solid #e4e7eb; padding: 0.5rem 0; }
.label-row .name { font-weight: 600; }
.label-row .description { margin: 0.5rem 0 0 0; color: #3e4c59; }
"#;
