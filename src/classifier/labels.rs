use serde::Serialize;
use std::{fmt, str::FromStr};

/// The seven lesion categories, in the classifier's native output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "&'static str")]
pub enum LesionLabel {
    BenignKeratosisLikeLesions,
    BasalCellCarcinoma,
    ActinicKeratoses,
    VascularLesions,
    MelanocyticNevi,
    Melanoma,
    Dermatofibroma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LabelMetadata {
    pub id: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
}

impl LesionLabel {
    pub const ALL: [LesionLabel; 7] = [
        LesionLabel::BenignKeratosisLikeLesions,
        LesionLabel::BasalCellCarcinoma,
        LesionLabel::ActinicKeratoses,
        LesionLabel::VascularLesions,
        LesionLabel::MelanocyticNevi,
        LesionLabel::Melanoma,
        LesionLabel::Dermatofibroma,
    ];

    /// Position in the model's output vector.
    pub fn index(&self) -> usize {
        *self as usize
    }

    #[cfg(test)]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn id(&self) -> &'static str {
        self.metadata().id
    }

    pub fn display_name(&self) -> &'static str {
        self.metadata().display_name
    }

    pub fn description(&self) -> &'static str {
        self.metadata().description
    }

    pub fn metadata(&self) -> &'static LabelMetadata {
        &LABEL_METADATA[self.index()]
    }
}

impl From<LesionLabel> for &'static str {
    fn from(label: LesionLabel) -> Self {
        label.id()
    }
}

impl fmt::Display for LesionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown lesion label '{}'", self.0)
    }
}

impl std::error::Error for UnknownLabel {}

impl FromStr for LesionLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.id() == s)
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

/// Static reference data, indexed by [`LesionLabel::index`].
pub static LABEL_METADATA: [LabelMetadata; 7] = [
    LabelMetadata {
        id: "benign_keratosis-like_lesions",
        display_name: "Benign Keratosis-like Lesions",
        description: "Benign keratosis-like lesions encompass skin conditions such as seborrheic \
            keratosis, lichen planus-like keratosis, and solar lentigo. These lesions are \
            non-cancerous and appear as warty, rough, or pigmented growths on the skin. They \
            are generally harmless but may resemble malignant growths, warranting careful \
            clinical evaluation.",
    },
    LabelMetadata {
        id: "basal_cell_carcinoma",
        display_name: "Basal Cell Carcinoma",
        description: "Basal cell carcinoma (BCC) is the most common form of skin cancer, \
            originating in the basal cells of the epidermis. BCC is typically slow-growing and \
            rarely metastasizes but can cause significant local tissue damage if untreated. It \
            often appears as pearly, flesh-colored bumps or patches with visible blood vessels.",
    },
    LabelMetadata {
        id: "actinic_keratoses",
        display_name: "Actinic Keratoses",
        description: "Actinic keratoses (AK) are precancerous skin lesions caused by long-term \
            sun exposure. These lesions appear as rough, scaly patches or plaques, usually on \
            sun-exposed areas like the face, hands, and scalp. Without treatment, AKs may \
            progress to squamous cell carcinoma.",
    },
    LabelMetadata {
        id: "vascular_lesions",
        display_name: "Vascular Lesions",
        description: "Vascular lesions are abnormalities of the blood vessels, including \
            hemangiomas, spider angiomas, and port-wine stains. They may be congenital or \
            acquired and range from benign conditions to those associated with systemic \
            diseases. These lesions can appear red, purple, or bluish and are often treated for \
            cosmetic or medical reasons.",
    },
    LabelMetadata {
        id: "melanocytic_Nevi",
        display_name: "Melanocytic Nevi",
        description: "Melanocytic nevi, commonly known as moles, are benign proliferations of \
            melanocytes, the pigment-producing cells in the skin. They vary in size, shape, and \
            color and are usually round or oval. While most moles are harmless, some may \
            develop atypical features and require monitoring for melanoma risk.",
    },
    LabelMetadata {
        id: "melanoma",
        display_name: "Melanoma",
        description: "Melanoma is an aggressive form of skin cancer arising from melanocytes. It \
            can spread to other parts of the body if not detected and treated early. Common \
            signs include asymmetrical moles, irregular borders, multiple colors, large \
            diameters, and evolving features (ABCDE criteria).",
    },
    LabelMetadata {
        id: "dermatofibroma",
        display_name: "Dermatofibroma",
        description: "Dermatofibroma is a benign, fibrous growth often caused by minor skin \
            injuries like insect bites. These small, firm nodules are usually found on the \
            extremities and are asymptomatic but may occasionally cause itching or discomfort. \
            Dermatofibromas are generally harmless and require treatment only for cosmetic \
            concerns.",
    },
];
