use crate::error::AcquireError;
use image::ImageFormat;
use std::fmt;

/// Image containers accepted from the upload form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptedFormat {
    Png,
    Jpeg,
    Webp,
}

impl AcceptedFormat {
    pub const ALL: [AcceptedFormat; 3] = [
        AcceptedFormat::Png,
        AcceptedFormat::Jpeg,
        AcceptedFormat::Webp,
    ];

    /// Matches a declared MIME type, ignoring case and parameters.
    pub fn from_mime(declared: &str) -> Result<Self, AcquireError> {
        let essence = declared
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "image/png" => Ok(AcceptedFormat::Png),
            // image/jpg is not registered but browsers and tools still send it
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Ok(AcceptedFormat::Jpeg),
            "image/webp" => Ok(AcceptedFormat::Webp),
            _ => Err(AcquireError::UnsupportedFormat {
                declared: declared.to_string(),
            }),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AcceptedFormat::Png => "image/png",
            AcceptedFormat::Jpeg => "image/jpeg",
            AcceptedFormat::Webp => "image/webp",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            AcceptedFormat::Png => ImageFormat::Png,
            AcceptedFormat::Jpeg => ImageFormat::Jpeg,
            AcceptedFormat::Webp => ImageFormat::WebP,
        }
    }

    /// Value for the `accept` attribute of the upload input.
    pub fn accept_attribute() -> String {
        Self::ALL
            .iter()
            .map(|format| format.mime_type())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for AcceptedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AcceptedFormat::Png => "PNG",
            AcceptedFormat::Jpeg => "JPEG",
            AcceptedFormat::Webp => "WEBP",
        };
        f.write_str(name)
    }
}
