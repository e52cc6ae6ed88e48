use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub image_url: String,
}

/// Image reference as the Space returns it, before normalization.
///
/// The first element of the result tuple is either a structured value
/// carrying `path`/`url` fields or a bare path-or-URL string, depending on
/// the Gradio version serving the Space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageHandle {
    Structured {
        path: Option<String>,
        url: Option<String>,
    },
    Bare(String),
}

/// Normalized image reference handed back to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Inline { media_type: String, data: String },
    Remote { url: String },
}

impl ImageRef {
    pub fn into_image_url(self) -> String {
        match self {
            Self::Inline { media_type, data } => format!("data:{media_type};base64,{data}"),
            Self::Remote { url } => url,
        }
    }
}
