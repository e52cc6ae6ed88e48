//! Response-shape normalization.
//!
//! The Space's result tuple carries the image in one of three shapes: a
//! structured value with `path`/`url` fields, a bare string, or nothing
//! usable at all. This module collapses them into a single [`ImageRef`]
//! the handler can serialize, re-encoding local files as base64 data URIs.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use tracing::debug;

use crate::types::{ImageHandle, ImageRef};
use crate::{PictorError, Result};

/// Classify the first element of the Space's result tuple.
///
/// Anything that is neither an object nor a non-empty string has no usable
/// image reference and is rejected here rather than flowing downstream.
pub fn classify(value: &Value) -> Result<ImageHandle> {
    match value {
        Value::Object(map) => Ok(ImageHandle::Structured {
            path: non_empty_string(map.get("path")),
            url: non_empty_string(map.get("url")),
        }),
        Value::String(s) if !s.is_empty() => Ok(ImageHandle::Bare(s.clone())),
        _ => Err(PictorError::NoImageReturned),
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Resolve a classified handle into something the browser can display.
///
/// `path` wins over `url`. A reference naming an existing local file is read
/// and inlined as base64; anything else is passed through verbatim as a
/// remote URL.
pub async fn resolve(handle: ImageHandle) -> Result<ImageRef> {
    let reference = match handle {
        ImageHandle::Structured { path, url } => {
            path.or(url).ok_or(PictorError::NoImageReturned)?
        }
        ImageHandle::Bare(reference) => reference,
    };

    if Path::new(&reference).exists() {
        let bytes = tokio::fs::read(&reference).await?;
        debug!(path = %reference, bytes = bytes.len(), "inlining local image");
        Ok(ImageRef::Inline {
            media_type: sniff_media_type(&reference).to_string(),
            data: STANDARD.encode(bytes),
        })
    } else {
        Ok(ImageRef::Remote { url: reference })
    }
}

/// Extension-based sniffing, defaulting to PNG for anything unrecognized.
pub fn sniff_media_type(reference: &str) -> &'static str {
    if reference.ends_with(".jpg") || reference.ends_with(".jpeg") {
        "image/jpeg"
    } else if reference.ends_with(".webp") {
        "image/webp"
    } else {
        "image/png"
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    #[test]
    fn sniffs_media_type_by_extension() {
        assert_eq!(sniff_media_type("/tmp/a.jpg"), "image/jpeg");
        assert_eq!(sniff_media_type("/tmp/a.jpeg"), "image/jpeg");
        assert_eq!(sniff_media_type("/tmp/a.webp"), "image/webp");
        assert_eq!(sniff_media_type("/tmp/a.png"), "image/png");
        assert_eq!(sniff_media_type("/tmp/a.gif"), "image/png");
        assert_eq!(sniff_media_type("/tmp/no-extension"), "image/png");
    }

    #[test]
    fn classifies_structured_values() -> Result<()> {
        let handle = classify(&json!({"path": "/tmp/a.png", "url": "https://x/a.png"}))?;
        assert_eq!(
            handle,
            ImageHandle::Structured {
                path: Some("/tmp/a.png".to_string()),
                url: Some("https://x/a.png".to_string()),
            }
        );

        // Empty strings count as absent, matching the upstream API's nulls.
        let handle = classify(&json!({"path": "", "url": "https://x/a.png"}))?;
        assert_eq!(
            handle,
            ImageHandle::Structured {
                path: None,
                url: Some("https://x/a.png".to_string()),
            }
        );
        Ok(())
    }

    #[test]
    fn classifies_bare_strings() -> Result<()> {
        let handle = classify(&json!("https://x/a.png"))?;
        assert_eq!(handle, ImageHandle::Bare("https://x/a.png".to_string()));
        Ok(())
    }

    #[test]
    fn rejects_unusable_shapes() {
        for value in [json!(null), json!(""), json!(42), json!([1, 2])] {
            match classify(&value) {
                Err(PictorError::NoImageReturned) => {}
                other => panic!("expected NoImageReturned for {value}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn resolve_prefers_path_over_url() -> Result<()> {
        let resolved = resolve(ImageHandle::Structured {
            path: Some("/nonexistent/a.png".to_string()),
            url: Some("https://x/a.png".to_string()),
        })
        .await?;
        assert_eq!(
            resolved,
            ImageRef::Remote {
                url: "/nonexistent/a.png".to_string()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn resolve_falls_back_to_url() -> Result<()> {
        let resolved = resolve(ImageHandle::Structured {
            path: None,
            url: Some("https://x/a.png".to_string()),
        })
        .await?;
        assert_eq!(
            resolved,
            ImageRef::Remote {
                url: "https://x/a.png".to_string()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn resolve_rejects_empty_structured_values() {
        let result = resolve(ImageHandle::Structured {
            path: None,
            url: None,
        })
        .await;
        match result {
            Err(PictorError::NoImageReturned) => {}
            other => panic!("expected NoImageReturned, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resolve_inlines_existing_local_files() -> Result<()> {
        let payload = b"not really a jpeg";
        let mut file = tempfile::Builder::new()
            .suffix(".jpg")
            .tempfile()
            .expect("tempfile");
        file.write_all(payload).expect("write");

        let path = file.path().to_str().expect("utf-8 path").to_string();
        let resolved = resolve(ImageHandle::Bare(path)).await?;
        match resolved {
            ImageRef::Inline { media_type, data } => {
                assert_eq!(media_type, "image/jpeg");
                assert_eq!(STANDARD.decode(data).expect("base64"), payload);
            }
            other => panic!("expected inline image, got {other:?}"),
        }
        Ok(())
    }
}
