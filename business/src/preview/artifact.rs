use std::sync::Arc;

use crate::QrFormat;

/// Bytes of a generated image with their media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub bytes: Arc<[u8]>,
    pub mime: String,
}

impl Payload {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// The current generation result.
///
/// Raster results only reference the remote image; their payload is fetched
/// on the first download or copy. Vector results always carry the sanitized
/// markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrArtifact {
    pub generation: u64,
    pub format: QrFormat,
    pub url: String,
    pub payload: Option<Payload>,
}

impl QrArtifact {
    pub fn raster(generation: u64, url: impl Into<String>) -> Self {
        Self {
            generation,
            format: QrFormat::Png,
            url: url.into(),
            payload: None,
        }
    }

    pub fn vector(generation: u64, url: impl Into<String>, markup: String) -> Self {
        Self {
            generation,
            format: QrFormat::Svg,
            url: url.into(),
            payload: Some(Payload::new(markup.into_bytes(), QrFormat::Svg.mime())),
        }
    }

    /// URI for egui's image loaders. Vector markup is served from memory under
    /// a per-generation `bytes://` URI so a new result is never masked by the
    /// loader cache.
    pub fn image_uri(&self) -> String {
        match self.format {
            QrFormat::Png => self.url.clone(),
            QrFormat::Svg => format!("bytes://qr-{}.svg", self.generation),
        }
    }
}
