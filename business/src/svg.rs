//! Validation and sanitizing of SVG responses before they are rendered.

use ehttp::Response;

use crate::GenerateError;

/// Accepts `response` as an SVG document and returns its sanitized markup.
///
/// A body counts as SVG when the content type mentions `svg` or the trimmed
/// body starts with `<svg`.
pub fn inline_svg(response: &Response) -> Result<String, GenerateError> {
    if !response.ok {
        return Err(GenerateError::Http {
            status: response.status,
        });
    }

    let content_type = response.content_type().unwrap_or_default().to_owned();
    let body = String::from_utf8_lossy(&response.bytes);

    let svg_type = content_type.to_ascii_lowercase().contains("svg");
    if !svg_type && !body.trim_start().starts_with("<svg") {
        return Err(GenerateError::UnsupportedContent { content_type });
    }
    Ok(strip_scripts(&body))
}

/// Removes every `<script ...>...</script>` element, case-insensitively.
///
/// An unterminated script drops the rest of the document.
pub fn strip_scripts(markup: &str) -> String {
    const OPEN: &str = "<script";
    const CLOSE: &str = "</script>";

    // ASCII lowercasing keeps byte offsets aligned with `markup`.
    let lower = markup.to_ascii_lowercase();
    let mut out = String::with_capacity(markup.len());
    let mut cursor = 0;

    while let Some(found) = lower[cursor..].find(OPEN) {
        let start = cursor + found;
        out.push_str(&markup[cursor..start]);
        match lower[start..].find(CLOSE) {
            Some(end) => cursor = start + end + CLOSE.len(),
            None => return out,
        }
    }
    out.push_str(&markup[cursor..]);
    out
}
