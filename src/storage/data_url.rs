//! Helpers for `data:` URLs carrying base64 image payloads.

use base64::Engine;

/// MIME type assumed when nothing better is known.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Split a `data:<mime>;base64,<payload>` URL into its MIME type and payload.
///
/// Returns `None` for anything that is not a base64 data URL.
pub fn split_data_url(value: &str) -> Option<(&str, &str)> {
    let rest = value.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    Some((mime, payload))
}

/// Encode raw bytes as a base64 data URL.
///
/// The MIME type is sniffed from the bytes; `fallback_mime` is used when the
/// content is not recognized.
pub fn encode_data_url(bytes: &[u8], fallback_mime: Option<&str>) -> String {
    let mime = infer::get(bytes)
        .map(|kind| kind.mime_type())
        .or(fallback_mime)
        .unwrap_or(DEFAULT_IMAGE_MIME);
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime, payload)
}
