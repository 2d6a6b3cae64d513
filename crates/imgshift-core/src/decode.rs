//! Inline payload decoding.
//!
//! Accepts `data:<mime>;base64,<data>` URIs and bare base64 strings. Padding is
//! optional, non-zero trailing bits are discarded and embedded whitespace is
//! ignored, matching how browsers accept stored payloads.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::classify::INLINE_PREFIX;
use crate::error::DecodeError;

/// MIME type assumed for payloads without a `data:` prefix.
pub const DEFAULT_MIME: &str = "image/jpeg";

const BASE64_MARKER: &str = ";base64,";

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Binary image recovered from an inline payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Raw image bytes.
    pub bytes: Vec<u8>,
    /// MIME type, either from the prefix or [`DEFAULT_MIME`].
    pub mime: String,
}

impl DecodedImage {
    /// File extension matching the MIME type, used for upload filenames.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime)
    }
}

/// File extension for an image MIME type, `bin` when unknown.
#[must_use]
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/avif" => "avif",
        "image/bmp" => "bmp",
        _ => "bin",
    }
}

/// Split `data:<mime>;base64,<data>` into its MIME type and body.
pub(crate) fn split_data_uri(payload: &str) -> Option<(&str, &str)> {
    let rest = payload.strip_prefix(INLINE_PREFIX)?;
    let (mime, data) = rest.split_once(BASE64_MARKER)?;
    if mime.is_empty() || mime.contains(',') {
        return None;
    }
    Some((mime, data))
}

/// Decode an inline payload into bytes and a MIME type.
///
/// # Errors
///
/// Returns [`DecodeError::EmptyPayload`] when no data remains and
/// [`DecodeError::InvalidBase64`] when the body is not valid base64.
pub fn decode(payload: &str) -> Result<DecodedImage, DecodeError> {
    let payload = payload.trim();
    let (mime, body) = split_data_uri(payload).unwrap_or((DEFAULT_MIME, payload));

    let compact: String = body.chars().filter(|ch| !ch.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let bytes = LENIENT
        .decode(compact.as_bytes())
        .map_err(|source| DecodeError::InvalidBase64 { source })?;

    Ok(DecodedImage {
        bytes,
        mime: mime.to_string(),
    })
}
