//! `data:` URL encoding used for offline previews and browser blob persistence.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};

const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Bytes recovered from a data URL.
pub struct DecodedDataUrl {
    /// MIME type from the header, or `application/octet-stream`.
    pub mime: String,
    /// Decoded payload.
    pub bytes: Vec<u8>,
}

/// Encodes bytes as `data:{mime};base64,{payload}`.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    let mime = if mime.trim().is_empty() {
        FALLBACK_MIME
    } else {
        mime.trim()
    };
    format!("data:{mime};base64,{}", B64.encode(bytes))
}

/// Decodes a base64 data URL.
///
/// A missing or malformed MIME header falls back to `application/octet-stream`.
///
/// # Errors
///
/// Returns an error when there is no `,` separator or the payload is not valid base64.
pub fn decode_data_url(url: &str) -> Result<DecodedDataUrl, String> {
    let (header, payload) = url
        .split_once(',')
        .ok_or_else(|| "data URL has no payload separator".to_string())?;
    let mime = header
        .strip_prefix("data:")
        .and_then(|rest| rest.split(';').next())
        .map(str::trim)
        .filter(|mime| mime.contains('/'))
        .unwrap_or(FALLBACK_MIME)
        .to_string();
    let bytes = B64
        .decode(payload.trim())
        .map_err(|err| format!("data URL payload is not valid base64: {err}"))?;
    Ok(DecodedDataUrl { mime, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_mime_header() {
        assert_eq!(encode_data_url("text/plain", b"hi"), "data:text/plain;base64,aGk=");
        assert_eq!(
            encode_data_url(" ", b""),
            "data:application/octet-stream;base64,"
        );
    }

    #[test]
    fn decodes_payload_and_falls_back_on_missing_mime() {
        let decoded = decode_data_url("data:image/png;base64,AAEC").expect("decode");
        assert_eq!(decoded.mime, "image/png");
        assert_eq!(decoded.bytes, vec![0, 1, 2]);

        let bare = decode_data_url("data:;base64,aGk=").expect("decode bare");
        assert_eq!(bare.mime, "application/octet-stream");
        assert_eq!(bare.bytes, b"hi".to_vec());
    }

    #[test]
    fn rejects_missing_separator_and_bad_base64() {
        assert!(decode_data_url("data:text/plain;base64").is_err());
        let err = decode_data_url("data:text/plain;base64,@@@").expect_err("bad payload");
        assert!(err.contains("not valid base64"), "{err}");
    }
}
