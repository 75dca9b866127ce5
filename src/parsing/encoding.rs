use std::borrow::Cow;

use base64::{prelude::BASE64_STANDARD, Engine};

use crate::parsing::records::ParseError;

/// Scheme prefix of a data URI (`data:text/plain;base64,<payload>`)
pub const DATA_URI_PREFIX: &str = "data:";

const BASE64_MARKER: &str = ";base64";

/// Check whether `raw` is a base64 data URI, as produced by browser uploads.
#[must_use]
pub fn is_base64_data_uri(raw: &str) -> bool {
    raw.trim_start()
        .strip_prefix(DATA_URI_PREFIX)
        .and_then(|rest| rest.split_once(','))
        .is_some_and(|(media_type, _)| media_type.ends_with(BASE64_MARKER))
}

/// Unwrap a base64 data URI into its text payload; any other input is
/// returned unchanged.
///
/// # Errors
///
/// Returns `ParseError::Decode` if the payload is not valid base64 or does not
/// decode to UTF-8 text.
pub fn decode_input(raw: &str) -> Result<Cow<'_, str>, ParseError> {
    if !is_base64_data_uri(raw) {
        return Ok(Cow::Borrowed(raw));
    }

    let payload = raw
        .split_once(',')
        .map_or("", |(_, payload)| payload);

    // Uploads may wrap long payloads across lines
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = BASE64_STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ParseError::Decode(e.to_string()))?;

    String::from_utf8(bytes)
        .map(Cow::Owned)
        .map_err(|e| ParseError::Decode(format!("payload is not valid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_text_is_borrowed() {
        let text = ">S1\nK00001\n";
        assert!(!is_base64_data_uri(text));
        assert!(matches!(decode_input(text).unwrap(), Cow::Borrowed(t) if t == text));
    }

    #[test]
    fn test_decode_data_uri() {
        let payload = BASE64_STANDARD.encode(">S1\nK00001\n");
        let uri = format!("data:text/plain;base64,{payload}");
        assert!(is_base64_data_uri(&uri));
        assert_eq!(decode_input(&uri).unwrap(), ">S1\nK00001\n");
    }

    #[test]
    fn test_decode_wrapped_payload() {
        let payload = BASE64_STANDARD.encode(">S1\nK00001\nK00002\n");
        let (head, tail) = payload.split_at(8);
        let uri = format!("data:text/plain;base64,{head}\n{tail}\n");
        assert_eq!(decode_input(&uri).unwrap(), ">S1\nK00001\nK00002\n");
    }

    #[test]
    fn test_other_media_types_are_accepted() {
        let payload = BASE64_STANDARD.encode(">S1\nK00001");
        let uri = format!("data:application/octet-stream;base64,{payload}");
        assert_eq!(decode_input(&uri).unwrap(), ">S1\nK00001");
    }

    #[test]
    fn test_non_base64_data_uri_is_literal() {
        let raw = "data:text/plain,K00001";
        assert!(!is_base64_data_uri(raw));
        assert_eq!(decode_input(raw).unwrap(), raw);
    }

    #[test]
    fn test_invalid_base64_is_decode_error() {
        let err = decode_input("data:text/plain;base64,@@not*base64@@").unwrap_err();
        assert!(matches!(err, ParseError::Decode(_)));

        let err = decode_input("data:text/plain;base64,QUJD=").unwrap_err();
        assert!(matches!(err, ParseError::Decode(_)));
    }

    #[test]
    fn test_non_utf8_payload_is_decode_error() {
        let payload = BASE64_STANDARD.encode([0xff, 0xfe, 0x00]);
        let err = decode_input(&format!("data:text/plain;base64,{payload}")).unwrap_err();
        assert!(matches!(err, ParseError::Decode(msg) if msg.contains("UTF-8")));
    }
}
