//! Text decoding helpers.

use std::borrow::Cow;

/// Decode bytes to a string.
///
/// 1. UTF-8 first (a BOM is handled by encoding_rs)
/// 2. If malformed, the hint encoding (from `@charset` or `<meta charset>`)
/// 3. Windows-1252 as a last resort, since it accepts any byte sequence
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    log::debug!("input is not UTF-8 and has no usable charset, decoding as windows-1252");
    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

// ============================================================================
// Encoding Detection
// ============================================================================

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Extract the encoding from a leading `@charset "...";` rule.
///
/// The rule must be the very first thing in the stylesheet (after an
/// optional BOM) and use double quotes.
pub fn extract_css_charset(bytes: &[u8]) -> Option<&str> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let rest = bytes.strip_prefix(b"@charset \"")?;
    let end = rest.iter().take(64).position(|&b| b == b'"')?;

    std::str::from_utf8(&rest[..end]).ok()
}

/// Extract the encoding from `<meta charset="...">` or the
/// `charset=` parameter of an `http-equiv` content type.
///
/// Only the first 1024 bytes are checked.
pub fn extract_meta_charset(bytes: &[u8]) -> Option<&str> {
    let prefix = &bytes[..bytes.len().min(1024)];

    let mut offset = 0;
    while let Some(pos) = prefix[offset..]
        .windows(8)
        .position(|w| w.eq_ignore_ascii_case(b"charset="))
    {
        let value_start = offset + pos + 8;
        offset = value_start;

        let value = &prefix[value_start..];
        let value = match value.first() {
            Some(&quote @ (b'"' | b'\'')) => {
                let rest = &value[1..];
                &rest[..rest.iter().position(|&b| b == quote)?]
            }
            Some(_) => {
                let end = value
                    .iter()
                    .position(|&b| matches!(b, b'"' | b'\'' | b';' | b'>' | b'/') || b.is_ascii_whitespace())
                    .unwrap_or(value.len());
                &value[..end]
            }
            None => return None,
        };

        if !value.is_empty() {
            return std::str::from_utf8(value).ok();
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_text("héllo".as_bytes(), None), "héllo");
        assert!(matches!(decode_text(b"plain", None), Cow::Borrowed(_)));
    }

    #[test]
    fn test_decode_with_hint() {
        // "é" in ISO-8859-1
        let bytes = b"caf\xE9";
        assert_eq!(decode_text(bytes, Some("iso-8859-1")), "café");
    }

    #[test]
    fn test_decode_fallback_windows_1252() {
        let bytes = b"\x93quoted\x94";
        assert_eq!(decode_text(bytes, Some("not-an-encoding")), "\u{201C}quoted\u{201D}");
    }

    #[test]
    fn test_extract_css_charset() {
        assert_eq!(extract_css_charset(b"@charset \"ISO-8859-1\";\np{}"), Some("ISO-8859-1"));
        assert_eq!(extract_css_charset(b"\xEF\xBB\xBF@charset \"utf-8\";"), Some("utf-8"));
        assert_eq!(extract_css_charset(b"p { } @charset \"utf-8\";"), None);
        assert_eq!(extract_css_charset(b"@charset 'utf-8';"), None);
    }

    #[test]
    fn test_extract_meta_charset() {
        assert_eq!(
            extract_meta_charset(b"<html><head><meta charset=\"windows-1251\">"),
            Some("windows-1251")
        );
        assert_eq!(
            extract_meta_charset(
                b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=ISO-8859-1\">"
            ),
            Some("ISO-8859-1")
        );
        assert_eq!(extract_meta_charset(b"<meta charset=utf-8>"), Some("utf-8"));
        assert_eq!(extract_meta_charset(b"<p>no charset here</p>"), None);
    }
}
