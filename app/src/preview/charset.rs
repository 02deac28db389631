//! Minimal charset detection for text previews.
//!
//! The preview header reports the detected charset and the body is
//! transliterated to the locale charset (assumed UTF-8) with invalid bytes
//! dropped, mirroring an iconv `//IGNORE` conversion.

/// Detected charset label for the preview header.
pub fn detect(bytes: &[u8]) -> &'static str {
    if bytes.is_empty() {
        return "";
    }
    if bytes.iter().all(|b| b.is_ascii()) {
        return "ASCII";
    }
    if std::str::from_utf8(bytes).is_ok() {
        return "UTF-8";
    }
    "UNKNOWN"
}

/// Convert to valid UTF-8. ASCII and UTF-8 pass through; anything else is
/// converted lossily, dropping undecodable sequences rather than failing.
pub fn to_local(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(bytes)
            .chars()
            .filter(|&c| c != char::REPLACEMENT_CHARACTER)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_ascii_and_utf8() {
        assert_eq!(detect(b"plain text"), "ASCII");
        assert_eq!(detect("héllo".as_bytes()), "UTF-8");
        assert_eq!(detect(&[0xFF, 0xFE, 0x41]), "UNKNOWN");
        assert_eq!(detect(b""), "");
    }

    #[test]
    fn invalid_bytes_are_dropped_not_fatal() {
        let s = to_local(&[b'a', 0xFF, b'b']);
        assert_eq!(s, "ab");
    }

    #[test]
    fn utf8_passes_through() {
        assert_eq!(to_local("héllo".as_bytes()), "héllo");
    }
}
