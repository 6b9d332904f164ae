//! Byte/text helpers shared by the codec.

/// Line feed, octet 10. Also the heartbeat payload.
pub const LF: u8 = b'\n';

/// NULL, octet 0. Terminates every frame.
pub const NULL: u8 = 0;

/// Encode a string as UTF-8 bytes.
pub fn encode_utf8(s: &str) -> Vec<u8> {
    s.as_bytes().to_vec()
}

/// Decode UTF-8 bytes into a string.
///
/// Invalid sequences become U+FFFD rather than failing.
pub fn decode_utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Number of bytes `s` occupies once UTF-8 encoded.
pub fn size_of_utf8(s: &str) -> usize {
    s.len()
}

/// Strip leading and trailing whitespace.
///
/// U+FEFF (byte order mark) counts as whitespace too.
pub fn trim(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_of_utf8_counts_bytes() {
        assert_eq!(size_of_utf8(""), 0);
        assert_eq!(size_of_utf8("test"), 4);
        assert_eq!(size_of_utf8("  test  "), 8);
        assert_eq!(size_of_utf8(r#"{"test":"test"}"#), 15);
        assert_eq!(size_of_utf8("é"), 2);
        assert_eq!(size_of_utf8("€"), 3);
        assert_eq!(size_of_utf8("𝄞"), 4);
    }

    #[test]
    fn encode_matches_expected_bytes() {
        assert_eq!(encode_utf8(" test "), vec![32, 116, 101, 115, 116, 32]);
        assert!(encode_utf8("").is_empty());
        assert_eq!(encode_utf8("é"), vec![0xC3, 0xA9]);
    }

    #[test]
    fn decode_inverts_encode() {
        assert_eq!(decode_utf8(&[32, 116, 101, 115, 116, 32]), " test ");
        assert_eq!(decode_utf8(&[]), "");
        assert_eq!(decode_utf8(&encode_utf8("héllo €")), "héllo €");
    }

    #[test]
    fn decode_replaces_invalid_sequences() {
        assert_eq!(decode_utf8(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
    }

    #[test]
    fn trim_handles_unicode_whitespace() {
        assert_eq!(trim("test"), "test");
        assert_eq!(trim("  test"), "test");
        assert_eq!(trim("test  "), "test");
        assert_eq!(
            trim("\u{c}\n\r\t\u{b}\u{a0}\u{1680}\u{2028}\u{2029}\u{202f}\u{205f}\u{3000}\u{feff}"),
            ""
        );
    }
}
