//! Header value escaping for STOMP 1.1 and 1.2.
//!
//! | char | 1.1 | 1.2 |
//! |------|-----|-----|
//! | `\`  | `\\` | `\\` |
//! | LF   | `\n` | `\n` |
//! | `:`  | `\c` | `\c` |
//! | CR   | -    | `\r` |
//!
//! CONNECT and CONNECTED frames are never escaped.

use crate::version::Version;

/// Whether headers of `command` are escaped under `version`.
pub fn needs_escaping(command: &str, version: Option<Version>) -> bool {
    matches!(version, Some(Version::V1_1) | Some(Version::V1_2))
        && command != "CONNECT"
        && command != "CONNECTED"
}

/// Escape a header name or value for `version`.
///
/// Backslash goes first so escapes introduced by later rules are not
/// doubled.
pub fn escape_header(value: &str, version: Version) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\r' if version == Version::V1_2 => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            ':' => out.push_str("\\c"),
            c => out.push(c),
        }
    }
    out
}

/// Reverse [`escape_header`].
///
/// Decoding is a single left-to-right scan, so `\\c` is a backslash followed
/// by `c` and never a colon. Escape sequences the version does not define are
/// kept verbatim.
pub fn unescape_header(value: &str, version: Version) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            Some('r') if version == Version::V1_2 => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_reserved_characters() {
        assert_eq!(escape_header("a:b", Version::V1_1), "a\\cb");
        assert_eq!(escape_header("a\nb", Version::V1_1), "a\\nb");
        assert_eq!(escape_header("a\\b", Version::V1_1), "a\\\\b");
        assert_eq!(escape_header("a\rb", Version::V1_2), "a\\rb");
    }

    #[test]
    fn carriage_return_is_literal_in_1_1() {
        assert_eq!(escape_header("a\rb", Version::V1_1), "a\rb");
        assert_eq!(unescape_header("a\\rb", Version::V1_1), "a\\rb");
    }

    #[test]
    fn roundtrip_mixed_specials_1_2() {
        let value = "x:\n\r\\c\\n:\\\\end\r";
        let escaped = escape_header(value, Version::V1_2);
        assert!(!escaped.contains(':'));
        assert!(!escaped.contains('\n'));
        assert!(!escaped.contains('\r'));
        assert_eq!(unescape_header(&escaped, Version::V1_2), value);
    }

    #[test]
    fn roundtrip_mixed_specials_1_1() {
        let value = "path:to\\dir\nnext";
        let escaped = escape_header(value, Version::V1_1);
        assert_eq!(unescape_header(&escaped, Version::V1_1), value);
    }

    #[test]
    fn escaped_backslash_before_c_is_not_a_colon() {
        assert_eq!(unescape_header("\\\\c", Version::V1_2), "\\c");
    }

    #[test]
    fn unknown_and_trailing_escapes_are_kept() {
        assert_eq!(unescape_header("a\\tb", Version::V1_2), "a\\tb");
        assert_eq!(unescape_header("end\\", Version::V1_2), "end\\");
    }

    #[test]
    fn connect_frames_are_exempt() {
        assert!(!needs_escaping("CONNECT", Some(Version::V1_2)));
        assert!(!needs_escaping("CONNECTED", Some(Version::V1_1)));
        assert!(needs_escaping("SEND", Some(Version::V1_1)));
        assert!(!needs_escaping("SEND", Some(Version::V1_0)));
        assert!(!needs_escaping("SEND", None));
    }
}
