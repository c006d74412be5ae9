//! Character reference decoding.
//!
//! Covers the named references that occur in real-world templates plus the
//! numeric forms. Attribute-value context applies the stricter HTML rule: an
//! unterminated named reference followed by `=` or an alphanumeric stays
//! literal.

use phf::{phf_map, phf_set};

/// Named character references (keys without `&` or `;`).
static NAMED_REFERENCES: phf::Map<&'static str, char> = phf_map! {
    "amp" => '&',
    "lt" => '<',
    "gt" => '>',
    "quot" => '"',
    "apos" => '\'',
    "nbsp" => '\u{a0}',
    "copy" => '\u{a9}',
    "reg" => '\u{ae}',
    "deg" => '\u{b0}',
    "middot" => '\u{b7}',
    "laquo" => '\u{ab}',
    "raquo" => '\u{bb}',
    "times" => '\u{d7}',
    "divide" => '\u{f7}',
    "ndash" => '\u{2013}',
    "mdash" => '\u{2014}',
    "lsquo" => '\u{2018}',
    "rsquo" => '\u{2019}',
    "ldquo" => '\u{201c}',
    "rdquo" => '\u{201d}',
    "bull" => '\u{2022}',
    "hellip" => '\u{2026}',
    "prime" => '\u{2032}',
    "euro" => '\u{20ac}',
    "trade" => '\u{2122}',
    "larr" => '\u{2190}',
    "uarr" => '\u{2191}',
    "rarr" => '\u{2192}',
    "darr" => '\u{2193}',
    "infin" => '\u{221e}',
    "ne" => '\u{2260}',
    "le" => '\u{2264}',
    "ge" => '\u{2265}',
};

/// Legacy references that may appear without a terminating semicolon.
static LEGACY_REFERENCES: phf::Set<&'static str> = phf_set! {
    "amp", "lt", "gt", "quot", "nbsp", "copy", "reg",
};

/// Look up a named reference. `terminated` tells whether a `;` followed the
/// name; unterminated lookups only succeed for the legacy subset.
pub fn decode_named(name: &str, terminated: bool) -> Option<char> {
    let decoded = NAMED_REFERENCES.get(name).copied()?;
    if terminated || LEGACY_REFERENCES.contains(name) {
        Some(decoded)
    } else {
        None
    }
}

/// Decode a numeric reference body (digits after `&#` or `&#x`).
pub fn decode_numeric(digits: &str, hex: bool) -> Option<char> {
    let radix = if hex { 16 } else { 10 };
    let code = u32::from_str_radix(digits, radix).ok()?;
    // Null, surrogates and out-of-range code points decode to the
    // replacement character per the HTML spec.
    if code == 0 || (0xd800..=0xdfff).contains(&code) || code > 0x10ffff {
        return Some('\u{fffd}');
    }
    char::from_u32(code).or(Some('\u{fffd}'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_terminated() {
        assert_eq!(decode_named("amp", true), Some('&'));
        assert_eq!(decode_named("hellip", true), Some('\u{2026}'));
        assert_eq!(decode_named("bogus", true), None);
    }

    #[test]
    fn test_named_unterminated_legacy_only() {
        assert_eq!(decode_named("amp", false), Some('&'));
        assert_eq!(decode_named("hellip", false), None);
    }

    #[test]
    fn test_numeric() {
        assert_eq!(decode_numeric("65", false), Some('A'));
        assert_eq!(decode_numeric("41", true), Some('A'));
        assert_eq!(decode_numeric("0", false), Some('\u{fffd}'));
        assert_eq!(decode_numeric("110000", true), Some('\u{fffd}'));
    }
}
