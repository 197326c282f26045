use std::str::FromStr;

/// Parses `text` as `T`, falling back to `default` on any failure
///
/// Surrounding padding is ignored. Empty text, non-numeric content and
/// values outside the range of `T` all yield `default`.
///
/// ```rust
/// use edf_descriptor::utils::parse_or_default;
///
/// assert_eq!(parse_or_default::<u32>(" 12 ", 0), 12);
/// assert_eq!(parse_or_default::<u32>("    ", 0), 0);
/// assert_eq!(parse_or_default::<u32>("-3", 0), 0);
/// assert_eq!(parse_or_default::<f64>("abc", 0.0), 0.0);
/// ```
pub fn parse_or_default<T: FromStr>(text: &str, default: T) -> T {
    trim_padding(text).parse().unwrap_or(default)
}

/// Parses a duration in seconds, `default` unless the value is finite and non-negative
pub fn parse_duration_or_default(text: &str, default: f64) -> f64 {
    let value = parse_or_default(text, default);
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        default
    }
}

/// 去除字段两端的填充（空格、控制字符以及NUL）
pub fn trim_padding(s: &str) -> &str {
    s.trim_matches(|c: char| c <= ' ')
}

/// Decodes a header field as ISO-8859-1 text and trims its padding
///
/// Every byte maps to exactly one character, so no input is rejected.
pub fn decode_field(bytes: &[u8]) -> String {
    let text: String = bytes.iter().map(|&b| char::from(b)).collect();
    trim_padding(&text).to_string()
}

/// Encodes text as ISO-8859-1, `None` if any character has no single-byte form
pub fn encode_latin1(s: &str) -> Option<Vec<u8>> {
    s.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect()
}
