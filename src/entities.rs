//! Character reference decoding for highlighter output.
//!
//! The highlighter escapes source text as HTML. Before markup is split into
//! tags and text, references are resolved so that every source character
//! occupies exactly one pixel:
//!
//! | Reference | Result |
//! |---|---|
//! | `&#65;` / `&#65` | the character at decimal code point 65 |
//! | `&#x41;` / `&#X41` | the character at hex code point 0x41 |
//! | `&amp;`, `&lt;`, ... | U+FFFD REPLACEMENT CHARACTER |
//!
//! Decoding is a single left-to-right scan: each reference is consumed once
//! and the produced character is never re-examined, so `&#38;amp;` decodes to
//! the literal text `&amp;`.
//!
//! Numeric references outside the Unicode scalar range (surrogates, values
//! above U+10FFFF, or digit runs too long to fit a `u32`) decode to U+FFFD.
//! Anything that does not parse as a reference is left as literal text.

pub const REPLACEMENT: char = '\u{FFFD}';

/// Decode numeric references and blank out named ones.
pub fn decode(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match parse_reference(tail) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parse a reference at the start of `s` (which begins with `&`).
///
/// Returns the decoded character and the number of bytes consumed.
fn parse_reference(s: &str) -> Option<(char, usize)> {
    let body = &s[1..];
    if let Some(num) = body.strip_prefix('#') {
        if let Some(hex) = num.strip_prefix(['x', 'X']) {
            let digits = leading_len(hex, |c| c.is_ascii_hexdigit());
            if digits == 0 {
                return None;
            }
            let ch = code_point(u32::from_str_radix(&hex[..digits], 16).ok());
            return Some((ch, 3 + digits + semicolon(&hex[digits..])));
        }
        let digits = leading_len(num, |c| c.is_ascii_digit());
        if digits == 0 {
            return None;
        }
        let ch = code_point(num[..digits].parse::<u32>().ok());
        return Some((ch, 2 + digits + semicolon(&num[digits..])));
    }

    // Named references need the terminating semicolon.
    let word = leading_len(body, |c| c.is_ascii_alphanumeric() || c == '_');
    if word > 0 && body[word..].starts_with(';') {
        Some((REPLACEMENT, 1 + word + 1))
    } else {
        None
    }
}

fn leading_len(s: &str, pred: impl Fn(char) -> bool) -> usize {
    s.find(|c: char| !pred(c)).unwrap_or(s.len())
}

fn semicolon(s: &str) -> usize {
    usize::from(s.starts_with(';'))
}

fn code_point(value: Option<u32>) -> char {
    value.and_then(char::from_u32).unwrap_or(REPLACEMENT)
}
