//! Text utilities for the ASCII parts of PLY parsing.
//!
//! PLY is locale independent: the whitespace set is fixed (space, form feed,
//! newline, carriage return, tab, vertical tab) and numbers are parsed with
//! `str::parse`, which always uses the "C"-style decimal forms.

use std::str::FromStr;

/// The PLY whitespace set. Deliberately not `char::is_whitespace`, which is
/// Unicode-aware and therefore broader than the format allows.
pub fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\x0c' | '\n' | '\r' | '\t' | '\x0b')
}

/// Remove leading PLY whitespace.
pub fn trim_start(text: &str) -> &str {
    text.trim_start_matches(is_space)
}

/// Remove trailing PLY whitespace.
pub fn trim_end(text: &str) -> &str {
    text.trim_end_matches(is_space)
}

/// Remove leading and trailing PLY whitespace.
pub fn trim(text: &str) -> &str {
    trim_start(trim_end(text))
}

/// Split `N − 1` whitespace-delimited tokens off the front of `line`.
///
/// The first `N − 1` slices are the successive tokens (each may be empty when
/// the line runs out); the final slice is the untouched remainder, which may
/// still contain internal whitespace.
pub fn split_front<const N: usize>(line: &str) -> [&str; N] {
    assert!(N > 0);

    let mut result = [""; N];
    let mut rest = line;
    for slot in result.iter_mut().take(N - 1) {
        let end = rest.find(is_space).unwrap_or(rest.len());
        *slot = &rest[..end];
        rest = trim_start(&rest[end..]);
    }
    result[N - 1] = rest;
    result
}

/// Mirror of [`split_front`]: split tokens off the back of `line`.
///
/// The last `N − 1` slices are the tokens counted from the end; the first
/// slice is the untouched remainder.
pub fn split_back<const N: usize>(line: &str) -> [&str; N] {
    assert!(N > 0);

    let mut result = [""; N];
    let mut rest = line;
    for i in (1..N).rev() {
        match rest.rfind(is_space) {
            // The whitespace set is pure ASCII, so the token starts one byte
            // after the separator.
            Some(pos) => {
                result[i] = &rest[pos + 1..];
                rest = trim_end(&rest[..pos + 1]);
            }
            None => {
                result[i] = rest;
                rest = "";
            }
        }
    }
    result[0] = rest;
    result
}

/// Parse a whitespace-free token as a number. `None` carries no context; the
/// caller attaches the token and target type to its error.
pub fn parse_number<T: FromStr>(token: &str) -> Option<T> {
    token.parse().ok()
}
