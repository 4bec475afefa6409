//! Stripping of code points the document service refuses.
//!
//! The service accepts `U+0009`, `U+000A`, `U+000D`, `U+0020..=U+D7FF` and
//! `U+E000..=U+FFFD`. Anything else is removed from ids, field names and
//! field values before a document is serialized, so the byte length used for
//! packing is always the length of what is actually sent.

use std::borrow::Cow;

/// Whether the document service accepts this character
#[inline]
pub fn is_allowed_char(c: char) -> bool {
    matches!(
        c,
        '\u{0009}' | '\u{000A}' | '\u{000D}' | '\u{0020}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}'
    )
}

/// Remove disallowed characters, borrowing when nothing needs to change
pub fn sanitize_text(input: &str) -> Cow<'_, str> {
    if input.chars().all(is_allowed_char) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(input.chars().filter(|c| is_allowed_char(*c)).collect())
    }
}
