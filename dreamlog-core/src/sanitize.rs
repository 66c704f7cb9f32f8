//! Punctuation/unicode normalization and input-size bounding.

/// The result of [`sanitize_with_limit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub text: String,
    /// `true` when the input was cut down to the configured maximum.
    pub truncated: bool,
    /// Length of the input, in characters.
    pub original_len: usize,
}

/// Normalizes typographic punctuation to ASCII and removes control characters.
///
/// - curly quotes become `'` / `"`, en/em dashes and the minus sign become `-`,
///   `…` becomes `...` and non-breaking spaces become plain spaces;
/// - `\r\n` and lone `\r` become `\n`;
/// - control and zero-width characters are dropped, except `\n` and `\t`.
///
/// The output only contains characters this function leaves untouched, so
/// `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            '\n' | '\t' => out.push(ch),
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => out.push('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{2007}' | '\u{202F}' => out.push(' '),
            '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}' => {}
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// Cuts `text` to at most `max_chars` characters, on a character boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

/// Truncates to `max_chars` (when given) and then runs [`sanitize`].
///
/// Truncation happens first so that an oversized document is never walked in
/// full by the later stages.
pub fn sanitize_with_limit(text: &str, max_chars: Option<usize>) -> Sanitized {
    let original_len = text.chars().count();
    let (kept, truncated) = match max_chars {
        Some(max) => truncate_chars(text, max),
        None => (text, false),
    };
    Sanitized {
        text: sanitize(kept),
        truncated,
        original_len,
    }
}
