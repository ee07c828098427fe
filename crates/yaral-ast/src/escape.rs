//! Escape sequence processing for interpreted string literals.

/// Error type for string literal processing
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum StringLiteralError {
    #[display("Invalid UTF-8 sequence in processed string")]
    InvalidUtf8Sequence,
    #[display("Incomplete hex escape sequence")]
    IncompleteHexEscape,
    #[display("Invalid hex digits in escape sequence: {hex_str}")]
    InvalidHexDigits { hex_str: String },
    /// `\x` takes exactly two digits; `"\x414"` is rejected rather than read as `"A4"`.
    #[display("Hex escape sequence has more than two digits: \\x{hex_str}")]
    OverlongHexEscape { hex_str: String },
    #[display("Invalid octal escape sequence: \\{digits}")]
    InvalidOctalEscape { digits: String },
    #[display("Invalid unicode code point: U+{code_point:X}")]
    InvalidCodePoint { code_point: u32 },
    #[display("Unknown escape sequence: \\{char}")]
    UnknownEscapeSequence { char: char },
    #[display("Trailing backslash in string literal")]
    TrailingBackslash,
}

fn take_hex(chars: &mut std::str::Chars, count: usize) -> Result<u32, StringLiteralError> {
    let hex_str: String = chars.by_ref().take(count).collect();
    if hex_str.chars().count() < count {
        return Err(StringLiteralError::IncompleteHexEscape);
    }
    if !hex_str.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(StringLiteralError::InvalidHexDigits { hex_str });
    }
    u32::from_str_radix(&hex_str, 16).map_err(|_| StringLiteralError::InvalidHexDigits { hex_str })
}

/// `\NNN`: up to three octal digits, the first already consumed.
fn process_octal_escape(first: char, chars: &mut std::str::Chars) -> Result<u8, StringLiteralError> {
    let mut digits = String::from(first);
    while digits.len() < 3 {
        match chars.clone().next() {
            Some(c @ '0'..='7') => {
                digits.push(c);
                chars.next();
            }
            _ => break,
        }
    }
    u8::from_str_radix(&digits, 8).map_err(|_| StringLiteralError::InvalidOctalEscape { digits })
}

fn push_char(result: &mut Vec<u8>, ch: char) {
    let mut buffer = [0; 4];
    result.extend_from_slice(ch.encode_utf8(&mut buffer).as_bytes());
}

/// Process escape sequences in the body of an interpreted string literal
/// (the text between the quotes).
pub fn process_escape_sequences(input: &str) -> Result<String, StringLiteralError> {
    let mut result = Vec::<u8>::new();
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            push_char(&mut result, ch);
            continue;
        }
        match chars.next() {
            Some('"') => result.push(b'"'),
            Some('\'') => result.push(b'\''),
            Some('\\') => result.push(b'\\'),
            Some('n') => result.push(b'\n'),
            Some('t') => result.push(b'\t'),
            Some('r') => result.push(b'\r'),
            Some('a') => result.push(0x07),
            Some('b') => result.push(0x08),
            Some('f') => result.push(0x0c),
            Some('v') => result.push(0x0b),
            Some(digit @ '0'..='7') => result.push(process_octal_escape(digit, &mut chars)?),
            Some('x') => {
                // Raw byte; the result is validated as UTF-8 at the end.
                let digits: String = chars
                    .clone()
                    .take_while(char::is_ascii_hexdigit)
                    .collect();
                if digits.len() > 2 {
                    return Err(StringLiteralError::OverlongHexEscape { hex_str: digits });
                }
                let byte = take_hex(&mut chars, 2)?;
                result.push(byte as u8);
            }
            Some(kind @ ('u' | 'U')) => {
                let code_point = take_hex(&mut chars, if kind == 'u' { 4 } else { 8 })?;
                let ch = char::from_u32(code_point)
                    .ok_or(StringLiteralError::InvalidCodePoint { code_point })?;
                push_char(&mut result, ch);
            }
            Some(other) => {
                return Err(StringLiteralError::UnknownEscapeSequence { char: other });
            }
            None => return Err(StringLiteralError::TrailingBackslash),
        }
    }

    String::from_utf8(result).map_err(|_| StringLiteralError::InvalidUtf8Sequence)
}
