//! Resolution of user input into a canonical byte count.
//!
//! Input is either a literal payload, measured by its UTF-8 length, or a
//! shorthand size token such as `512kb` or `1.5MB`. A token must carry exactly
//! one unit; text mentioning both `kb` and `mb` is treated as a literal payload.
//! Bytes that are not valid UTF-8 are always a literal payload.

use crate::error::CalcError;

/// Largest input accepted at the boundary, in characters.
pub const MAX_INPUT_CHARS: usize = 520_000;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Parsed form of the user's input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeSpec {
    /// A literal payload of the given encoded length.
    Literal {
        /// UTF-8 byte length of the payload.
        bytes: u64,
    },
    /// A shorthand size in kibibytes (`<n>kb`).
    Kilobytes(f64),
    /// A shorthand size in mebibytes (`<n>mb`).
    Megabytes(f64),
}

impl SizeSpec {
    /// Parse raw input. Fails with [`CalcError::EmptyInput`] when nothing but
    /// whitespace was supplied.
    pub fn parse(input: &str) -> Result<Self, CalcError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CalcError::EmptyInput);
        }
        let lowered = trimmed.to_lowercase();
        let token = match (lowered.contains("kb"), lowered.contains("mb")) {
            (true, false) => lowered
                .strip_suffix("kb")
                .and_then(parse_amount)
                .map(SizeSpec::Kilobytes),
            (false, true) => lowered
                .strip_suffix("mb")
                .and_then(parse_amount)
                .map(SizeSpec::Megabytes),
            _ => None,
        };
        Ok(token.unwrap_or(SizeSpec::Literal {
            bytes: input.len() as u64,
        }))
    }

    /// Parse raw bytes: valid UTF-8 goes through [`SizeSpec::parse`], anything
    /// else is a literal payload of its own length.
    pub fn parse_bytes(input: &[u8]) -> Result<Self, CalcError> {
        match std::str::from_utf8(input) {
            Ok(text) => Self::parse(text),
            Err(_) => Ok(SizeSpec::Literal {
                bytes: input.len() as u64,
            }),
        }
    }

    /// Canonical byte count; shorthand sizes round up.
    ///
    /// Fails with [`CalcError::SizeTooLarge`] when a token does not fit in `u64`.
    pub fn byte_size(&self) -> Result<u64, CalcError> {
        let scaled = match *self {
            SizeSpec::Literal { bytes } => return Ok(bytes),
            SizeSpec::Kilobytes(n) => (n * KIB).ceil(),
            SizeSpec::Megabytes(n) => (n * MIB).ceil(),
        };
        // 2^64 is exactly representable; anything at or above it is out of range.
        if !scaled.is_finite() || scaled >= u64::MAX as f64 {
            return Err(CalcError::SizeTooLarge);
        }
        Ok(scaled as u64)
    }

    /// Whether the input was a shorthand size rather than a payload.
    pub fn is_token(&self) -> bool {
        !matches!(self, SizeSpec::Literal { .. })
    }
}

/// Accepts `\d+(\.\d+)?` surrounded by optional whitespace.
fn parse_amount(text: &str) -> Option<f64> {
    let text = text.trim();
    let (whole, frac) = match text.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (text, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || !frac.map_or(true, digits) {
        return None;
    }
    text.parse::<f64>().ok()
}

/// Resolve input to a byte count of at least one.
///
/// A token that resolves to zero bytes (`0kb`) is rejected the same way as
/// an empty payload.
pub fn resolve_byte_size(input: &str) -> Result<u64, CalcError> {
    non_zero(SizeSpec::parse(input)?.byte_size()?)
}

/// Bound-check and resolve raw bytes, as read from a file or stdin.
///
/// Valid UTF-8 is bounded in characters like typed input; other bytes are
/// bounded in bytes.
pub fn resolve_payload(input: &[u8]) -> Result<u64, CalcError> {
    if let Ok(text) = std::str::from_utf8(input) {
        check_input_length(text)?;
        return resolve_byte_size(text);
    }
    if input.len() > MAX_INPUT_CHARS {
        return Err(CalcError::InputTooLong {
            max: MAX_INPUT_CHARS,
            actual: input.len(),
        });
    }
    non_zero(SizeSpec::parse_bytes(input)?.byte_size()?)
}

fn non_zero(bytes: u64) -> Result<u64, CalcError> {
    match bytes {
        0 => Err(CalcError::EmptyInput),
        bytes => Ok(bytes),
    }
}

/// Enforce [`MAX_INPUT_CHARS`] on raw input.
pub fn check_input_length(input: &str) -> Result<(), CalcError> {
    let actual = input.chars().count();
    if actual > MAX_INPUT_CHARS {
        return Err(CalcError::InputTooLong {
            max: MAX_INPUT_CHARS,
            actual,
        });
    }
    Ok(())
}
