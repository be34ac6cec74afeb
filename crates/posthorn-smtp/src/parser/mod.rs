//! Server reply parser.
//!
//! Replies are one or more lines of `<3-digit code><SP or '-'><text>`;
//! multi-line replies use `-` on every line but the last. A [`Response`]
//! reaches the command layer only after the whole reply has been assembled
//! and parsed here.

use crate::error::{Error, Result};
use crate::types::Response;

/// Parses an assembled reply from its raw lines.
///
/// The code is taken from the first line; continuation lines must repeat it,
/// and a mismatch is treated as a protocol error.
///
/// # Errors
///
/// Returns [`Error::Protocol`] for an empty, truncated or inconsistent
/// reply.
pub fn parse_response(lines: &[String]) -> Result<Response> {
    let Some(first) = lines.first() else {
        return Err(Error::protocol("empty reply"));
    };

    let code = parse_code(first)?;
    let mut text = Vec::with_capacity(lines.len());
    for line in lines {
        if parse_code(line)? != code {
            return Err(Error::Protocol(format!(
                "reply code changed mid-reply: {line:?}"
            )));
        }
        // Everything after the code and its separator; a bare "250" line
        // carries no text.
        text.push(line.get(4..).unwrap_or("").to_string());
    }

    Ok(Response::new(code, text))
}

/// Returns true when this is the last line of a reply (separator is a space
/// or the line is a bare code).
#[must_use]
pub fn is_last_line(line: &str) -> bool {
    line.as_bytes().get(3) != Some(&b'-')
}

fn parse_code(line: &str) -> Result<u16> {
    let digits = line
        .get(0..3)
        .ok_or_else(|| Error::Protocol(format!("reply too short: {line:?}")))?;
    let code: u16 = digits
        .parse()
        .map_err(|_| Error::Protocol(format!("invalid reply code: {line:?}")))?;
    if !(100..1000).contains(&code) {
        return Err(Error::Protocol(format!("invalid reply code: {line:?}")));
    }
    match line.as_bytes().get(3) {
        None | Some(&b' ' | &b'-') => Ok(code),
        Some(_) => Err(Error::Protocol(format!("malformed reply line: {line:?}"))),
    }
}
