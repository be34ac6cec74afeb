//! One parsed server reply.

/// Reply code 220: service ready (also STARTTLS go-ahead).
pub const SERVICE_READY: u16 = 220;
/// Reply code 221: service closing transmission channel.
pub const CLOSING: u16 = 221;
/// Reply code 250: requested mail action okay.
pub const OK: u16 = 250;
/// Reply code 334: authentication continuation.
pub const AUTH_CONTINUE: u16 = 334;
/// Reply code 354: start mail input.
pub const START_DATA: u16 = 354;
/// Reply code 500: syntax error, command unrecognized.
pub const SYNTAX_ERROR: u16 = 500;
/// Reply code 502: command not implemented.
pub const NOT_IMPLEMENTED: u16 = 502;
/// Reply code 535: authentication credentials invalid.
pub const AUTH_FAILED: u16 = 535;

/// A single server reply: a three-digit status code and one or more text
/// lines.
///
/// A `Response` is fully parsed before any command interprets it; line order
/// is significant and the first line is the primary one. Multi-line replies
/// come from `-` continuation lines on the wire (see [`crate::parser`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    code: u16,
    lines: Vec<String>,
}

impl Response {
    /// Creates a reply from a code and its text lines.
    #[must_use]
    pub const fn new(code: u16, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    /// The three-digit status code.
    #[must_use]
    pub const fn code(&self) -> u16 {
        self.code
    }

    /// All text lines, in wire order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The primary (first) text line, or `""` for a bare code.
    #[must_use]
    pub fn first_line(&self) -> &str {
        self.lines.first().map_or("", String::as_str)
    }

    /// The full reply text, lines joined with `\n`.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Returns true for a positive completion reply (2xx).
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.code >= 200 && self.code < 300
    }

    /// Returns true for an intermediate reply (3xx), e.g. an AUTH
    /// continuation or the 354 DATA go-ahead.
    #[must_use]
    pub const fn is_intermediate(&self) -> bool {
        self.code >= 300 && self.code < 400
    }

    /// Returns true for a transient negative reply (4xx).
    #[must_use]
    pub const fn is_transient_error(&self) -> bool {
        self.code >= 400 && self.code < 500
    }

    /// Returns true for a permanent negative reply (5xx).
    #[must_use]
    pub const fn is_permanent_error(&self) -> bool {
        self.code >= 500 && self.code < 600
    }

    /// Returns true when the server did not recognize or implement the
    /// command (500 or 502), the trigger for the EHLO to HELO fallback.
    #[must_use]
    pub const fn is_unknown_command(&self) -> bool {
        self.code == SYNTAX_ERROR || self.code == NOT_IMPLEMENTED
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code, self.first_line())
    }
}
