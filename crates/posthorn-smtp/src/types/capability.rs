//! Server capabilities advertised in the EHLO reply.

use crate::types::Response;

/// One EHLO keyword line, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    /// STARTTLS - TLS upgrade available.
    StartTls,
    /// AUTH - authentication, with the advertised mechanism names.
    ///
    /// Names are kept verbatim; mechanism support is the negotiation
    /// layer's concern.
    Auth(Vec<String>),
    /// SIZE - maximum message size, if the server stated one.
    Size(Option<usize>),
    /// 8BITMIME - 8-bit MIME transport.
    EightBitMime,
    /// PIPELINING - command pipelining.
    Pipelining,
    /// DSN - delivery status notifications.
    Dsn,
    /// SMTPUTF8 - UTF-8 envelope addresses.
    SmtpUtf8,
    /// Any other keyword, kept verbatim.
    Unknown(String),
}

impl Extension {
    /// Parses one EHLO keyword line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            return Self::Unknown(line.to_string());
        };

        match keyword.to_uppercase().as_str() {
            "STARTTLS" => Self::StartTls,
            "AUTH" => Self::Auth(parts.map(str::to_uppercase).collect()),
            "SIZE" => Self::Size(parts.next().and_then(|s| s.parse().ok())),
            "8BITMIME" => Self::EightBitMime,
            "PIPELINING" => Self::Pipelining,
            "DSN" => Self::Dsn,
            "SMTPUTF8" => Self::SmtpUtf8,
            _ => Self::Unknown(line.to_string()),
        }
    }

    /// The keyword this extension answers capability queries for.
    #[must_use]
    pub fn keyword(&self) -> &str {
        match self {
            Self::StartTls => "STARTTLS",
            Self::Auth(_) => "AUTH",
            Self::Size(_) => "SIZE",
            Self::EightBitMime => "8BITMIME",
            Self::Pipelining => "PIPELINING",
            Self::Dsn => "DSN",
            Self::SmtpUtf8 => "SMTPUTF8",
            Self::Unknown(line) => line.split_whitespace().next().unwrap_or(""),
        }
    }
}

/// The capability set cached from the most recent EHLO reply.
///
/// Cleared and re-learned after a STARTTLS upgrade, since servers may
/// advertise a different set on the secured channel.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    extensions: Vec<Extension>,
}

impl Capabilities {
    /// Parses the capability list from a successful EHLO reply.
    ///
    /// The first reply line is the server greeting and carries no keyword.
    #[must_use]
    pub fn from_response(response: &Response) -> Self {
        let extensions = response
            .lines()
            .iter()
            .skip(1)
            .map(|line| Extension::parse(line))
            .collect();
        Self { extensions }
    }

    /// Returns true when the keyword was advertised.
    #[must_use]
    pub fn have(&self, keyword: &str) -> bool {
        self.extensions
            .iter()
            .any(|ext| ext.keyword().eq_ignore_ascii_case(keyword))
    }

    /// The advertised SASL mechanism names, empty without AUTH.
    #[must_use]
    pub fn auth_mechanisms(&self) -> &[String] {
        for ext in &self.extensions {
            if let Extension::Auth(mechanisms) = ext {
                return mechanisms;
            }
        }
        &[]
    }

    /// The advertised maximum message size, if any.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        for ext in &self.extensions {
            if let Extension::Size(size) = ext {
                return *size;
            }
        }
        None
    }

    /// Forgets everything, e.g. before the post-STARTTLS EHLO.
    pub fn clear(&mut self) {
        self.extensions.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ehlo_reply() -> Response {
        Response::new(
            250,
            vec![
                "smtp.example.com greets you".to_string(),
                "STARTTLS".to_string(),
                "AUTH PLAIN LOGIN XOAUTH2".to_string(),
                "SIZE 52428800".to_string(),
                "8BITMIME".to_string(),
                "PIPELINING".to_string(),
                "X-CUSTOM thing".to_string(),
            ],
        )
    }

    #[test]
    fn parses_keywords() {
        assert_eq!(Extension::parse("STARTTLS"), Extension::StartTls);
        assert_eq!(Extension::parse("starttls"), Extension::StartTls);
        assert_eq!(Extension::parse("8BITMIME"), Extension::EightBitMime);
        assert_eq!(Extension::parse("SIZE"), Extension::Size(None));
        assert_eq!(
            Extension::parse("SIZE 1000"),
            Extension::Size(Some(1000))
        );
    }

    #[test]
    fn auth_keeps_mechanism_names() {
        let ext = Extension::parse("AUTH plain login CRAM-MD5");
        assert_eq!(
            ext,
            Extension::Auth(vec![
                "PLAIN".to_string(),
                "LOGIN".to_string(),
                "CRAM-MD5".to_string(),
            ])
        );
    }

    #[test]
    fn greeting_line_is_skipped() {
        let caps = Capabilities::from_response(&ehlo_reply());
        assert!(!caps.have("smtp.example.com"));
        assert!(caps.have("STARTTLS"));
    }

    #[test]
    fn capability_queries_are_case_insensitive() {
        let caps = Capabilities::from_response(&ehlo_reply());
        assert!(caps.have("starttls"));
        assert!(caps.have("8bitmime"));
        assert!(caps.have("X-CUSTOM"));
        assert!(!caps.have("CHUNKING"));
    }

    #[test]
    fn auth_mechanisms_and_size() {
        let caps = Capabilities::from_response(&ehlo_reply());
        assert_eq!(caps.auth_mechanisms(), ["PLAIN", "LOGIN", "XOAUTH2"]);
        assert_eq!(caps.max_message_size(), Some(52_428_800));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut caps = Capabilities::from_response(&ehlo_reply());
        caps.clear();
        assert!(!caps.have("STARTTLS"));
        assert!(caps.auth_mechanisms().is_empty());
    }
}
