//! SASL mechanism names and selection.

/// A SASL mechanism this crate can negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mechanism {
    /// PLAIN (RFC 4616) - username/password in a single response.
    Plain,
    /// LOGIN - obsolete two-round username/password, still required by some
    /// providers.
    Login,
    /// XOAUTH2 - proprietary `OAuth2` bearer-token mechanism
    /// (Google/Microsoft).
    XOAuth2,
    /// OAUTHBEARER (RFC 7628) - standard `OAuth2` bearer-token mechanism.
    OAuthBearer,
}

/// Client-side preference order used by [`Mechanism::choose`].
///
/// LOGIN is tried after PLAIN as it is deprecated; token mechanisms come
/// last because they only work with credentials that are already tokens.
const PREFERENCE: &[Mechanism] = &[
    Mechanism::Plain,
    Mechanism::Login,
    Mechanism::OAuthBearer,
    Mechanism::XOAuth2,
];

impl Mechanism {
    /// Parses a mechanism name as advertised by a server.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PLAIN" => Some(Self::Plain),
            "LOGIN" => Some(Self::Login),
            "XOAUTH2" => Some(Self::XOAuth2),
            "OAUTHBEARER" => Some(Self::OAuthBearer),
            _ => None,
        }
    }

    /// Returns the mechanism name as used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Login => "LOGIN",
            Self::XOAuth2 => "XOAUTH2",
            Self::OAuthBearer => "OAUTHBEARER",
        }
    }

    /// Selects one mechanism from a server-advertised list.
    ///
    /// Unknown names are skipped; among the known ones the client preference
    /// order decides. Returns `None` when no advertised mechanism is
    /// supported.
    pub fn choose<'a, I>(advertised: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let offered: Vec<Self> = advertised.into_iter().filter_map(Self::parse).collect();
        PREFERENCE
            .iter()
            .copied()
            .find(|mechanism| offered.contains(mechanism))
    }

    /// Returns true if the whole exchange fits in the initial response.
    #[must_use]
    pub const fn is_one_step(self) -> bool {
        match self {
            Self::Plain | Self::XOAuth2 | Self::OAuthBearer => true,
            Self::Login => false,
        }
    }
}

impl std::fmt::Display for Mechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_names() {
        assert_eq!(Mechanism::parse("PLAIN"), Some(Mechanism::Plain));
        assert_eq!(Mechanism::parse("plain"), Some(Mechanism::Plain));
        assert_eq!(Mechanism::parse("LOGIN"), Some(Mechanism::Login));
        assert_eq!(Mechanism::parse("XOAUTH2"), Some(Mechanism::XOAuth2));
        assert_eq!(Mechanism::parse("OAUTHBEARER"), Some(Mechanism::OAuthBearer));
    }

    #[test]
    fn parse_unknown_name() {
        assert_eq!(Mechanism::parse("CRAM-MD5"), None);
        assert_eq!(Mechanism::parse(""), None);
    }

    #[test]
    fn choose_prefers_plain() {
        let picked = Mechanism::choose(["LOGIN", "PLAIN", "XOAUTH2"]);
        assert_eq!(picked, Some(Mechanism::Plain));
    }

    #[test]
    fn choose_falls_back_to_login() {
        let picked = Mechanism::choose(["LOGIN", "CRAM-MD5"]);
        assert_eq!(picked, Some(Mechanism::Login));
    }

    #[test]
    fn choose_skips_unknown() {
        assert_eq!(Mechanism::choose(["GSSAPI", "NTLM"]), None);
        assert_eq!(Mechanism::choose([]), None);
    }

    #[test]
    fn one_step_classification() {
        assert!(Mechanism::Plain.is_one_step());
        assert!(Mechanism::XOAuth2.is_one_step());
        assert!(Mechanism::OAuthBearer.is_one_step());
        assert!(!Mechanism::Login.is_one_step());
    }

    #[test]
    fn display_matches_wire_name() {
        assert_eq!(Mechanism::Plain.to_string(), "PLAIN");
        assert_eq!(Mechanism::OAuthBearer.to_string(), "OAUTHBEARER");
    }
}
