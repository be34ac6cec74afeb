//! The SASL client interface and the standard mechanism implementations.

use crate::error::{Error, Result};
use crate::mechanism::Mechanism;

/// User credentials for a SASL exchange.
///
/// For the `OAuth2` mechanisms the secret is the access token rather than a
/// password.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credentials {
    username: String,
    secret: String,
}

impl Credentials {
    /// Creates credentials from a username and a password or token.
    #[must_use]
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    /// Returns the authentication username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password or token.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Returns true when either field is still empty.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.username.is_empty() || self.secret.is_empty()
    }
}

// Keep secrets out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Client side of one SASL exchange.
///
/// The protocol engine owns wire framing (base64, line endings); challenges
/// and responses cross this interface as raw bytes. Implementations are
/// stateful: each call advances the exchange.
pub trait SaslClient {
    /// The wire name of the negotiated mechanism.
    fn mechanism(&self) -> &'static str;

    /// Returns true when the exchange cannot proceed without credentials.
    fn needs_credentials(&self) -> bool;

    /// Supplies credentials obtained after construction (e.g. from a
    /// password prompt).
    fn supply(&mut self, credentials: Credentials);

    /// Produces the optional initial response sent along with the
    /// authentication request.
    ///
    /// One-step mechanisms complete here; multi-step mechanisms return
    /// `None` and wait for the first challenge.
    ///
    /// # Errors
    ///
    /// Fails when required credentials are missing.
    fn initial_response(&mut self) -> Result<Option<Vec<u8>>>;

    /// Answers a decoded server challenge.
    ///
    /// # Errors
    ///
    /// Fails when the mechanism expects no challenge, cannot interpret this
    /// one, or has already completed.
    fn step(&mut self, challenge: &[u8]) -> Result<Vec<u8>>;

    /// Returns true once the mechanism has emitted its final response.
    fn is_done(&self) -> bool;
}

/// Progress of a [`StandardClient`] exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Round {
    Start,
    UsernameSent,
    Done,
}

/// The standard mechanisms: PLAIN, LOGIN, XOAUTH2 and OAUTHBEARER.
#[derive(Debug)]
pub struct StandardClient {
    mechanism: Mechanism,
    credentials: Credentials,
    round: Round,
}

impl StandardClient {
    /// Creates a client for the given mechanism and credentials.
    #[must_use]
    pub const fn new(mechanism: Mechanism, credentials: Credentials) -> Self {
        Self {
            mechanism,
            credentials,
            round: Round::Start,
        }
    }

    /// PLAIN response per RFC 4616: `\0<username>\0<password>`.
    ///
    /// The leading NUL is the empty authorization identity.
    fn plain_response(&self) -> Vec<u8> {
        format!(
            "\0{}\0{}",
            self.credentials.username(),
            self.credentials.secret()
        )
        .into_bytes()
    }

    /// XOAUTH2 response: `user=<user>\x01auth=Bearer <token>\x01\x01`.
    fn xoauth2_response(&self) -> Vec<u8> {
        format!(
            "user={}\x01auth=Bearer {}\x01\x01",
            self.credentials.username(),
            self.credentials.secret()
        )
        .into_bytes()
    }

    /// OAUTHBEARER response per RFC 7628:
    /// `n,a=<user>,\x01auth=Bearer <token>\x01\x01`.
    fn oauthbearer_response(&self) -> Vec<u8> {
        format!(
            "n,a={},\x01auth=Bearer {}\x01\x01",
            self.credentials.username(),
            self.credentials.secret()
        )
        .into_bytes()
    }
}

impl SaslClient for StandardClient {
    fn mechanism(&self) -> &'static str {
        self.mechanism.as_str()
    }

    fn needs_credentials(&self) -> bool {
        self.credentials.is_incomplete()
    }

    fn supply(&mut self, credentials: Credentials) {
        self.credentials = credentials;
    }

    fn initial_response(&mut self) -> Result<Option<Vec<u8>>> {
        if self.needs_credentials() {
            return Err(Error::MissingCredentials(self.mechanism.as_str()));
        }
        match self.mechanism {
            Mechanism::Plain => {
                self.round = Round::Done;
                Ok(Some(self.plain_response()))
            }
            Mechanism::XOAuth2 => {
                self.round = Round::Done;
                Ok(Some(self.xoauth2_response()))
            }
            Mechanism::OAuthBearer => {
                self.round = Round::Done;
                Ok(Some(self.oauthbearer_response()))
            }
            Mechanism::Login => Ok(None),
        }
    }

    fn step(&mut self, challenge: &[u8]) -> Result<Vec<u8>> {
        if self.round == Round::Done {
            return Err(Error::AlreadyComplete(self.mechanism.as_str()));
        }
        if self.mechanism.is_one_step() {
            return Err(Error::UnexpectedChallenge(self.mechanism.as_str()));
        }

        // LOGIN prompts are plain text once decoded, e.g. "Username:".
        let prompt = String::from_utf8_lossy(challenge);
        let prompt = prompt.trim();
        if ["User Name", "Username:", "Username"].contains(&prompt) {
            self.round = Round::UsernameSent;
            return Ok(self.credentials.username().as_bytes().to_vec());
        }
        if ["Password", "Password:"].contains(&prompt) {
            self.round = Round::Done;
            return Ok(self.credentials.secret().as_bytes().to_vec());
        }

        Err(Error::UnrecognizedChallenge(prompt.to_string()))
    }

    fn is_done(&self) -> bool {
        self.round == Round::Done
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("alice", "wonderland")
    }

    #[test]
    fn plain_is_one_round() {
        let mut client = StandardClient::new(Mechanism::Plain, credentials());
        let initial = client.initial_response().unwrap().unwrap();
        assert_eq!(initial, b"\0alice\0wonderland");
        assert!(client.is_done());
        assert!(client.step(b"anything").is_err());
    }

    #[test]
    fn login_answers_username_then_password() {
        let mut client = StandardClient::new(Mechanism::Login, credentials());
        assert!(client.initial_response().unwrap().is_none());
        assert!(!client.is_done());

        assert_eq!(client.step(b"Username:").unwrap(), b"alice");
        assert!(!client.is_done());

        assert_eq!(client.step(b"Password:").unwrap(), b"wonderland");
        assert!(client.is_done());
    }

    #[test]
    fn login_rejects_unknown_prompt() {
        let mut client = StandardClient::new(Mechanism::Login, credentials());
        assert!(client.step(b"PIN:").is_err());
    }

    #[test]
    fn xoauth2_blob_format() {
        let token = Credentials::new("user@example.com", "ya29.token");
        let mut client = StandardClient::new(Mechanism::XOAuth2, token);
        let initial = client.initial_response().unwrap().unwrap();
        assert_eq!(
            initial,
            b"user=user@example.com\x01auth=Bearer ya29.token\x01\x01"
        );
        assert!(client.is_done());
    }

    #[test]
    fn oauthbearer_blob_format() {
        let token = Credentials::new("user@example.com", "abc");
        let mut client = StandardClient::new(Mechanism::OAuthBearer, token);
        let initial = client.initial_response().unwrap().unwrap();
        assert_eq!(
            initial,
            b"n,a=user@example.com,\x01auth=Bearer abc\x01\x01"
        );
    }

    #[test]
    fn missing_credentials_detected() {
        let mut client =
            StandardClient::new(Mechanism::Plain, Credentials::new("alice", ""));
        assert!(client.needs_credentials());
        assert!(client.initial_response().is_err());

        client.supply(credentials());
        assert!(!client.needs_credentials());
        assert!(client.initial_response().unwrap().is_some());
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", credentials());
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("wonderland"));
    }
}
