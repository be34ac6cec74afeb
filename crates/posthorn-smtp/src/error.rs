//! Error types for SMTP operations.

use std::io;

use crate::transaction::Rejection;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classified SMTP failures.
///
/// Protocol rejections carry the server's reply code and text. Transport
/// failures ([`Error::Io`], [`Error::Tls`]) are always fatal to the
/// connection. A rejected recipient is not an error by itself - it is
/// recorded in the transaction state - but a transaction where every
/// recipient was rejected surfaces as [`Error::AllRecipientsRejected`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from the transport.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS error from the transport.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Unparseable or out-of-sequence wire data.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server's connection greeting was not a success reply.
    #[error("server greeting rejected the connection ({code}): {message}")]
    GreetingRejected {
        /// Reply code of the greeting.
        code: u16,
        /// Greeting text from the server.
        message: String,
    },

    /// EHLO (or the HELO fallback) drew a negative reply other than
    /// "command unrecognized".
    #[error("server rejected our hello ({code}): {message}")]
    HelloRejected {
        /// Reply code.
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// Both EHLO and the single HELO fallback were rejected as unknown
    /// commands.
    #[error("server accepts neither EHLO nor HELO ({code}): {message}")]
    HelloUnsupported {
        /// Reply code of the final attempt.
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// A required server extension is not advertised.
    #[error("server does not advertise {0}")]
    CapabilityMissing(String),

    /// STARTTLS drew a reply other than 220.
    #[error("server rejected STARTTLS ({code}): {message}")]
    StartTlsRejected {
        /// Reply code.
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// The server accepted STARTTLS but the TLS handshake failed.
    #[error("TLS negotiation failed after the server accepted STARTTLS")]
    TlsHandshake,

    /// No server-advertised authentication mechanism is supported.
    #[error("no mutually supported authentication mechanism (server offers: {advertised})")]
    NoCompatibleAuthMechanism {
        /// The mechanism list as advertised by the server.
        advertised: String,
    },

    /// The first AUTH round was rejected: the mechanism itself was refused.
    #[error("server refused authentication mechanism {mechanism} ({code}): {message}")]
    AuthMechanismRejected {
        /// Mechanism name as sent on the wire.
        mechanism: String,
        /// Reply code.
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// A later AUTH round failed, most likely bad credentials.
    #[error("authentication failed ({code}): {message}")]
    AuthenticationFailed {
        /// Reply code.
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// The mechanism step function reported a negotiation failure.
    #[error("authentication failed: {0}")]
    Sasl(#[from] posthorn_sasl::Error),

    /// The credential prompt was dismissed.
    #[error("authentication aborted by the user")]
    AuthAborted,

    /// MAIL FROM was rejected; the whole transaction is aborted.
    #[error("server rejected sender <{address}> ({code}): {message}")]
    SenderRejected {
        /// The envelope sender address.
        address: String,
        /// Reply code.
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// Every RCPT TO in the transaction was rejected; DATA was never issued.
    #[error("all recipients were rejected: {}", list_rejections(.0))]
    AllRecipientsRejected(Vec<Rejection>),

    /// DATA drew a reply other than 354.
    #[error("server refused to accept message data ({code}): {message}")]
    DataRejected {
        /// Reply code.
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// The server rejected the message content after the body was sent.
    #[error("message content rejected ({code}): {message}")]
    MessageRejected {
        /// Reply code.
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// A session command (NOOP, RSET, QUIT) drew a negative reply.
    #[error("{command} failed ({code}): {message}")]
    UnexpectedReply {
        /// The command verb.
        command: &'static str,
        /// Reply code.
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// Invalid envelope address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
}

impl Error {
    /// Creates a [`Error::Protocol`] from anything displayable.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

fn list_rejections(rejections: &[Rejection]) -> String {
    rejections
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
