//! Error types for SASL negotiation.

/// Result type alias for SASL operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while driving a SASL exchange.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server issued a challenge to a mechanism that completes in one round.
    #[error("mechanism {0} does not expect a server challenge")]
    UnexpectedChallenge(&'static str),

    /// The server issued a challenge the mechanism cannot answer.
    #[error("unrecognized server challenge: {0:?}")]
    UnrecognizedChallenge(String),

    /// The mechanism was stepped after negotiation already completed.
    #[error("mechanism {0} has already completed negotiation")]
    AlreadyComplete(&'static str),

    /// The mechanism needs credentials that were never supplied.
    #[error("mechanism {0} requires credentials")]
    MissingCredentials(&'static str),
}
