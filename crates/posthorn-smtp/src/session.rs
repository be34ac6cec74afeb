//! The session-interface boundary.
//!
//! Commands and the driver never touch the transport directly; every I/O
//! operation, capability lookup, credential prompt and user-visible error
//! report goes through [`SmtpSession`]. The trait is the single point of
//! mutual exclusion for the socket: at most one command is in flight per
//! session, so implementations need no internal locking.
//!
//! A concrete tokio implementation lives in [`crate::connection`]; tests
//! drive the engine against a scripted in-memory session.

use posthorn_sasl::Credentials;

use crate::error::{Error, Result};
use crate::types::Response;

/// The boundary the protocol engine calls out to.
///
/// Suspension points of the engine (reply reads, the TLS handshake, the
/// credential prompt, body-data pulls) are all async methods here; command
/// objects themselves never block.
#[allow(async_fn_in_trait)]
pub trait SmtpSession {
    /// Caches the capability list from a successful EHLO reply for later
    /// [`have_capability`](Self::have_capability) queries.
    fn parse_features(&mut self, response: &Response);

    /// Returns true when the server advertised the given EHLO keyword.
    fn have_capability(&self, keyword: &str) -> bool;

    /// Returns true when the channel is already encrypted.
    fn is_using_tls(&self) -> bool;

    /// Returns true when the connection was opened with implicit TLS, so
    /// STARTTLS makes no sense.
    fn is_auto_tls(&self) -> bool;

    /// Returns true when the engine should canonicalize line endings and
    /// dot-stuff the body, false when the caller supplies pre-encoded data.
    fn body_encoding_requested(&self) -> bool {
        true
    }

    /// Session configuration lookup.
    fn meta_data(&self, key: &str) -> Option<String> {
        let _ = key;
        None
    }

    /// Reports a terminal, user-visible failure. Called exactly once per
    /// failure before the driver gives up on the current command or
    /// connection.
    fn error(&mut self, error: &Error);

    /// Writes raw wire bytes.
    ///
    /// # Errors
    ///
    /// Any transport failure; always fatal to the connection.
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Reads and parses one complete (possibly multi-line) server reply.
    ///
    /// # Errors
    ///
    /// Transport failures and malformed replies; both fatal.
    async fn read_response(&mut self) -> Result<Response>;

    /// Performs the TLS handshake after the server accepted STARTTLS.
    ///
    /// Returns false when the handshake could not be completed; the command
    /// layer reports that distinctly from a protocol-level STARTTLS
    /// rejection.
    ///
    /// # Errors
    ///
    /// Only for failures outside the handshake itself (e.g. the channel is
    /// already encrypted).
    async fn start_tls(&mut self) -> Result<bool>;

    /// Prompts for missing credentials, filling `credentials` in place.
    /// Returns false when the prompt was dismissed.
    async fn open_password_dialog(&mut self, credentials: &mut Credentials) -> bool;

    /// Announces that the engine is about to pull body data.
    ///
    /// # Errors
    ///
    /// When no body source is available.
    async fn data_req(&mut self) -> Result<()>;

    /// Pulls the next chunk of message body into `buffer`, returning its
    /// length. Zero means end of body.
    ///
    /// # Errors
    ///
    /// Upstream read failures; fatal to the transaction.
    async fn read_data(&mut self, buffer: &mut Vec<u8>) -> Result<usize>;
}
