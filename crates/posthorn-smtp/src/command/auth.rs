//! AUTH: SASL challenge/response negotiation.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use posthorn_sasl::{Credentials, Mechanism, SaslClient, StandardClient};

use crate::command::Progress;
use crate::error::{Error, Result};
use crate::session::SmtpSession;
use crate::types::Response;

/// Authenticates the session through a SASL mechanism.
///
/// One long-lived command instance drives the whole exchange. The first
/// line is `AUTH <mechanism>` with the base64 initial response appended
/// when the mechanism has one (`=` when that response is empty, per RFC
/// 4954); each further line answers the last server challenge. A one-step
/// mechanism is complete after its first line and expects exactly one
/// reply.
///
/// A failure on the first round means the server refused the mechanism
/// itself; a failure on any later round means the credentials were not
/// accepted. Both are terminal and close the connection.
pub struct AuthCommand {
    pub(super) progress: Progress,
    sasl: Option<Box<dyn SaslClient>>,
    credentials: Credentials,
    last_challenge: Option<String>,
    first_line_sent: bool,
    rounds: u32,
}

impl AuthCommand {
    /// Negotiates a mechanism from the server-advertised list.
    ///
    /// When no advertised mechanism is supported, the command opts out via
    /// [`do_not_execute`](Self::do_not_execute); the transaction driver
    /// decides whether that is an error.
    #[must_use]
    pub fn new(advertised: &[String], credentials: Credentials) -> Self {
        let sasl = Mechanism::choose(advertised.iter().map(String::as_str)).map(
            |mechanism| {
                Box::new(StandardClient::new(mechanism, credentials.clone()))
                    as Box<dyn SaslClient>
            },
        );
        if let Some(client) = &sasl {
            tracing::debug!(mechanism = client.mechanism(), "authentication mechanism selected");
        }
        Self {
            progress: Progress::default(),
            sasl,
            credentials,
            last_challenge: None,
            first_line_sent: false,
            rounds: 0,
        }
    }

    /// Uses an externally supplied negotiation client instead of the
    /// standard mechanisms.
    #[must_use]
    pub fn from_client(client: Box<dyn SaslClient>, credentials: Credentials) -> Self {
        Self {
            progress: Progress::default(),
            sasl: Some(client),
            credentials,
            last_challenge: None,
            first_line_sent: false,
            rounds: 0,
        }
    }

    /// The negotiated mechanism name, if any was mutually supported.
    #[must_use]
    pub fn mechanism(&self) -> Option<&'static str> {
        self.sasl.as_ref().map(|client| client.mechanism())
    }

    pub(super) fn do_not_execute(&self) -> bool {
        self.sasl.is_none()
    }

    pub(super) async fn next_command_line<S: SmtpSession>(
        &mut self,
        session: &mut S,
    ) -> Result<Vec<u8>> {
        if let Some(line) = self.progress.take_replay() {
            return Ok(line);
        }
        let Some(sasl) = self.sasl.as_mut() else {
            return Err(Error::protocol("AUTH issued without a negotiated mechanism"));
        };

        if self.first_line_sent {
            // Answer the last challenge.
            let challenge = self.last_challenge.take().unwrap_or_default();
            let decoded = STANDARD.decode(challenge.trim()).map_err(|_| {
                Error::Protocol(format!("invalid base64 in AUTH challenge: {challenge:?}"))
            })?;
            let answer = sasl.step(&decoded)?;
            self.progress.complete = sasl.is_done();
            self.progress.needs_response = true;
            let mut line = STANDARD.encode(answer);
            line.push_str("\r\n");
            return Ok(line.into_bytes());
        }

        if sasl.needs_credentials() {
            let mut credentials = self.credentials.clone();
            if !session.open_password_dialog(&mut credentials).await {
                return Err(Error::AuthAborted);
            }
            sasl.supply(credentials);
        }

        let mut line = format!("AUTH {}", sasl.mechanism());
        match sasl.initial_response()? {
            Some(blob) if blob.is_empty() => line.push_str(" ="),
            Some(blob) => {
                line.push(' ');
                line.push_str(&STANDARD.encode(blob));
            }
            None => {}
        }
        line.push_str("\r\n");

        self.first_line_sent = true;
        self.progress.complete = sasl.is_done();
        self.progress.needs_response = true;
        Ok(line.into_bytes())
    }

    pub(super) fn process_response<S: SmtpSession>(
        &mut self,
        session: &mut S,
        response: &Response,
    ) -> bool {
        self.progress.needs_response = false;
        self.rounds += 1;

        if !response.is_positive() && !response.is_intermediate() {
            let error = if self.rounds == 1 {
                Error::AuthMechanismRejected {
                    mechanism: self.mechanism().unwrap_or("AUTH").to_string(),
                    code: response.code(),
                    message: response.text(),
                }
            } else {
                Error::AuthenticationFailed {
                    code: response.code(),
                    message: response.text(),
                }
            };
            return self.progress.fail(session, error);
        }

        if response.is_positive() {
            self.progress.complete = true;
            return true;
        }

        // Continuation. A challenge after the mechanism finished means the
        // server and the mechanism disagree; treat as failed credentials.
        if self.progress.complete {
            return self.progress.fail(
                session,
                Error::AuthenticationFailed {
                    code: response.code(),
                    message: response.text(),
                },
            );
        }
        self.last_challenge = Some(response.first_line().to_string());
        true
    }
}

impl std::fmt::Debug for AuthCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCommand")
            .field("mechanism", &self.mechanism())
            .field("first_line_sent", &self.first_line_sent)
            .field("rounds", &self.rounds)
            .finish_non_exhaustive()
    }
}
