//! STARTTLS.

use crate::command::Progress;
use crate::error::Error;
use crate::session::SmtpSession;
use crate::types::{Response, response::SERVICE_READY};

/// Asks the server to switch to TLS and delegates the handshake.
///
/// Success is reply code 220 exactly. A protocol-level rejection and a
/// failed handshake are distinct error kinds; both tear the connection
/// down.
#[derive(Debug, Default)]
pub struct StartTlsCommand {
    pub(super) progress: Progress,
}

impl StartTlsCommand {
    /// Creates the command.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn next_command_line(&mut self) -> Vec<u8> {
        if let Some(line) = self.progress.take_replay() {
            return line;
        }
        self.progress.emitted_final();
        b"STARTTLS\r\n".to_vec()
    }

    pub(super) async fn process_response<S: SmtpSession>(
        &mut self,
        session: &mut S,
        response: &Response,
    ) -> bool {
        self.progress.needs_response = false;

        if response.code() != SERVICE_READY {
            return self.progress.fail(
                session,
                Error::StartTlsRejected {
                    code: response.code(),
                    message: response.text(),
                },
            );
        }

        match session.start_tls().await {
            Ok(true) => {
                tracing::debug!("channel upgraded to TLS");
                true
            }
            Ok(false) => self.progress.fail(session, Error::TlsHandshake),
            Err(error) => self.progress.fail(session, error),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testutil::MockSession;

    fn reply(code: u16, line: &str) -> Response {
        Response::new(code, vec![line.to_string()])
    }

    #[tokio::test]
    async fn upgrades_on_220() {
        let mut session = MockSession::new().with_start_tls_result(true);
        let mut cmd = StartTlsCommand::new();

        assert_eq!(cmd.next_command_line(), b"STARTTLS\r\n");
        assert!(cmd.process_response(&mut session, &reply(220, "go ahead")).await);
        assert_eq!(session.start_tls_calls(), 1);
    }

    #[tokio::test]
    async fn rejection_reported_without_handshake() {
        let mut session = MockSession::new().with_start_tls_result(true);
        let mut cmd = StartTlsCommand::new();

        let _ = cmd.next_command_line();
        assert!(
            !cmd.process_response(&mut session, &reply(454, "TLS unavailable"))
                .await
        );
        assert_eq!(session.start_tls_calls(), 0);
        assert!(session.reported_errors()[0].contains("rejected STARTTLS"));
    }

    #[tokio::test]
    async fn handshake_failure_is_distinct() {
        let mut session = MockSession::new().with_start_tls_result(false);
        let mut cmd = StartTlsCommand::new();

        let _ = cmd.next_command_line();
        assert!(!cmd.process_response(&mut session, &reply(220, "go ahead")).await);
        assert_eq!(session.start_tls_calls(), 1);
        assert!(session.reported_errors()[0].contains("TLS negotiation failed"));
    }

    #[tokio::test]
    async fn only_exact_220_counts() {
        // 250 is positive but not the STARTTLS go-ahead.
        let mut session = MockSession::new().with_start_tls_result(true);
        let mut cmd = StartTlsCommand::new();

        let _ = cmd.next_command_line();
        assert!(!cmd.process_response(&mut session, &reply(250, "ok?")).await);
        assert_eq!(session.start_tls_calls(), 0);
    }
}
