//! EHLO with a single HELO fallback.

use crate::command::Progress;
use crate::error::Error;
use crate::session::SmtpSession;
use crate::types::Response;

/// Greets the server and learns its capabilities.
///
/// Sends `EHLO <hostname>` first. If the server answers 500 or 502 the
/// command falls back exactly once to `HELO <hostname>`; a second such
/// reply is fatal and reported distinctly. On success the capability list
/// is handed to the session for caching.
#[derive(Debug)]
pub struct EhloCommand {
    pub(super) progress: Progress,
    hostname: String,
    ehlo_rejected: bool,
}

impl EhloCommand {
    /// Creates the greeting for the given client hostname.
    #[must_use]
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            progress: Progress::default(),
            hostname: hostname.into(),
            ehlo_rejected: false,
        }
    }

    pub(super) fn next_command_line(&mut self) -> Vec<u8> {
        if let Some(line) = self.progress.take_replay() {
            return line;
        }
        let verb = if self.ehlo_rejected { "HELO" } else { "EHLO" };
        self.progress.emitted_final();
        format!("{verb} {}\r\n", self.hostname).into_bytes()
    }

    pub(super) fn process_response<S: SmtpSession>(
        &mut self,
        session: &mut S,
        response: &Response,
    ) -> bool {
        self.progress.needs_response = false;

        if response.is_unknown_command() {
            if self.ehlo_rejected {
                // HELO drew the same treatment; no third attempt.
                return self.progress.fail(
                    session,
                    Error::HelloUnsupported {
                        code: response.code(),
                        message: response.text(),
                    },
                );
            }
            tracing::debug!(code = response.code(), "EHLO not recognized, retrying with HELO");
            self.ehlo_rejected = true;
            self.progress.complete = false;
            return true;
        }

        if !response.is_positive() {
            return self.progress.fail(
                session,
                Error::HelloRejected {
                    code: response.code(),
                    message: response.text(),
                },
            );
        }

        session.parse_features(response);
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testutil::MockSession;
    use crate::types::Response;

    fn reply(code: u16, line: &str) -> Response {
        Response::new(code, vec![line.to_string()])
    }

    #[test]
    fn ehlo_success_caches_features() {
        let mut session = MockSession::new();
        let mut cmd = EhloCommand::new("client.example.com");

        assert_eq!(cmd.next_command_line(), b"EHLO client.example.com\r\n");
        assert!(cmd.progress.complete);

        let r = Response::new(
            250,
            vec!["hi".to_string(), "STARTTLS".to_string()],
        );
        assert!(cmd.process_response(&mut session, &r));
        assert!(session.have_capability("STARTTLS"));
    }

    #[test]
    fn falls_back_to_helo_exactly_once() {
        let mut session = MockSession::new();
        let mut cmd = EhloCommand::new("client.example.com");

        assert_eq!(cmd.next_command_line(), b"EHLO client.example.com\r\n");
        assert!(cmd.process_response(&mut session, &reply(500, "unrecognized")));
        assert!(!cmd.progress.complete);

        assert_eq!(cmd.next_command_line(), b"HELO client.example.com\r\n");
        assert!(cmd.process_response(&mut session, &reply(250, "hello")));
        assert!(cmd.progress.complete);
        assert!(session.reported_errors().is_empty());
    }

    #[test]
    fn second_unknown_command_is_fatal() {
        let mut session = MockSession::new();
        let mut cmd = EhloCommand::new("client.example.com");

        let _ = cmd.next_command_line();
        assert!(cmd.process_response(&mut session, &reply(500, "what")));
        let _ = cmd.next_command_line();
        assert!(!cmd.process_response(&mut session, &reply(502, "still no")));

        // Fatal and terminal: no third greeting is offered.
        assert!(cmd.progress.complete);
        let errors = session.reported_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("neither EHLO nor HELO"));
    }

    #[test]
    fn negative_reply_is_distinct_from_unknown_command() {
        let mut session = MockSession::new();
        let mut cmd = EhloCommand::new("client.example.com");

        let _ = cmd.next_command_line();
        assert!(!cmd.process_response(&mut session, &reply(550, "go away")));
        assert!(session.reported_errors()[0].contains("rejected our hello"));
    }

    #[test]
    fn unget_replays_verbatim() {
        let mut cmd = EhloCommand::new("client.example.com");
        let line = cmd.next_command_line();
        assert!(cmd.progress.complete);

        cmd.progress.unget(line.clone());
        assert!(!cmd.progress.complete);

        let replayed = cmd.next_command_line();
        assert_eq!(replayed, line);
        assert!(cmd.progress.complete);
    }
}
