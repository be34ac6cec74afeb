//! NOOP, RSET and QUIT: stateless single-line, single-reply commands.

use crate::command::{CommandFlags, Progress};
use crate::error::Error;
use crate::session::SmtpSession;
use crate::types::Response;

/// A session command with no transaction interaction.
#[derive(Debug)]
pub struct SimpleCommand {
    pub(super) progress: Progress,
    verb: &'static str,
    flags: CommandFlags,
}

impl SimpleCommand {
    /// NOOP keepalive.
    #[must_use]
    pub fn noop() -> Self {
        Self::new("NOOP", CommandFlags::NONE)
    }

    /// RSET transaction cleanup.
    #[must_use]
    pub fn rset() -> Self {
        Self::new("RSET", CommandFlags::NONE)
    }

    /// QUIT. The connection is closed afterwards either way.
    #[must_use]
    pub fn quit() -> Self {
        Self::new("QUIT", CommandFlags::FATAL)
    }

    fn new(verb: &'static str, flags: CommandFlags) -> Self {
        Self {
            progress: Progress::default(),
            verb,
            flags,
        }
    }

    pub(super) const fn flags(&self) -> CommandFlags {
        self.flags
    }

    pub(super) fn next_command_line(&mut self) -> Vec<u8> {
        if let Some(line) = self.progress.take_replay() {
            return line;
        }
        self.progress.emitted_final();
        format!("{}\r\n", self.verb).into_bytes()
    }

    pub(super) fn process_response<S: SmtpSession>(
        &mut self,
        session: &mut S,
        response: &Response,
    ) -> bool {
        self.progress.needs_response = false;
        if response.is_positive() {
            return true;
        }
        self.progress.fail(
            session,
            Error::UnexpectedReply {
                command: self.verb,
                code: response.code(),
                message: response.text(),
            },
        )
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

    #[test]
    fn renders_verbs() {
        assert_eq!(SimpleCommand::noop().next_command_line(), b"NOOP\r\n");
        assert_eq!(SimpleCommand::rset().next_command_line(), b"RSET\r\n");
        assert_eq!(SimpleCommand::quit().next_command_line(), b"QUIT\r\n");
    }

    #[test]
    fn positive_reply_succeeds() {
        let mut session = MockSession::new();
        let mut cmd = SimpleCommand::rset();
        let _ = cmd.next_command_line();
        assert!(cmd.process_response(&mut session, &reply(250, "flushed")));
    }

    #[test]
    fn quit_accepts_221() {
        let mut session = MockSession::new();
        let mut cmd = SimpleCommand::quit();
        let _ = cmd.next_command_line();
        assert!(cmd.process_response(&mut session, &reply(221, "bye")));
    }

    #[test]
    fn negative_reply_reports_the_verb() {
        let mut session = MockSession::new();
        let mut cmd = SimpleCommand::noop();
        let _ = cmd.next_command_line();
        assert!(!cmd.process_response(&mut session, &reply(421, "shutting down")));
        assert!(session.reported_errors()[0].starts_with("NOOP failed"));
    }
}
