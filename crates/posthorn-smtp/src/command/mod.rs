//! The command set.
//!
//! Each SMTP protocol step is a command object that renders its own wire
//! bytes and interprets the reply it triggered. [`Command`] is a tagged
//! variant over the ten steps; the shared contract is:
//!
//! - `next_command_line` produces the next CRLF-terminated line and updates
//!   the complete / needs-response flags. Only AUTH and the body transfer
//!   span multiple lines.
//! - `process_response` interprets the reply, returning true iff the step
//!   succeeded. Commands never retry on their own; retry or abort is the
//!   driver's decision, informed by [`CommandFlags`].
//! - `unget_command_line` reverses a premature send: the command is
//!   re-marked incomplete and the bytes are replayed verbatim by the next
//!   `next_command_line` call.
//! - `do_not_execute` lets a command opt out entirely, e.g. the body
//!   transfer once the transaction has already failed.
//!
//! Session-scoped commands report their own failures through
//! [`SmtpSession::error`] and stash the classified error for
//! [`Command::take_failure`]. Transaction-scoped commands (MAIL FROM,
//! RCPT TO, DATA, transfer) record outcomes in the [`TransactionState`]
//! instead, and the transaction driver reports once from there.

mod auth;
mod data;
mod envelope;
mod greeting;
mod simple;
mod tls;

pub use auth::AuthCommand;
pub use data::{DataCommand, TransferCommand};
pub use envelope::{MailFromCommand, RcptToCommand};
pub use greeting::EhloCommand;
pub use simple::SimpleCommand;
pub use tls::StartTlsCommand;

use crate::error::{Error, Result};
use crate::session::SmtpSession;
use crate::transaction::TransactionState;
use crate::types::Response;

/// Per-command dispatch hints for the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandFlags {
    /// Failure of this command tears down the connection instead of
    /// allowing an RSET and a fresh transaction.
    pub close_connection_on_error: bool,
    /// If pipelining is ever enabled, no command may be pipelined after
    /// this one. Documented extension point only; the driver never
    /// pipelines.
    pub only_last_in_pipeline: bool,
}

impl CommandFlags {
    /// No special handling.
    pub const NONE: Self = Self {
        close_connection_on_error: false,
        only_last_in_pipeline: false,
    };

    /// Connection-fatal on failure, and a pipeline barrier.
    pub const FATAL: Self = Self {
        close_connection_on_error: true,
        only_last_in_pipeline: true,
    };

    /// Pipeline barrier only.
    pub const LAST_IN_PIPELINE: Self = Self {
        close_connection_on_error: false,
        only_last_in_pipeline: true,
    };
}

/// Replay buffer captured by an unget.
#[derive(Debug)]
struct Unget {
    line: Vec<u8>,
    was_complete: bool,
    was_needs_response: bool,
}

/// Book-keeping shared by every command variant.
#[derive(Debug, Default)]
pub(crate) struct Progress {
    complete: bool,
    needs_response: bool,
    unget: Option<Unget>,
    failure: Option<Error>,
}

impl Progress {
    /// Marks the single command line of a one-line command as sent.
    fn emitted_final(&mut self) {
        self.complete = true;
        self.needs_response = true;
    }

    /// Buffers `line` for verbatim replay and re-marks the command
    /// incomplete. The pre-unget flags come back only once the replay
    /// happens.
    fn unget(&mut self, line: Vec<u8>) {
        self.unget = Some(Unget {
            line,
            was_complete: self.complete,
            was_needs_response: self.needs_response,
        });
        self.complete = false;
        self.needs_response = false;
    }

    /// Takes the replay buffer, restoring the pre-unget flags.
    fn take_replay(&mut self) -> Option<Vec<u8>> {
        self.unget.take().map(|unget| {
            self.complete = unget.was_complete;
            self.needs_response = unget.was_needs_response;
            unget.line
        })
    }

    /// Reports a classified failure once and stashes it for
    /// [`Command::take_failure`]. Returns false for direct use in
    /// `process_response`.
    fn fail<S: SmtpSession>(&mut self, session: &mut S, error: Error) -> bool {
        self.needs_response = false;
        session.error(&error);
        self.failure = Some(error);
        false
    }
}

/// One SMTP protocol step.
#[derive(Debug)]
pub enum Command {
    /// EHLO with a single HELO fallback.
    Ehlo(EhloCommand),
    /// STARTTLS and the delegated handshake.
    StartTls(StartTlsCommand),
    /// AUTH challenge/response negotiation.
    Auth(AuthCommand),
    /// MAIL FROM.
    MailFrom(MailFromCommand),
    /// RCPT TO, one instance per recipient.
    RcptTo(RcptToCommand),
    /// DATA.
    Data(DataCommand),
    /// Message body transfer after the DATA go-ahead.
    Transfer(TransferCommand),
    /// NOOP keepalive.
    Noop(SimpleCommand),
    /// RSET transaction cleanup.
    Rset(SimpleCommand),
    /// QUIT.
    Quit(SimpleCommand),
}

impl Command {
    /// NOOP keepalive command.
    #[must_use]
    pub fn noop() -> Self {
        Self::Noop(SimpleCommand::noop())
    }

    /// RSET cleanup command.
    #[must_use]
    pub fn rset() -> Self {
        Self::Rset(SimpleCommand::rset())
    }

    /// QUIT command.
    #[must_use]
    pub fn quit() -> Self {
        Self::Quit(SimpleCommand::quit())
    }

    /// Dispatch hints for the driver.
    #[must_use]
    pub const fn flags(&self) -> CommandFlags {
        match self {
            Self::Ehlo(_) | Self::StartTls(_) | Self::Auth(_) => CommandFlags::FATAL,
            Self::MailFrom(_) | Self::RcptTo(_) | Self::Transfer(_) => CommandFlags::NONE,
            Self::Data(_) => CommandFlags::LAST_IN_PIPELINE,
            Self::Noop(c) | Self::Rset(c) | Self::Quit(c) => c.flags(),
        }
    }

    /// Returns true once the command has emitted its final line.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.progress().complete
    }

    /// Returns true while a reply must be read before the next line may be
    /// produced.
    #[must_use]
    pub const fn needs_response(&self) -> bool {
        self.progress().needs_response
    }

    /// Guard predicate: true when this command should be skipped outright.
    #[must_use]
    pub fn do_not_execute(&self, state: Option<&TransactionState>) -> bool {
        match self {
            Self::Auth(c) => c.do_not_execute(),
            Self::Data(_) | Self::Transfer(_) => {
                state.is_some_and(TransactionState::failed)
            }
            _ => false,
        }
    }

    /// Produces the next CRLF-terminated wire line.
    ///
    /// # Errors
    ///
    /// Transport and negotiation failures; fatal to the command.
    pub async fn next_command_line<S: SmtpSession>(
        &mut self,
        session: &mut S,
        state: Option<&mut TransactionState>,
    ) -> Result<Vec<u8>> {
        match self {
            Self::Ehlo(c) => Ok(c.next_command_line()),
            Self::StartTls(c) => Ok(c.next_command_line()),
            Self::Auth(c) => c.next_command_line(session).await,
            Self::MailFrom(c) => Ok(c.next_command_line(session)),
            Self::RcptTo(c) => Ok(c.next_command_line()),
            Self::Data(c) => {
                debug_assert!(state.is_some(), "DATA outside a transaction");
                Ok(c.next_command_line(state))
            }
            Self::Transfer(c) => c.next_command_line(session).await,
            Self::Noop(c) | Self::Rset(c) | Self::Quit(c) => Ok(c.next_command_line()),
        }
    }

    /// Feeds the server reply back into the command. Returns true iff the
    /// step succeeded.
    pub async fn process_response<S: SmtpSession>(
        &mut self,
        session: &mut S,
        response: &Response,
        state: Option<&mut TransactionState>,
    ) -> bool {
        match self {
            Self::Ehlo(c) => c.process_response(session, response),
            Self::StartTls(c) => c.process_response(session, response).await,
            Self::Auth(c) => c.process_response(session, response),
            Self::MailFrom(c) => match state {
                Some(ts) => c.process_response(response, ts),
                None => {
                    debug_assert!(false, "MAIL FROM outside a transaction");
                    false
                }
            },
            Self::RcptTo(c) => match state {
                Some(ts) => c.process_response(response, ts),
                None => {
                    debug_assert!(false, "RCPT TO outside a transaction");
                    false
                }
            },
            Self::Data(c) => match state {
                Some(ts) => c.process_response(response, ts),
                None => {
                    debug_assert!(false, "DATA outside a transaction");
                    false
                }
            },
            Self::Transfer(c) => match state {
                Some(ts) => c.process_response(response, ts),
                None => {
                    debug_assert!(false, "transfer outside a transaction");
                    false
                }
            },
            Self::Noop(c) | Self::Rset(c) | Self::Quit(c) => {
                c.process_response(session, response)
            }
        }
    }

    /// Reverses a premature send; the bytes replay verbatim on the next
    /// `next_command_line` call.
    pub fn unget_command_line(
        &mut self,
        line: Vec<u8>,
        state: Option<&mut TransactionState>,
    ) {
        if let Self::Data(c) = self {
            c.unget_command_line(line, state);
        } else {
            self.progress_mut().unget(line);
        }
    }

    /// Takes the classified error a session-scoped command reported, if
    /// any. Transaction-scoped failures live in the [`TransactionState`]
    /// instead.
    pub fn take_failure(&mut self) -> Option<Error> {
        self.progress_mut().failure.take()
    }

    const fn progress(&self) -> &Progress {
        match self {
            Self::Ehlo(c) => &c.progress,
            Self::StartTls(c) => &c.progress,
            Self::Auth(c) => &c.progress,
            Self::MailFrom(c) => &c.progress,
            Self::RcptTo(c) => &c.progress,
            Self::Data(c) => &c.progress,
            Self::Transfer(c) => &c.progress,
            Self::Noop(c) | Self::Rset(c) | Self::Quit(c) => &c.progress,
        }
    }

    const fn progress_mut(&mut self) -> &mut Progress {
        match self {
            Self::Ehlo(c) => &mut c.progress,
            Self::StartTls(c) => &mut c.progress,
            Self::Auth(c) => &mut c.progress,
            Self::MailFrom(c) => &mut c.progress,
            Self::RcptTo(c) => &mut c.progress,
            Self::Data(c) => &mut c.progress,
            Self::Transfer(c) => &mut c.progress,
            Self::Noop(c) | Self::Rset(c) | Self::Quit(c) => &mut c.progress,
        }
    }
}

impl From<EhloCommand> for Command {
    fn from(c: EhloCommand) -> Self {
        Self::Ehlo(c)
    }
}

impl From<StartTlsCommand> for Command {
    fn from(c: StartTlsCommand) -> Self {
        Self::StartTls(c)
    }
}

impl From<AuthCommand> for Command {
    fn from(c: AuthCommand) -> Self {
        Self::Auth(c)
    }
}

impl From<MailFromCommand> for Command {
    fn from(c: MailFromCommand) -> Self {
        Self::MailFrom(c)
    }
}

impl From<RcptToCommand> for Command {
    fn from(c: RcptToCommand) -> Self {
        Self::RcptTo(c)
    }
}

impl From<DataCommand> for Command {
    fn from(c: DataCommand) -> Self {
        Self::Data(c)
    }
}

impl From<TransferCommand> for Command {
    fn from(c: TransferCommand) -> Self {
        Self::Transfer(c)
    }
}
