//! MAIL FROM and RCPT TO.
//!
//! The two envelope commands split on failure handling: a rejected sender
//! aborts the whole transaction, while a rejected recipient is recorded and
//! absorbed so the remaining recipients still get their chance. Both record
//! outcomes in the [`TransactionState`]; delivery failures are reported once
//! at transaction level, not per command.

use crate::command::Progress;
use crate::session::SmtpSession;
use crate::transaction::TransactionState;
use crate::types::{Address, Response, response::OK};

/// MAIL FROM, optionally with `BODY=8BITMIME` and `SIZE` parameters when
/// the server advertised the matching extensions.
#[derive(Debug)]
pub struct MailFromCommand {
    pub(super) progress: Progress,
    address: Address,
    size: Option<usize>,
    eight_bit: bool,
}

impl MailFromCommand {
    /// Creates the command for the envelope sender.
    ///
    /// `size` is the message size for the SIZE parameter; `eight_bit`
    /// requests `BODY=8BITMIME`. Either is silently dropped when the server
    /// did not advertise the extension.
    #[must_use]
    pub fn new(address: Address, size: Option<usize>, eight_bit: bool) -> Self {
        Self {
            progress: Progress::default(),
            address,
            size,
            eight_bit,
        }
    }

    pub(super) fn next_command_line<S: SmtpSession>(&mut self, session: &S) -> Vec<u8> {
        if let Some(line) = self.progress.take_replay() {
            return line;
        }

        let mut line = format!("MAIL FROM:<{}>", self.address);
        if self.eight_bit && session.have_capability("8BITMIME") {
            line.push_str(" BODY=8BITMIME");
        }
        if let Some(size) = self.size {
            if session.have_capability("SIZE") {
                line.push_str(&format!(" SIZE={size}"));
            }
        }
        line.push_str("\r\n");

        self.progress.emitted_final();
        line.into_bytes()
    }

    pub(super) fn process_response(
        &mut self,
        response: &Response,
        state: &mut TransactionState,
    ) -> bool {
        self.progress.needs_response = false;
        if response.code() == OK {
            return true;
        }
        tracing::debug!(code = response.code(), "sender rejected");
        state.record_mail_from_failure(response);
        false
    }

    /// The envelope sender address.
    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }
}

/// RCPT TO, one instance per recipient.
#[derive(Debug)]
pub struct RcptToCommand {
    pub(super) progress: Progress,
    address: Address,
}

impl RcptToCommand {
    /// Creates the command for one envelope recipient.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            progress: Progress::default(),
            address,
        }
    }

    pub(super) fn next_command_line(&mut self) -> Vec<u8> {
        if let Some(line) = self.progress.take_replay() {
            return line;
        }
        self.progress.emitted_final();
        format!("RCPT TO:<{}>\r\n", self.address).into_bytes()
    }

    pub(super) fn process_response(
        &mut self,
        response: &Response,
        state: &mut TransactionState,
    ) -> bool {
        self.progress.needs_response = false;
        if response.is_positive() {
            state.record_accepted_recipient();
        } else {
            // Absorbed: the transaction carries on with the other
            // recipients as long as one of them is accepted.
            tracing::debug!(
                recipient = %self.address,
                code = response.code(),
                "recipient rejected"
            );
            state.record_rejected_recipient(self.address.as_str(), response);
        }
        true
    }
}
