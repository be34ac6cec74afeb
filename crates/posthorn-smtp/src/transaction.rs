//! Per-transaction state.

use crate::types::Response;

/// One rejected recipient and the server's reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// The recipient address as sent in RCPT TO.
    pub address: String,
    /// The server's reply text.
    pub reason: String,
}

impl Rejection {
    /// Creates a rejection record.
    #[must_use]
    pub fn new(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.address, self.reason)
    }
}

/// Mutable accumulator for one SMTP transaction: one MAIL FROM, any number
/// of RCPT TO, one DATA.
///
/// Exclusively owned by the driver and passed by mutable reference into
/// every transaction-scoped command call. A rejected recipient is recorded
/// here rather than raised as an error; the transaction proceeds as long as
/// at least one recipient was accepted. Once [`failed`](Self::failed) turns
/// true the transaction is terminal and the recorded sets no longer change.
#[derive(Debug, Default)]
pub struct TransactionState {
    mail_from_failure: Option<Response>,
    rejected: Vec<Rejection>,
    accepted: usize,
    data_command_issued: bool,
    data_command_succeeded: bool,
    data_failure: Option<Response>,
    message_failure: Option<Response>,
    failed: bool,
    complete: bool,
}

impl TransactionState {
    /// Creates the state for a fresh transaction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the reply that rejected MAIL FROM. Terminal: the sender has
    /// no partial success.
    pub fn record_mail_from_failure(&mut self, response: &Response) {
        if self.failed {
            return;
        }
        self.mail_from_failure = Some(response.clone());
        self.failed = true;
    }

    /// The reply that rejected MAIL FROM, if it was rejected.
    #[must_use]
    pub const fn mail_from_failure(&self) -> Option<&Response> {
        self.mail_from_failure.as_ref()
    }

    /// Records one accepted recipient.
    pub fn record_accepted_recipient(&mut self) {
        if !self.failed {
            self.accepted += 1;
        }
    }

    /// Records one rejected recipient with the server's reason.
    pub fn record_rejected_recipient(&mut self, address: &str, response: &Response) {
        if !self.failed {
            self.rejected.push(Rejection::new(address, response.text()));
        }
    }

    /// Returns true once at least one RCPT TO succeeded.
    #[must_use]
    pub const fn recipient_accepted(&self) -> bool {
        self.accepted > 0
    }

    /// Number of accepted recipients.
    #[must_use]
    pub const fn accepted_count(&self) -> usize {
        self.accepted
    }

    /// The rejected recipients, in RCPT TO issue order.
    #[must_use]
    pub fn rejected_recipients(&self) -> &[Rejection] {
        &self.rejected
    }

    /// Marks whether DATA has been sent to the server.
    pub const fn set_data_command_issued(&mut self, issued: bool) {
        self.data_command_issued = issued;
    }

    /// Returns true once DATA has been sent.
    #[must_use]
    pub const fn data_command_issued(&self) -> bool {
        self.data_command_issued
    }

    /// Records the 354 go-ahead for DATA.
    pub const fn set_data_command_succeeded(&mut self) {
        self.data_command_succeeded = true;
    }

    /// Returns true once the server agreed to receive the body.
    #[must_use]
    pub const fn data_command_succeeded(&self) -> bool {
        self.data_command_succeeded
    }

    /// Records the reply that refused DATA. Terminal.
    pub fn record_data_failure(&mut self, response: &Response) {
        if self.failed {
            return;
        }
        self.data_failure = Some(response.clone());
        self.failed = true;
    }

    /// The reply that refused DATA, if it was refused.
    #[must_use]
    pub const fn data_failure(&self) -> Option<&Response> {
        self.data_failure.as_ref()
    }

    /// Records the reply that rejected the message content after the body
    /// was transferred. Terminal.
    pub fn record_message_failure(&mut self, response: &Response) {
        if self.failed {
            return;
        }
        self.message_failure = Some(response.clone());
        self.failed = true;
    }

    /// The reply that rejected the message content, if it was rejected.
    #[must_use]
    pub const fn message_failure(&self) -> Option<&Response> {
        self.message_failure.as_ref()
    }

    /// Marks the transaction failed with no associated reply (e.g. every
    /// recipient rejected, or an abort from the session layer).
    pub const fn set_failed(&mut self) {
        self.failed = true;
    }

    /// Returns true once the transaction is terminal without success.
    #[must_use]
    pub const fn failed(&self) -> bool {
        self.failed
    }

    /// Marks the transaction finished (the DATA reply was processed).
    pub const fn set_complete(&mut self) {
        self.complete = true;
    }

    /// Returns true once the transaction finished.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }
}
