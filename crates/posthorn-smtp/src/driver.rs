//! The command execution loop.
//!
//! One session runs one command at a time: the driver asks the current
//! command for its next line, writes it through the session, reads a reply
//! when one is expected and feeds it back, until the command is complete.
//! There is no pipelining; `CommandFlags::only_last_in_pipeline` is honored
//! trivially by never having anything to pipeline after.
//!
//! Within one transaction the ordering is fixed: MAIL FROM must succeed
//! before any RCPT TO is issued, and at least one RCPT TO must succeed
//! before DATA and the body transfer run. [`run_transaction`] encodes that
//! sequence and folds the outcome into a [`TransactionSummary`].

use crate::command::{
    Command, DataCommand, MailFromCommand, RcptToCommand, TransferCommand,
};
use crate::error::{Error, Result};
use crate::session::SmtpSession;
use crate::transaction::{Rejection, TransactionState};
use crate::types::Address;

/// The outcome of one completed transaction.
///
/// A transaction with rejected recipients but at least one accepted is a
/// partial success, not an error; the rejected subset is listed here.
#[derive(Debug, Clone)]
pub struct TransactionSummary {
    /// Number of recipients the server accepted.
    pub accepted: usize,
    /// Recipients the server rejected, in RCPT TO issue order.
    pub rejected: Vec<Rejection>,
}

impl TransactionSummary {
    /// Returns true when some recipients were rejected.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// Runs one command to completion against the session.
///
/// Returns `Ok(true)` when the command succeeded or opted out, `Ok(false)`
/// when it failed at protocol level (the failure has been recorded in the
/// transaction state or reported through the session). Whether a false
/// return tears down the connection is the caller's decision, informed by
/// [`Command::flags`].
///
/// # Errors
///
/// Transport failures and malformed replies; always fatal.
pub async fn execute<S: SmtpSession>(
    session: &mut S,
    command: &mut Command,
    mut state: Option<&mut TransactionState>,
) -> Result<bool> {
    if command.do_not_execute(state.as_deref()) {
        tracing::trace!("command opted out");
        return Ok(true);
    }

    loop {
        while !command.is_complete() && !command.needs_response() {
            let line = command
                .next_command_line(session, state.as_deref_mut())
                .await?;
            if !line.is_empty() {
                tracing::trace!(len = line.len(), "line sent");
                session.write(&line).await?;
            }
        }

        if !command.needs_response() {
            break;
        }
        let response = session.read_response().await?;
        tracing::trace!(code = response.code(), "reply received");
        if !command
            .process_response(session, &response, state.as_deref_mut())
            .await
        {
            return Ok(false);
        }
        if command.is_complete() && !command.needs_response() {
            break;
        }
    }

    Ok(true)
}

/// Runs one full mail transaction: MAIL FROM, one RCPT TO per recipient,
/// DATA and the body transfer.
///
/// The body is pulled from the session's data source. Recipient rejections
/// are absorbed along the way; the transaction only fails outright when the
/// sender is rejected, every recipient is rejected, or the server refuses
/// the data phase. Terminal failures are reported once through
/// [`SmtpSession::error`] and also returned.
///
/// # Errors
///
/// Transport failures, plus the transaction-level rejections described
/// above.
pub async fn run_transaction<S: SmtpSession>(
    session: &mut S,
    from: &Address,
    recipients: &[Address],
    message_size: Option<usize>,
    eight_bit: bool,
) -> Result<TransactionSummary> {
    let mut state = TransactionState::new();

    let mut mail_from = Command::from(MailFromCommand::new(
        from.clone(),
        message_size,
        eight_bit,
    ));
    if !execute(session, &mut mail_from, Some(&mut state)).await? {
        return Err(report(session, sender_failure(from, &state)));
    }

    for recipient in recipients {
        let mut rcpt = Command::from(RcptToCommand::new(recipient.clone()));
        // Rejections are absorbed into the state; only transport failures
        // abort here.
        execute(session, &mut rcpt, Some(&mut state)).await?;
    }

    if !state.recipient_accepted() {
        state.set_failed();
        let error = Error::AllRecipientsRejected(state.rejected_recipients().to_vec());
        return Err(report(session, error));
    }

    let mut data = Command::from(DataCommand::new());
    if !execute(session, &mut data, Some(&mut state)).await? {
        return Err(report(session, data_failure(&state)));
    }

    let mut transfer = Command::from(TransferCommand::new());
    if !execute(session, &mut transfer, Some(&mut state)).await? {
        return Err(report(session, message_failure(&state)));
    }

    let summary = TransactionSummary {
        accepted: state.accepted_count(),
        rejected: state.rejected_recipients().to_vec(),
    };
    if summary.is_partial() {
        tracing::warn!(
            accepted = summary.accepted,
            rejected = summary.rejected.len(),
            "transaction complete with rejected recipients"
        );
    } else {
        tracing::debug!(accepted = summary.accepted, "transaction complete");
    }
    Ok(summary)
}

fn report<S: SmtpSession>(session: &mut S, error: Error) -> Error {
    session.error(&error);
    error
}

fn sender_failure(from: &Address, state: &TransactionState) -> Error {
    state.mail_from_failure().map_or_else(
        || Error::protocol("MAIL FROM failed without a recorded reply"),
        |reply| Error::SenderRejected {
            address: from.to_string(),
            code: reply.code(),
            message: reply.text(),
        },
    )
}

fn data_failure(state: &TransactionState) -> Error {
    state.data_failure().map_or_else(
        || Error::protocol("DATA failed without a recorded reply"),
        |reply| Error::DataRejected {
            code: reply.code(),
            message: reply.text(),
        },
    )
}

fn message_failure(state: &TransactionState) -> Error {
    state.message_failure().map_or_else(
        || Error::protocol("message transfer failed without a recorded reply"),
        |reply| Error::MessageRejected {
            code: reply.code(),
            message: reply.text(),
        },
    )
}
