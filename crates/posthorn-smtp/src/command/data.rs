//! DATA and the message body transfer.

use crate::codec::BodyEncoder;
use crate::command::Progress;
use crate::error::Result;
use crate::session::SmtpSession;
use crate::transaction::TransactionState;
use crate::types::{Response, response::START_DATA};

/// DATA: asks the server to start receiving the message body.
///
/// Success is reply code 354 exactly.
#[derive(Debug, Default)]
pub struct DataCommand {
    pub(super) progress: Progress,
}

impl DataCommand {
    /// Creates the command.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn next_command_line(
        &mut self,
        state: Option<&mut TransactionState>,
    ) -> Vec<u8> {
        if let Some(line) = self.progress.take_replay() {
            return line;
        }
        if let Some(ts) = state {
            ts.set_data_command_issued(true);
        }
        self.progress.emitted_final();
        b"DATA\r\n".to_vec()
    }

    pub(super) fn process_response(
        &mut self,
        response: &Response,
        state: &mut TransactionState,
    ) -> bool {
        self.progress.needs_response = false;
        if response.code() == START_DATA {
            state.set_data_command_succeeded();
            return true;
        }
        tracing::debug!(code = response.code(), "DATA refused");
        state.record_data_failure(response);
        false
    }

    pub(super) fn unget_command_line(
        &mut self,
        line: Vec<u8>,
        state: Option<&mut TransactionState>,
    ) {
        self.progress.unget(line);
        if let Some(ts) = state {
            ts.set_data_command_issued(false);
        }
    }
}

/// Streams the message body after the 354 go-ahead.
///
/// Each `next_command_line` call pulls one chunk from the session's
/// upstream data source; an empty read means end of body and produces the
/// dot terminator. Encoding (CRLF canonicalization and dot-stuffing) is
/// applied unless the session asked for passthrough. Skipped entirely when
/// the transaction has already failed.
#[derive(Debug, Default)]
pub struct TransferCommand {
    pub(super) progress: Progress,
    encoder: Option<BodyEncoder>,
}

impl TransferCommand {
    /// Creates the command.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) async fn next_command_line<S: SmtpSession>(
        &mut self,
        session: &mut S,
    ) -> Result<Vec<u8>> {
        if let Some(line) = self.progress.take_replay() {
            return Ok(line);
        }

        let encode = session.body_encoding_requested();
        let encoder = self.encoder.get_or_insert_with(|| BodyEncoder::new(encode));

        session.data_req().await?;
        let mut chunk = Vec::new();
        let read = session.read_data(&mut chunk).await?;
        if read == 0 {
            // End of body: terminate, then wait for the final verdict.
            self.progress.complete = true;
            self.progress.needs_response = true;
            return Ok(encoder.finish().to_vec());
        }

        Ok(encoder.encode_chunk(&chunk[..read]))
    }

    pub(super) fn process_response(
        &mut self,
        response: &Response,
        state: &mut TransactionState,
    ) -> bool {
        self.progress.needs_response = false;
        state.set_complete();
        if response.is_positive() {
            return true;
        }
        tracing::debug!(code = response.code(), "message content rejected");
        state.record_message_failure(response);
        false
    }
}
