//! # posthorn-smtp
//!
//! Client-side SMTP transaction engine implementing RFC 5321.
//!
//! ## Architecture
//!
//! The protocol is a sequence of composable command objects. Each command
//! renders its own wire bytes, interprets the server reply it triggered, and
//! folds partial failures into a shared [`TransactionState`]:
//!
//! - [`types::Response`] - one parsed server reply (code + text lines)
//! - [`transaction::TransactionState`] - accumulator for one mail
//!   transaction (MAIL FROM, N x RCPT TO, DATA)
//! - [`command::Command`] - the protocol state-machine unit, a tagged
//!   variant over EHLO/HELO, STARTTLS, AUTH, MAIL FROM, RCPT TO, DATA,
//!   body transfer and NOOP/RSET/QUIT
//! - [`session::SmtpSession`] - the injected boundary the engine calls out
//!   to: socket write, reply read, TLS upgrade, capability lookup,
//!   credential prompting, error reporting, body-data pull
//! - [`driver`] - the loop that asks the current command for its next line,
//!   writes it, reads a reply and feeds it back
//!
//! Recipient-level partial failure is first-class: a transaction proceeds to
//! DATA as long as at least one RCPT TO succeeded, and the rejected subset
//! is reported separately from a hard delivery failure.
//!
//! ## Quick Start
//!
//! ```ignore
//! use posthorn_smtp::connection::{Mailer, SessionConfig};
//! use posthorn_smtp::types::Address;
//!
//! #[tokio::main]
//! async fn main() -> posthorn_smtp::Result<()> {
//!     let config = SessionConfig::new("mail.example.com", "client.example.com");
//!     let mut mailer = Mailer::connect(config, 587).await?;
//!     mailer.handshake().await?;
//!
//!     let from = Address::new("sender@example.com")?;
//!     let to = [Address::new("recipient@example.com")?];
//!     let message = b"Subject: Test\r\n\r\nHello, World!\r\n";
//!
//!     let summary = mailer.send(&from, &to, message).await?;
//!     println!("accepted {} recipient(s)", summary.accepted);
//!
//!     mailer.quit().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: the command set and its shared contract
//! - [`driver`]: command execution loop
//! - [`codec`]: body CRLF canonicalization and dot-stuffing
//! - [`connection`]: concrete tokio session (TCP + rustls) and [`Mailer`]
//! - [`parser`]: reply parser
//! - [`session`]: the session-interface boundary
//! - [`transaction`]: per-transaction state
//! - [`types`]: responses, capabilities, envelope addresses
//!
//! [`Mailer`]: connection::Mailer
//! [`TransactionState`]: transaction::TransactionState

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod command;
pub mod connection;
pub mod driver;
mod error;
pub mod parser;
pub mod session;
pub mod transaction;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use command::Command;
pub use connection::{Mailer, SessionConfig, TransactionSummary};
pub use error::{Error, Result};
pub use session::SmtpSession;
pub use transaction::{Rejection, TransactionState};
pub use types::{Address, Capabilities, Extension, Response};

/// SMTP protocol version supported.
pub const SMTP_VERSION: &str = "SMTP/ESMTP (RFC 5321)";
