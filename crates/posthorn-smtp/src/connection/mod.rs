//! Concrete tokio session and the high-level mailer.
//!
//! [`Session`] binds the engine's session boundary to a real TCP or TLS
//! stream; [`Mailer`] strings the commands together for the common
//! connect → greet → secure → authenticate → send flow.

mod mailer;
mod stream;

pub use mailer::{Mailer, Session, SessionConfig, TlsPolicy};
pub use stream::{SmtpStream, connect, connect_tls};

pub use crate::driver::TransactionSummary;
