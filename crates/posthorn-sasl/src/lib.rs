//! # posthorn-sasl
//!
//! SASL client-side mechanism negotiation for mail protocols.
//!
//! A SASL exchange is a sequence of rounds: the client may open with an
//! initial response, the server may answer with challenges, and the client
//! answers each challenge until the mechanism reports completion. Mechanisms
//! differ in round count — PLAIN and the `OAuth2` mechanisms finish in one
//! round, LOGIN takes two.
//!
//! The protocol engine drives the exchange through the [`SaslClient`]
//! interface and never sees mechanism internals; wire-level base64 framing
//! is the engine's concern, so challenges and responses here are raw bytes.
//!
//! ## Quick Start
//!
//! ```
//! use posthorn_sasl::{Credentials, Mechanism, SaslClient, StandardClient};
//!
//! let advertised = ["LOGIN", "PLAIN"];
//! let mechanism = Mechanism::choose(advertised.iter().copied()).unwrap();
//! assert_eq!(mechanism, Mechanism::Plain);
//!
//! let credentials = Credentials::new("alice", "wonderland");
//! let mut client = StandardClient::new(mechanism, credentials);
//!
//! let initial = client.initial_response().unwrap();
//! assert_eq!(initial.as_deref(), Some(&b"\0alice\0wonderland"[..]));
//! assert!(client.is_done());
//! ```

pub mod client;
mod error;
pub mod mechanism;

pub use client::{Credentials, SaslClient, StandardClient};
pub use error::{Error, Result};
pub use mechanism::Mechanism;
