//! Envelope address type.

use crate::error::{Error, Result};

/// A validated SMTP envelope address, as used in MAIL FROM and RCPT TO.
///
/// Validation is deliberately shallow (one `@`, non-empty local and domain
/// parts); full RFC 5321 address grammar is the receiving server's call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates an address from a string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] when the shape is obviously wrong.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(addr: &str) -> Result<()> {
        let Some((local, domain)) = addr.split_once('@') else {
            return Err(Error::InvalidAddress(format!("{addr}: missing @")));
        };
        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(format!(
                "{addr}: empty local or domain part"
            )));
        }
        if domain.contains('@') {
            return Err(Error::InvalidAddress(format!(
                "{addr}: more than one @"
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn valid_address() {
        let addr = Address::new("user@example.com").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
        assert_eq!(addr.to_string(), "user@example.com");
    }

    #[test]
    fn rejects_malformed() {
        assert!(Address::new("").is_err());
        assert!(Address::new("userexample.com").is_err());
        assert!(Address::new("@example.com").is_err());
        assert!(Address::new("user@").is_err());
        assert!(Address::new("user@ex@ample.com").is_err());
    }

    #[test]
    fn from_str_round_trip() {
        let addr: Address = "a@b.example".parse().unwrap();
        assert_eq!(addr.as_str(), "a@b.example");
    }
}
