//! Low-level SMTP stream handling: plain TCP or rustls TLS.

use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};

use crate::error::{Error, Result};
use crate::parser::{is_last_line, parse_response};
use crate::types::Response;

/// The wire to the server, line-oriented on the read side.
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(BufReader<TcpStream>),
    /// TLS-encrypted connection.
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<TcpStream>>>),
    /// No connection; reads and writes fail. Left behind after a failed
    /// TLS upgrade or an explicit close.
    Closed,
}

impl SmtpStream {
    /// Returns true when the channel is encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    /// Reads one line, stripped of its line ending.
    ///
    /// # Errors
    ///
    /// Transport failures; a clean remote close surfaces as
    /// [`std::io::ErrorKind::UnexpectedEof`].
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = match self {
            Self::Tcp(reader) => reader.read_line(&mut line).await?,
            Self::Tls(reader) => reader.read_line(&mut line).await?,
            Self::Closed => return Err(not_connected()),
        };
        if read == 0 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "server closed the connection",
            )));
        }
        Ok(line.trim_end().to_string())
    }

    /// Reads and parses one complete reply, assembling `-` continuation
    /// lines.
    ///
    /// # Errors
    ///
    /// Transport failures and malformed replies.
    pub async fn read_response(&mut self) -> Result<Response> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await?;
            tracing::trace!(line = %line, "S:");
            let last = is_last_line(&line);
            lines.push(line);
            if last {
                break;
            }
        }
        parse_response(&lines)
    }

    /// Writes and flushes raw bytes.
    ///
    /// # Errors
    ///
    /// Transport failures.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Tcp(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Tls(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Closed => return Err(not_connected()),
        }
        Ok(())
    }

    /// Upgrades a plain TCP stream to TLS.
    ///
    /// # Errors
    ///
    /// When the stream is already encrypted or the handshake fails.
    pub async fn upgrade_to_tls(self, hostname: &str) -> Result<Self> {
        let tcp = match self {
            Self::Tcp(reader) => reader.into_inner(),
            Self::Tls(_) => return Err(Error::protocol("channel is already encrypted")),
            Self::Closed => return Err(not_connected()),
        };

        let connector = tls_connector();
        let server_name = ServerName::try_from(hostname.to_string())
            .map_err(|_| Error::Protocol(format!("invalid hostname: {hostname}")))?;

        let tls = connector.connect(server_name, tcp).await?;
        Ok(Self::Tls(Box::new(BufReader::new(tls))))
    }
}

/// Connects over plain TCP (ports 25 and 587).
///
/// # Errors
///
/// Connection failures.
pub async fn connect(hostname: &str, port: u16) -> Result<SmtpStream> {
    let stream = TcpStream::connect((hostname, port)).await?;
    tracing::debug!(hostname, port, "connected");
    Ok(SmtpStream::Tcp(BufReader::new(stream)))
}

/// Connects with implicit TLS (port 465).
///
/// # Errors
///
/// Connection or handshake failures.
pub async fn connect_tls(hostname: &str, port: u16) -> Result<SmtpStream> {
    let tcp = TcpStream::connect((hostname, port)).await?;

    let connector = tls_connector();
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("invalid hostname: {hostname}")))?;

    let tls = connector.connect(server_name, tcp).await?;
    tracing::debug!(hostname, port, "connected with implicit TLS");
    Ok(SmtpStream::Tls(Box::new(BufReader::new(tls))))
}

fn tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

fn not_connected() -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        "not connected",
    ))
}
