//! The concrete tokio session and the high-level send flow.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use posthorn_sasl::Credentials;

use crate::command::{AuthCommand, Command, EhloCommand, StartTlsCommand};
use crate::connection::stream::{self, SmtpStream};
use crate::driver::{self, TransactionSummary};
use crate::error::{Error, Result};
use crate::session::SmtpSession;
use crate::types::{Address, Capabilities, Response};

/// How big a body chunk the session serves per read.
const BODY_CHUNK_SIZE: usize = 8 * 1024;

/// When to upgrade the channel with STARTTLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsPolicy {
    /// Never upgrade.
    Never,
    /// Upgrade when the server advertises STARTTLS.
    #[default]
    Opportunistic,
    /// Fail the handshake when the channel cannot be secured.
    Required,
}

/// Configuration for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server hostname, used for TLS certificate validation.
    pub server_hostname: String,
    /// The hostname announced in EHLO.
    pub local_hostname: String,
    /// Credentials for AUTH; `None` sends unauthenticated.
    pub credentials: Option<Credentials>,
    /// STARTTLS policy for [`Mailer::handshake`].
    pub tls: TlsPolicy,
    /// Request `BODY=8BITMIME` on MAIL FROM when advertised.
    pub eight_bit: bool,
    /// Canonicalize line endings and dot-stuff the body. Turn off only for
    /// pre-encoded message data.
    pub body_encoding: bool,
    /// Free-form session configuration, exposed through `meta_data`.
    pub meta: HashMap<String, String>,
}

impl SessionConfig {
    /// Creates a config with the default policies: opportunistic STARTTLS,
    /// body encoding on, no authentication.
    #[must_use]
    pub fn new(
        server_hostname: impl Into<String>,
        local_hostname: impl Into<String>,
    ) -> Self {
        Self {
            server_hostname: server_hostname.into(),
            local_hostname: local_hostname.into(),
            credentials: None,
            tls: TlsPolicy::default(),
            eight_bit: false,
            body_encoding: true,
            meta: HashMap::new(),
        }
    }

    /// Sets the AUTH credentials.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the STARTTLS policy.
    #[must_use]
    pub const fn tls(mut self, policy: TlsPolicy) -> Self {
        self.tls = policy;
        self
    }

    /// Requests `BODY=8BITMIME` for transactions.
    #[must_use]
    pub const fn eight_bit(mut self) -> Self {
        self.eight_bit = true;
        self
    }

    /// Disables body encoding for pre-encoded message data.
    #[must_use]
    pub const fn raw_body(mut self) -> Self {
        self.body_encoding = false;
        self
    }
}

/// The engine's session boundary bound to a real TCP or TLS stream.
///
/// Non-interactive: the credential prompt answers from the configured
/// credentials and never blocks on a user.
#[derive(Debug)]
pub struct Session {
    stream: SmtpStream,
    capabilities: Capabilities,
    config: SessionConfig,
    auto_tls: bool,
    body: Option<Cursor<Vec<u8>>>,
    last_error: Option<String>,
}

impl Session {
    /// Wraps an established stream.
    #[must_use]
    pub fn new(stream: SmtpStream, config: SessionConfig) -> Self {
        let auto_tls = stream.is_tls();
        Self {
            stream,
            capabilities: Capabilities::default(),
            config,
            auto_tls,
            body: None,
            last_error: None,
        }
    }

    /// The session configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The capability set from the most recent EHLO.
    #[must_use]
    pub const fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Installs the message body served to the next transfer.
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = Some(Cursor::new(body));
    }

    /// Drops the body source after a transaction.
    pub fn clear_body(&mut self) {
        self.body = None;
    }

    /// The most recently reported session error, rendered.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

impl SmtpSession for Session {
    fn parse_features(&mut self, response: &Response) {
        self.capabilities = Capabilities::from_response(response);
        tracing::debug!(
            mechanisms = ?self.capabilities.auth_mechanisms(),
            size = ?self.capabilities.max_message_size(),
            "capabilities cached"
        );
    }

    fn have_capability(&self, keyword: &str) -> bool {
        self.capabilities.have(keyword)
    }

    fn is_using_tls(&self) -> bool {
        self.stream.is_tls()
    }

    fn is_auto_tls(&self) -> bool {
        self.auto_tls
    }

    fn body_encoding_requested(&self) -> bool {
        self.config.body_encoding
    }

    fn meta_data(&self, key: &str) -> Option<String> {
        self.config.meta.get(key).cloned()
    }

    fn error(&mut self, error: &Error) {
        tracing::error!(%error, "session error");
        self.last_error = Some(error.to_string());
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.stream.write_all(data).await
    }

    async fn read_response(&mut self) -> Result<Response> {
        self.stream.read_response().await
    }

    async fn start_tls(&mut self) -> Result<bool> {
        if self.stream.is_tls() {
            return Err(Error::protocol("channel is already encrypted"));
        }
        let plain = std::mem::replace(&mut self.stream, SmtpStream::Closed);
        match plain.upgrade_to_tls(&self.config.server_hostname).await {
            Ok(upgraded) => {
                self.stream = upgraded;
                self.capabilities.clear();
                Ok(true)
            }
            Err(error) => {
                // The connection is gone either way; the command layer
                // reports the classified failure.
                tracing::warn!(%error, "TLS handshake failed");
                Ok(false)
            }
        }
    }

    async fn open_password_dialog(&mut self, credentials: &mut Credentials) -> bool {
        match &self.config.credentials {
            Some(configured) if !configured.is_incomplete() => {
                *credentials = configured.clone();
                true
            }
            _ => false,
        }
    }

    async fn data_req(&mut self) -> Result<()> {
        if self.body.is_none() {
            return Err(Error::protocol("no message body source installed"));
        }
        Ok(())
    }

    async fn read_data(&mut self, buffer: &mut Vec<u8>) -> Result<usize> {
        let Some(cursor) = self.body.as_mut() else {
            return Err(Error::protocol("no message body source installed"));
        };
        buffer.resize(BODY_CHUNK_SIZE, 0);
        let read = cursor.read(buffer.as_mut_slice())?;
        buffer.truncate(read);
        Ok(read)
    }
}

/// High-level client for the common flow: connect, greet, secure,
/// authenticate, send transactions, quit.
#[derive(Debug)]
pub struct Mailer {
    session: Session,
}

impl Mailer {
    /// Connects over plain TCP (ports 25 and 587) and reads the server
    /// greeting.
    ///
    /// # Errors
    ///
    /// Connection failures, or a greeting that is not a success reply.
    pub async fn connect(config: SessionConfig, port: u16) -> Result<Self> {
        let stream = stream::connect(&config.server_hostname, port).await?;
        Self::start(stream, config).await
    }

    /// Connects with implicit TLS (port 465) and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Connection or handshake failures, or a rejected greeting.
    pub async fn connect_tls(config: SessionConfig, port: u16) -> Result<Self> {
        let stream = stream::connect_tls(&config.server_hostname, port).await?;
        Self::start(stream, config).await
    }

    async fn start(stream: SmtpStream, config: SessionConfig) -> Result<Self> {
        let mut session = Session::new(stream, config);
        let greeting = session.read_response().await?;
        if !greeting.is_positive() {
            let error = Error::GreetingRejected {
                code: greeting.code(),
                message: greeting.text(),
            };
            session.error(&error);
            return Err(error);
        }
        tracing::info!(greeting = %greeting, "server ready");
        Ok(Self { session })
    }

    /// The underlying session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Greets the server with EHLO (HELO fallback included) and caches its
    /// capabilities.
    ///
    /// # Errors
    ///
    /// When neither greeting is accepted.
    pub async fn greet(&mut self) -> Result<()> {
        let hostname = self.session.config().local_hostname.clone();
        self.run_session_command(Command::from(EhloCommand::new(hostname)))
            .await
    }

    /// Upgrades the channel with STARTTLS and greets again on the secured
    /// channel.
    ///
    /// # Errors
    ///
    /// [`Error::CapabilityMissing`] when STARTTLS is not advertised, or the
    /// distinct rejection/handshake failures.
    pub async fn starttls(&mut self) -> Result<()> {
        if !self.session.have_capability("STARTTLS") {
            let error = Error::CapabilityMissing("STARTTLS".into());
            self.session.error(&error);
            return Err(error);
        }
        self.run_session_command(Command::from(StartTlsCommand::new()))
            .await?;
        // Capabilities may differ on the secured channel.
        self.greet().await
    }

    /// Authenticates with the configured credentials.
    ///
    /// # Errors
    ///
    /// [`Error::CapabilityMissing`] without an AUTH advertisement,
    /// [`Error::NoCompatibleAuthMechanism`] without a shared mechanism, and
    /// the classified authentication failures.
    pub async fn authenticate(&mut self) -> Result<()> {
        let Some(credentials) = self.session.config().credentials.clone() else {
            return Err(Error::protocol("authenticate() without configured credentials"));
        };
        if !self.session.have_capability("AUTH") {
            let error = Error::CapabilityMissing("AUTH".into());
            self.session.error(&error);
            return Err(error);
        }

        let mechanisms = self.session.capabilities().auth_mechanisms().to_vec();
        let cmd = Command::from(AuthCommand::new(&mechanisms, credentials));
        if cmd.do_not_execute(None) {
            let error = Error::NoCompatibleAuthMechanism {
                advertised: mechanisms.join(" "),
            };
            self.session.error(&error);
            return Err(error);
        }
        self.run_session_command(cmd).await
    }

    /// Runs the full session handshake: greet, apply the STARTTLS policy,
    /// authenticate when credentials are configured.
    ///
    /// # Errors
    ///
    /// Any of the failures of [`greet`](Self::greet),
    /// [`starttls`](Self::starttls) and
    /// [`authenticate`](Self::authenticate).
    pub async fn handshake(&mut self) -> Result<()> {
        self.greet().await?;

        match self.session.config().tls {
            TlsPolicy::Never => {}
            TlsPolicy::Opportunistic => {
                if !self.session.is_using_tls()
                    && self.session.have_capability("STARTTLS")
                {
                    self.starttls().await?;
                }
            }
            TlsPolicy::Required => {
                if !self.session.is_using_tls() {
                    self.starttls().await?;
                }
            }
        }

        if self.session.config().credentials.is_some() {
            self.authenticate().await?;
        }
        Ok(())
    }

    /// Sends one message as one transaction.
    ///
    /// A partial success (some recipients rejected, at least one accepted)
    /// returns `Ok` with the rejected subset in the summary. After a
    /// transaction-level rejection the session is reset with RSET so the
    /// connection stays usable.
    ///
    /// # Errors
    ///
    /// Transport failures and the transaction-level rejections
    /// ([`Error::SenderRejected`], [`Error::AllRecipientsRejected`],
    /// [`Error::DataRejected`], [`Error::MessageRejected`]).
    pub async fn send(
        &mut self,
        from: &Address,
        recipients: &[Address],
        message: &[u8],
    ) -> Result<TransactionSummary> {
        self.session.set_body(message.to_vec());
        let eight_bit = self.session.config().eight_bit;
        let result = driver::run_transaction(
            &mut self.session,
            from,
            recipients,
            Some(message.len()),
            eight_bit,
        )
        .await;
        self.session.clear_body();

        if let Err(error) = &result {
            if matches!(
                error,
                Error::SenderRejected { .. }
                    | Error::AllRecipientsRejected(_)
                    | Error::DataRejected { .. }
                    | Error::MessageRejected { .. }
            ) {
                // Best effort; the rejection already carries the report.
                let mut rset = Command::rset();
                let _ = driver::execute(&mut self.session, &mut rset, None).await;
            } else {
                // Transport failures have not been reported yet.
                self.session.error(error);
            }
        }
        result
    }

    /// Sends a NOOP keepalive.
    ///
    /// # Errors
    ///
    /// Transport failures or a negative reply.
    pub async fn noop(&mut self) -> Result<()> {
        self.run_session_command(Command::noop()).await
    }

    /// Resets any server-side transaction state.
    ///
    /// # Errors
    ///
    /// Transport failures or a negative reply.
    pub async fn rset(&mut self) -> Result<()> {
        self.run_session_command(Command::rset()).await
    }

    /// Says QUIT and consumes the mailer.
    ///
    /// # Errors
    ///
    /// Transport failures or a negative reply.
    pub async fn quit(mut self) -> Result<()> {
        self.run_session_command(Command::quit()).await
    }

    async fn run_session_command(&mut self, mut cmd: Command) -> Result<()> {
        match driver::execute(&mut self.session, &mut cmd, None).await {
            Ok(true) => Ok(()),
            // The command already reported the classified failure.
            Ok(false) => Err(cmd
                .take_failure()
                .unwrap_or_else(|| Error::protocol("command failed without a report"))),
            Err(error) => {
                self.session.error(&error);
                Err(error)
            }
        }
    }
}
