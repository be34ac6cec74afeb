//! Scripted in-memory session for engine tests.

use std::collections::{HashMap, VecDeque};

use posthorn_sasl::Credentials;

use crate::error::{Error, Result};
use crate::session::SmtpSession;
use crate::types::{Capabilities, Response};

/// A session whose replies, capabilities and body data are scripted up
/// front. Records everything the engine does to it.
pub(crate) struct MockSession {
    capabilities: Capabilities,
    replies: VecDeque<Response>,
    written: Vec<Vec<u8>>,
    errors: Vec<String>,
    start_tls_result: bool,
    start_tls_calls: usize,
    using_tls: bool,
    auto_tls: bool,
    body: VecDeque<Vec<u8>>,
    dialog_credentials: Option<Credentials>,
    dialog_calls: usize,
    body_encoding: bool,
    meta: HashMap<String, String>,
}

impl MockSession {
    pub(crate) fn new() -> Self {
        Self {
            capabilities: Capabilities::default(),
            replies: VecDeque::new(),
            written: Vec::new(),
            errors: Vec::new(),
            start_tls_result: false,
            start_tls_calls: 0,
            using_tls: false,
            auto_tls: false,
            body: VecDeque::new(),
            dialog_credentials: None,
            dialog_calls: 0,
            body_encoding: true,
            meta: HashMap::new(),
        }
    }

    /// Pretends a previous EHLO advertised these keyword lines.
    pub(crate) fn with_capabilities(mut self, keywords: &[&str]) -> Self {
        let mut lines = vec!["mock greets you".to_string()];
        lines.extend(keywords.iter().map(ToString::to_string));
        self.capabilities = Capabilities::from_response(&Response::new(250, lines));
        self
    }

    /// Queues replies served by `read_response` in order.
    pub(crate) fn with_replies(mut self, replies: &[(u16, &str)]) -> Self {
        self.replies = replies
            .iter()
            .map(|(code, line)| Response::new(*code, vec![(*line).to_string()]))
            .collect();
        self
    }

    /// Queues a multi-line reply.
    pub(crate) fn push_reply_lines(mut self, code: u16, lines: &[&str]) -> Self {
        self.replies
            .push_back(Response::new(code, lines.iter().map(ToString::to_string).collect()));
        self
    }

    pub(crate) fn with_start_tls_result(mut self, result: bool) -> Self {
        self.start_tls_result = result;
        self
    }

    pub(crate) fn with_body_chunks(mut self, chunks: &[&[u8]]) -> Self {
        self.body = chunks.iter().map(|chunk| chunk.to_vec()).collect();
        self
    }

    pub(crate) fn with_dialog_credentials(mut self, credentials: Credentials) -> Self {
        self.dialog_credentials = Some(credentials);
        self
    }

    #[allow(dead_code)]
    pub(crate) fn with_body_encoding(mut self, encode: bool) -> Self {
        self.body_encoding = encode;
        self
    }

    #[allow(dead_code)]
    pub(crate) fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.meta.insert(key.to_string(), value.to_string());
        self
    }

    /// Everything written to the wire, lossily decoded per write.
    pub(crate) fn written_lines(&self) -> Vec<String> {
        self.written
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    pub(crate) fn writes(&self) -> &[Vec<u8>] {
        &self.written
    }

    pub(crate) fn reported_errors(&self) -> &[String] {
        &self.errors
    }

    pub(crate) const fn start_tls_calls(&self) -> usize {
        self.start_tls_calls
    }

    pub(crate) const fn dialog_calls(&self) -> usize {
        self.dialog_calls
    }
}

impl SmtpSession for MockSession {
    fn parse_features(&mut self, response: &Response) {
        self.capabilities = Capabilities::from_response(response);
    }

    fn have_capability(&self, keyword: &str) -> bool {
        self.capabilities.have(keyword)
    }

    fn is_using_tls(&self) -> bool {
        self.using_tls
    }

    fn is_auto_tls(&self) -> bool {
        self.auto_tls
    }

    fn body_encoding_requested(&self) -> bool {
        self.body_encoding
    }

    fn meta_data(&self, key: &str) -> Option<String> {
        self.meta.get(key).cloned()
    }

    fn error(&mut self, error: &Error) {
        self.errors.push(error.to_string());
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.written.push(data.to_vec());
        Ok(())
    }

    async fn read_response(&mut self) -> Result<Response> {
        self.replies
            .pop_front()
            .ok_or_else(|| Error::protocol("mock reply script exhausted"))
    }

    async fn start_tls(&mut self) -> Result<bool> {
        self.start_tls_calls += 1;
        if self.start_tls_result {
            self.using_tls = true;
            self.capabilities.clear();
        }
        Ok(self.start_tls_result)
    }

    async fn open_password_dialog(&mut self, credentials: &mut Credentials) -> bool {
        self.dialog_calls += 1;
        match &self.dialog_credentials {
            Some(filled) => {
                *credentials = filled.clone();
                true
            }
            None => false,
        }
    }

    async fn data_req(&mut self) -> Result<()> {
        Ok(())
    }

    async fn read_data(&mut self, buffer: &mut Vec<u8>) -> Result<usize> {
        buffer.clear();
        match self.body.pop_front() {
            Some(chunk) => {
                buffer.extend_from_slice(&chunk);
                Ok(chunk.len())
            }
            None => Ok(0),
        }
    }
}
