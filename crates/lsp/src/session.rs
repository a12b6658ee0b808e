//! Stateful JSON-RPC session over one transport.
//!
//! Requests are strictly sequential: a caller holds `&mut LspSession` for the
//! whole exchange, so responses for other ids that show up while waiting are
//! parked in a per-session cache until their owner asks for them.

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::protocol::{self, IncomingFrame, Notification, Request, Response, methods};
use crate::transport::{Connector, Transport, TransportError, WebSocketConnector};
use lsp_types::{LogMessageParams, MessageType};
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{debug, error, info, trace, warn};

/// What to do when the socket drops while a response is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    Reconnect,
    /// Teardown: the server may already be gone on purpose.
    Abort,
}

pub struct LspSession<C: Connector = WebSocketConnector> {
    config: SessionConfig,
    connector: C,
    transport: Option<C::Transport>,
    next_id: u64,
    unmatched: HashMap<u64, Response>,
}

impl LspSession<WebSocketConnector> {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_connector(config, WebSocketConnector)
    }
}

impl<C: Connector> LspSession<C> {
    pub fn with_connector(config: SessionConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            transport: None,
            next_id: 1,
            unmatched: HashMap::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Responses received for ids nobody has asked for yet.
    pub fn pending_responses(&self) -> usize {
        self.unmatched.len()
    }

    /// Open the socket, retrying refusals with a fixed backoff.
    pub async fn connect(&mut self) -> Result<()> {
        let address = self.config.address()?;
        let max_attempts = self.config.connection_retries.saturating_add(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.connector.connect(&address).await {
                Ok(transport) => {
                    info!(%address, attempt, "connected to language server");
                    self.transport = Some(transport);
                    return Ok(());
                }
                Err(TransportError::Refused) if attempt < max_attempts => {
                    info!(%address, attempt, max_attempts, "connection refused, retrying");
                    tokio::time::sleep(self.config.retry_backoff()).await;
                }
                Err(TransportError::Refused) => {
                    error!(%address, attempts = attempt, "giving up on language server");
                    return Err(SessionError::Unreachable {
                        address,
                        attempts: attempt,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// LSP handshake. Returns the server's `capabilities`.
    pub async fn initialize(&mut self) -> Result<Value> {
        let params = protocol::initialize_params(self.config.root_uri.as_deref());
        let result = self
            .send_request(methods::INITIALIZE, Some(params))
            .await?
            .into_result()?;
        self.send_notification(methods::INITIALIZED, Some(json!({})))
            .await?;
        Ok(result.get("capabilities").cloned().unwrap_or(Value::Null))
    }

    /// Send a request and wait for the response carrying its id.
    pub async fn send_request(&mut self, method: &str, params: Option<Value>) -> Result<Response> {
        self.request(method, params, Recovery::Reconnect).await
    }

    pub async fn send_notification(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        let frame = serde_json::to_string(&Notification::new(method, params))?;
        trace!(method, "sending notification");
        let sent = self.transport_mut()?.send(&frame).await;
        if let Err(TransportError::Closed) = sent {
            self.transport = None;
        }
        Ok(sent?)
    }

    async fn request(
        &mut self,
        method: &str,
        params: Option<Value>,
        recovery: Recovery,
    ) -> Result<Response> {
        if self.transport.is_none() {
            return Err(SessionError::NotConnected);
        }
        let id = self.next_id;
        self.next_id += 1;
        let frame = serde_json::to_string(&Request::new(id, method, params))?;
        debug!(id, method, "sending request");

        let limit = match recovery {
            Recovery::Reconnect => self.config.request_timeout(),
            Recovery::Abort => None,
        };
        match limit {
            Some(limit) => tokio::time::timeout(limit, self.exchange(id, &frame, recovery))
                .await
                .map_err(|_| {
                    warn!(id, method, "request timed out");
                    SessionError::Timeout {
                        method: method.to_string(),
                        id,
                    }
                })?,
            None => self.exchange(id, &frame, recovery).await,
        }
    }

    /// Transmit `frame` and read until the response for `id` shows up.
    ///
    /// A closed socket at any point leads to reconnect + resend of the same
    /// frame, at most `connection_retries` times for this request.
    async fn exchange(&mut self, id: u64, frame: &str, recovery: Recovery) -> Result<Response> {
        let mut attempt = 0u32;
        let mut needs_send = true;
        loop {
            if needs_send {
                match self.transport_mut()?.send(frame).await {
                    Ok(()) => needs_send = false,
                    Err(TransportError::Closed) => {
                        attempt = self.recover(id, attempt, recovery).await?;
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            if let Some(response) = self.unmatched.remove(&id) {
                trace!(id, "response served from cache");
                return Ok(response);
            }

            let text = match self.transport_mut()?.recv().await {
                Ok(text) => text,
                Err(TransportError::Closed) => {
                    attempt = self.recover(id, attempt, recovery).await?;
                    needs_send = true;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if let Some(response) = self.route(&text).await {
                if response.id == id {
                    return Ok(response);
                }
                self.stash(response);
            }
        }
    }

    /// Bounded reconnect. Returns the updated attempt counter.
    async fn recover(&mut self, id: u64, attempt: u32, recovery: Recovery) -> Result<u32> {
        self.transport = None;
        if recovery == Recovery::Abort {
            return Err(SessionError::ConnectionLost { id, attempts: 0 });
        }
        if attempt >= self.config.connection_retries {
            error!(id, attempts = attempt, "connection lost, retries exhausted");
            return Err(SessionError::ConnectionLost {
                id,
                attempts: attempt,
            });
        }
        let attempt = attempt + 1;
        warn!(
            id,
            attempt,
            retries = self.config.connection_retries,
            "connection lost, reconnecting"
        );
        match self.connect().await {
            Ok(()) => Ok(attempt),
            Err(SessionError::Unreachable { .. }) => Err(SessionError::ConnectionLost {
                id,
                attempts: attempt,
            }),
            Err(e) => Err(e),
        }
    }

    /// Dispatch one incoming frame. Only responses are handed back.
    async fn route(&mut self, text: &str) -> Option<Response> {
        match protocol::parse_incoming(text) {
            Some(IncomingFrame::Response(response)) => Some(response),
            Some(IncomingFrame::ServerRequest { id, method }) => {
                debug!(%method, "server request, replying method not found");
                let reply = protocol::method_not_found(&id, &method).to_string();
                if let Some(transport) = self.transport.as_mut() {
                    if let Err(e) = transport.send(&reply).await {
                        // a closed socket surfaces on the next recv
                        debug!(error = %e, "failed to answer server request");
                    }
                }
                None
            }
            Some(IncomingFrame::Notification { method, params }) => {
                self.handle_notification(&method, params);
                None
            }
            None => {
                warn!(frame = %text, "skipping malformed frame");
                None
            }
        }
    }

    fn handle_notification(&self, method: &str, params: Option<Value>) {
        if method != methods::LOG_MESSAGE {
            trace!(method, "ignoring notification");
            return;
        }
        let Some(params) = params.and_then(|p| serde_json::from_value::<LogMessageParams>(p).ok())
        else {
            debug!("unparseable window/logMessage");
            return;
        };
        if !self.config.log_server_messages {
            trace!(message = %params.message, "server log");
            return;
        }
        let message = params.message;
        if params.typ == MessageType::ERROR {
            error!(target: "lsp_server", "{message}");
        } else if params.typ == MessageType::WARNING {
            warn!(target: "lsp_server", "{message}");
        } else if params.typ == MessageType::INFO {
            info!(target: "lsp_server", "{message}");
        } else {
            debug!(target: "lsp_server", "{message}");
        }
    }

    fn stash(&mut self, response: Response) {
        let id = response.id;
        if self.unmatched.insert(id, response).is_some() {
            warn!(id, "duplicate response replaced a cached one");
        } else {
            debug!(id, "cached out-of-order response");
        }
    }

    fn transport_mut(&mut self) -> Result<&mut C::Transport> {
        self.transport.as_mut().ok_or(SessionError::NotConnected)
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.request(methods::SHUTDOWN, None, Recovery::Abort)
            .await?
            .into_result()?;
        Ok(())
    }

    pub async fn exit(&mut self) -> Result<()> {
        self.send_notification(methods::EXIT, None).await
    }

    pub async fn close(&mut self) -> Result<()> {
        match self.transport.take() {
            Some(mut transport) => Ok(transport.close().await?),
            None => Ok(()),
        }
    }

    /// Full teardown. Never fails: a server that already went away is expected,
    /// anything else is logged.
    pub async fn shutdown_exit_close(&mut self) {
        if self.transport.is_some() {
            let limit = self.config.shutdown_timeout();
            match tokio::time::timeout(limit, self.shutdown()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log_teardown_error("shutdown", &e),
                Err(_) => info!(?limit, "shutdown timed out"),
            }
            if let Err(e) = self.exit().await {
                log_teardown_error("exit", &e);
            }
            if let Err(e) = self.close().await {
                log_teardown_error("close", &e);
            }
        }
        self.transport = None;

        if !self.unmatched.is_empty() {
            let mut ids: Vec<u64> = self.unmatched.keys().copied().collect();
            ids.sort_unstable();
            warn!(count = ids.len(), ?ids, "discarding responses nobody consumed");
            self.unmatched.clear();
        }
    }
}

fn log_teardown_error(step: &str, err: &SessionError) {
    if err.is_disconnect() {
        trace!(step, "connection already closed");
    } else {
        info!(step, error = %err, "error closing connection");
    }
}
