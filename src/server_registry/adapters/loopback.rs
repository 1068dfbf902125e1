//! In-memory transport and delegate.
//!
//! These adapters model a server without spawning processes. They answer
//! the `initialize` handshake, record what was sent, and let callers drive
//! state changes, which makes them suitable for tests and for local
//! deterministic flows.

use crate::server_registry::domain::{
    ConnectionState, DelegateError, DelegateResult, McpCollectionDefinition, McpServerDefinition,
    ServerLaunch, TransportError, TransportResult,
};
use crate::server_registry::ports::{McpHostDelegate, McpMessageTransport, TransportLog};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{broadcast, watch};
use tracing::Level;

const CHANNEL_CAPACITY: usize = 64;

/// How a loopback transport answers `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitializeReply {
    /// Replies with this `result` object.
    Result(Value),
    /// Replies with a JSON-RPC error carrying this message.
    Error(String),
    /// Never replies.
    Silent,
}

impl Default for InitializeReply {
    fn default() -> Self {
        Self::Result(json!({
            "protocolVersion": "2025-06-18",
            "capabilities": { "tools": {} },
            "serverInfo": { "name": "loopback", "version": "0.0.0" },
        }))
    }
}

/// Transport whose server side is simulated in memory.
#[derive(Debug)]
pub struct LoopbackTransport {
    state: watch::Sender<ConnectionState>,
    inbound: broadcast::Sender<Value>,
    logs: broadcast::Sender<TransportLog>,
    sent: Mutex<Vec<Value>>,
    reply: InitializeReply,
}

impl LoopbackTransport {
    /// Creates a transport in [`ConnectionState::Starting`].
    #[must_use]
    pub fn new(reply: InitializeReply) -> Self {
        let (inbound, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (logs, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            state: watch::Sender::new(ConnectionState::Starting),
            inbound,
            logs,
            sent: Mutex::new(Vec::new()),
            reply,
        }
    }

    /// Moves the transport to `state`.
    pub fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    /// Reports the transport as running.
    pub fn run(&self) {
        self.set_state(ConnectionState::Running);
    }

    /// Reports a transport failure.
    pub fn fail(&self, message: impl Into<String>) {
        self.set_state(ConnectionState::error(message));
    }

    /// Delivers a message as if the server had sent it.
    pub fn push_message(&self, message: Value) {
        if self.inbound.send(message).is_err() {
            tracing::trace!("loopback message dropped without subscribers");
        }
    }

    /// Emits a diagnostic line.
    pub fn emit_log(&self, level: Level, message: impl Into<String>) {
        if self.logs.send(TransportLog::new(level, message)).is_err() {
            tracing::trace!("loopback log dropped without subscribers");
        }
    }

    /// Returns every message sent to the server.
    #[must_use]
    pub fn sent_messages(&self) -> Vec<Value> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the current transport state.
    #[must_use]
    pub fn current_state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    fn answer(&self, request: &Value) {
        if request.get("method").and_then(Value::as_str) != Some("initialize") {
            return;
        }
        let id = request.get("id").cloned().unwrap_or(Value::Null);
        let response = match &self.reply {
            InitializeReply::Result(result) => {
                json!({ "jsonrpc": "2.0", "id": id, "result": result })
            }
            InitializeReply::Error(message) => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32603, "message": message },
            }),
            InitializeReply::Silent => return,
        };
        self.push_message(response);
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new(InitializeReply::default())
    }
}

#[async_trait]
impl McpMessageTransport for LoopbackTransport {
    fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    fn messages(&self) -> broadcast::Receiver<Value> {
        self.inbound.subscribe()
    }

    fn logs(&self) -> broadcast::Receiver<TransportLog> {
        self.logs.subscribe()
    }

    async fn send(&self, message: Value) -> TransportResult<()> {
        if *self.state.borrow() != ConnectionState::Running {
            return Err(TransportError::NotRunning);
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        self.answer(&message);
        Ok(())
    }

    async fn stop(&self) {
        self.set_state(ConnectionState::Stopped);
    }
}

#[derive(Debug, Default)]
struct LoopbackRecord {
    launches: Vec<ServerLaunch>,
    transports: Vec<Arc<LoopbackTransport>>,
}

/// Delegate that starts [`LoopbackTransport`]s.
#[derive(Debug)]
pub struct LoopbackDelegate {
    priority: i32,
    auto_run: bool,
    reply: InitializeReply,
    start_error: Option<String>,
    substitutions: BTreeMap<String, String>,
    record: Mutex<LoopbackRecord>,
}

impl LoopbackDelegate {
    /// Creates a delegate whose transports run immediately.
    #[must_use]
    pub fn new(priority: i32) -> Self {
        Self {
            priority,
            auto_run: true,
            reply: InitializeReply::default(),
            start_error: None,
            substitutions: BTreeMap::new(),
            record: Mutex::new(LoopbackRecord::default()),
        }
    }

    /// Leaves new transports in [`ConnectionState::Starting`].
    #[must_use]
    pub const fn without_auto_run(mut self) -> Self {
        self.auto_run = false;
        self
    }

    /// Answers `initialize` with `reply`.
    #[must_use]
    pub fn with_initialize_reply(mut self, reply: InitializeReply) -> Self {
        self.reply = reply;
        self
    }

    /// Fails every start with `message`.
    #[must_use]
    pub fn with_start_error(mut self, message: impl Into<String>) -> Self {
        self.start_error = Some(message.into());
        self
    }

    /// Replaces the literal `placeholder` with `value` during pre-substitution.
    #[must_use]
    pub fn with_substitution(
        mut self,
        placeholder: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.substitutions.insert(placeholder.into(), value.into());
        self
    }

    /// Returns every launch handed to [`McpHostDelegate::start`].
    #[must_use]
    pub fn started_launches(&self) -> Vec<ServerLaunch> {
        self.lock_record().launches.clone()
    }

    /// Returns every transport created so far.
    #[must_use]
    pub fn transports(&self) -> Vec<Arc<LoopbackTransport>> {
        self.lock_record().transports.clone()
    }

    /// Returns the most recently created transport.
    #[must_use]
    pub fn last_transport(&self) -> Option<Arc<LoopbackTransport>> {
        self.lock_record().transports.last().cloned()
    }

    fn lock_record(&self) -> std::sync::MutexGuard<'_, LoopbackRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn replace_text(value: &mut Value, substitutions: &BTreeMap<String, String>) {
    match value {
        Value::String(text) => {
            for (placeholder, replacement) in substitutions {
                if text.contains(placeholder.as_str()) {
                    *text = text.replace(placeholder.as_str(), replacement);
                }
            }
        }
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| replace_text(item, substitutions)),
        Value::Object(entries) => entries
            .values_mut()
            .for_each(|entry| replace_text(entry, substitutions)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

#[async_trait]
impl McpHostDelegate for LoopbackDelegate {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_start(
        &self,
        _collection: &McpCollectionDefinition,
        _definition: &McpServerDefinition,
    ) -> bool {
        true
    }

    async fn substitute_variables(
        &self,
        _definition: &McpServerDefinition,
        launch: ServerLaunch,
    ) -> DelegateResult<ServerLaunch> {
        if self.substitutions.is_empty() {
            return Ok(launch);
        }
        let mut raw = serde_json::to_value(&launch).map_err(DelegateError::runtime)?;
        replace_text(&mut raw, &self.substitutions);
        serde_json::from_value(raw).map_err(DelegateError::runtime)
    }

    async fn start(
        &self,
        _collection: &McpCollectionDefinition,
        definition: &McpServerDefinition,
        launch: &ServerLaunch,
    ) -> DelegateResult<Arc<dyn McpMessageTransport>> {
        if let Some(reason) = &self.start_error {
            return Err(DelegateError::Unsupported {
                definition_id: definition.id().clone(),
                reason: reason.clone(),
            });
        }
        let transport = Arc::new(LoopbackTransport::new(self.reply.clone()));
        if self.auto_run {
            transport.run();
        }
        let mut record = self.lock_record();
        record.launches.push(launch.clone());
        record.transports.push(Arc::clone(&transport));
        Ok(transport)
    }

    async fn wait_for_initial_provider_promises(&self) {}
}
