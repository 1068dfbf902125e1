//! Lifecycle of one connection to a resolved server.

use crate::server_registry::domain::{
    ConnectionId, ConnectionState, ConnectionStatus, DefinitionId, McpCollectionDefinition,
    McpServerDefinition, ServerLaunch, TransportResult,
};
use crate::server_registry::ports::{McpHostDelegate, McpMessageTransport, TransportLog};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use mockable::Clock;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{Level, debug, error, info, trace, warn};

/// Protocol revision offered in the `initialize` request.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

const INITIALIZE_REQUEST_ID: u64 = 1;

type PendingStart = Shared<BoxFuture<'static, ConnectionState>>;

/// Live protocol session, available once the server answered `initialize`.
#[derive(Clone)]
pub struct McpServerHandler {
    protocol_version: String,
    server_info: Value,
    capabilities: Value,
    transport: Arc<dyn McpMessageTransport>,
}

impl McpServerHandler {
    fn from_initialize_result(result: &Value, transport: Arc<dyn McpMessageTransport>) -> Self {
        Self {
            protocol_version: result
                .get("protocolVersion")
                .and_then(Value::as_str)
                .unwrap_or(PROTOCOL_VERSION)
                .to_owned(),
            server_info: result.get("serverInfo").cloned().unwrap_or(Value::Null),
            capabilities: result.get("capabilities").cloned().unwrap_or(Value::Null),
            transport,
        }
    }

    /// Protocol revision the server agreed to.
    #[must_use]
    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    /// `serverInfo` from the handshake reply.
    #[must_use]
    pub const fn server_info(&self) -> &Value {
        &self.server_info
    }

    /// `capabilities` from the handshake reply.
    #[must_use]
    pub const fn capabilities(&self) -> &Value {
        &self.capabilities
    }

    /// Sends a JSON-RPC notification over the session.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::server_registry::domain::TransportError`] when the
    /// transport rejects the message.
    pub async fn notify(&self, method: &str, params: Value) -> TransportResult<()> {
        self.transport
            .send(json!({ "jsonrpc": "2.0", "method": method, "params": params }))
            .await
    }
}

impl fmt::Debug for McpServerHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpServerHandler")
            .field("protocol_version", &self.protocol_version)
            .field("server_info", &self.server_info)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct ConnectionRuntime {
    transport: Option<Arc<dyn McpMessageTransport>>,
    tasks: Vec<JoinHandle<()>>,
    pending: Option<PendingStart>,
}

struct ConnectionShared {
    definition_id: DefinitionId,
    clock: Arc<dyn Clock + Send + Sync>,
    status: watch::Sender<ConnectionStatus>,
    handler: watch::Sender<Option<McpServerHandler>>,
    generation: AtomicU64,
    runtime: Mutex<ConnectionRuntime>,
}

impl ConnectionShared {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    fn set_state(&self, state: ConnectionState) {
        if state != ConnectionState::Running {
            self.handler.send_replace(None);
        }
        let clock = &self.clock;
        let changed = self.status.send_if_modified(|status| {
            if status.state == state {
                return false;
            }
            *status = ConnectionStatus::new(state, &**clock);
            true
        });
        if changed {
            info!(
                definition_id = %self.definition_id,
                state = %self.status.borrow().state,
                "MCP server connection state changed"
            );
        }
    }

    async fn attach(self: &Arc<Self>, transport: Arc<dyn McpMessageTransport>, generation: u64) {
        let mut runtime = self.runtime.lock().await;
        if !self.is_current(generation) {
            drop(runtime);
            debug!(definition_id = %self.definition_id, "discarding transport of a cancelled start");
            transport.stop().await;
            return;
        }
        runtime.tasks.push(tokio::spawn(forward_logs(
            self.definition_id.clone(),
            transport.logs(),
        )));
        runtime.tasks.push(tokio::spawn(monitor(
            Arc::clone(self),
            Arc::clone(&transport),
            generation,
        )));
        runtime.transport = Some(transport);
    }

    fn finish_handshake(&self, outcome: Result<McpServerHandler, String>, generation: u64) {
        if !self.is_current(generation) {
            return;
        }
        match outcome {
            Ok(handler) => {
                debug!(
                    definition_id = %self.definition_id,
                    protocol_version = handler.protocol_version(),
                    "MCP server initialised"
                );
                self.handler.send_replace(Some(handler));
            }
            Err(message) => {
                warn!(definition_id = %self.definition_id, %message, "MCP initialize failed");
                self.set_state(ConnectionState::error(message));
            }
        }
    }

    async fn settled(&self) -> ConnectionState {
        let mut status = self.status.subscribe();
        status
            .wait_for(|current| current.state.is_settled())
            .await
            .map_or(ConnectionState::Stopped, |current| current.state.clone())
    }
}

/// A resolved server bound to the delegate that can run it.
///
/// The connection starts in [`ConnectionState::Stopped`]. [`Self::start`]
/// asks the delegate for a transport and follows the transport's own state;
/// once it is running, an `initialize` handshake produces the
/// [`McpServerHandler`].
pub struct McpServerConnection {
    id: ConnectionId,
    collection: Arc<McpCollectionDefinition>,
    definition: Arc<McpServerDefinition>,
    delegate: Arc<dyn McpHostDelegate>,
    launch: ServerLaunch,
    shared: Arc<ConnectionShared>,
    disposed: AtomicBool,
}

impl McpServerConnection {
    /// Creates a stopped connection.
    #[must_use]
    pub fn new(
        collection: Arc<McpCollectionDefinition>,
        definition: Arc<McpServerDefinition>,
        delegate: Arc<dyn McpHostDelegate>,
        launch: ServerLaunch,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let initial = ConnectionStatus::new(ConnectionState::Stopped, &*clock);
        let shared = Arc::new(ConnectionShared {
            definition_id: definition.id().clone(),
            clock,
            status: watch::Sender::new(initial),
            handler: watch::Sender::new(None),
            generation: AtomicU64::new(0),
            runtime: Mutex::new(ConnectionRuntime::default()),
        });
        Self {
            id: ConnectionId::new(),
            collection,
            definition,
            delegate,
            launch,
            shared,
            disposed: AtomicBool::new(false),
        }
    }

    /// Returns the connection identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the owning collection.
    #[must_use]
    pub const fn collection(&self) -> &Arc<McpCollectionDefinition> {
        &self.collection
    }

    /// Returns the definition being run.
    #[must_use]
    pub const fn definition(&self) -> &Arc<McpServerDefinition> {
        &self.definition
    }

    /// Returns the fully substituted launch.
    #[must_use]
    pub const fn launch(&self) -> &ServerLaunch {
        &self.launch
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.status.borrow().state.clone()
    }

    /// Returns the current state with its timestamp.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.shared.status.borrow().clone()
    }

    /// Observes state changes.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    /// Returns the protocol session once the handshake completed.
    #[must_use]
    pub fn handler(&self) -> Option<McpServerHandler> {
        self.shared.handler.borrow().clone()
    }

    /// Waits for the handshake while the connection is starting or running.
    ///
    /// Returns `None` once the connection is stopped or failed.
    pub async fn wait_for_handler(&self) -> Option<McpServerHandler> {
        let mut handler = self.shared.handler.subscribe();
        let mut status = self.shared.status.subscribe();
        loop {
            if let Some(ready) = handler.borrow_and_update().clone() {
                return Some(ready);
            }
            let live = matches!(
                status.borrow_and_update().state,
                ConnectionState::Starting | ConnectionState::Running
            );
            if !live {
                return None;
            }
            tokio::select! {
                changed = handler.changed() => if changed.is_err() { return None; },
                changed = status.changed() => if changed.is_err() { return None; },
            }
        }
    }

    /// Starts the server and resolves once the start settled.
    ///
    /// While a start is in flight every caller awaits the same attempt. A
    /// running connection returns immediately; a stopped or failed one
    /// starts afresh.
    pub async fn start(&self) -> ConnectionState {
        if self.disposed.load(Ordering::Acquire) {
            return self.state();
        }
        let mut runtime = self.shared.runtime.lock().await;
        let current = self.state();
        if current == ConnectionState::Running {
            return current;
        }
        if current == ConnectionState::Starting
            && let Some(in_flight) = runtime.pending.clone()
        {
            drop(runtime);
            return in_flight.await;
        }

        let stale = runtime.transport.take();
        for task in runtime.tasks.drain(..) {
            task.abort();
        }
        let attempt = self.begin_start();
        runtime.pending = Some(attempt.clone());
        drop(runtime);

        if let Some(transport) = stale {
            transport.stop().await;
        }
        attempt.await
    }

    fn begin_start(&self) -> PendingStart {
        let generation = self
            .shared
            .generation
            .fetch_add(1, Ordering::AcqRel)
            .wrapping_add(1);
        self.shared.set_state(ConnectionState::Starting);

        let shared = Arc::clone(&self.shared);
        let delegate = Arc::clone(&self.delegate);
        let collection = Arc::clone(&self.collection);
        let definition = Arc::clone(&self.definition);
        let launch = self.launch.clone();
        async move {
            debug!(definition_id = %definition.id(), kind = launch.kind(), "starting MCP server transport");
            match delegate.start(&collection, &definition, &launch).await {
                Ok(transport) => shared.attach(transport, generation).await,
                Err(err) if shared.is_current(generation) => {
                    warn!(definition_id = %definition.id(), error = %err, "MCP server failed to start");
                    shared.set_state(ConnectionState::error(err.to_string()));
                }
                Err(_) => {}
            }
            shared.settled().await
        }
        .boxed()
        .shared()
    }

    /// Stops the server. Valid from any state.
    pub async fn stop(&self) {
        let (transport, tasks) = {
            let mut runtime = self.shared.runtime.lock().await;
            self.shared.generation.fetch_add(1, Ordering::AcqRel);
            runtime.pending = None;
            (runtime.transport.take(), std::mem::take(&mut runtime.tasks))
        };
        for task in tasks {
            task.abort();
        }
        if let Some(running) = transport {
            running.stop().await;
        }
        self.shared.set_state(ConnectionState::Stopped);
    }

    /// Stops the server and releases its resources. Idempotent.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.stop().await;
    }

    /// Returns `true` once [`Self::dispose`] was called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl Drop for McpServerConnection {
    fn drop(&mut self) {
        let Ok(mut runtime) = self.shared.runtime.try_lock() else {
            return;
        };
        for task in runtime.tasks.drain(..) {
            task.abort();
        }
        if let Some(transport) = runtime.transport.take()
            && let Ok(handle) = tokio::runtime::Handle::try_current()
        {
            handle.spawn(async move { transport.stop().await });
        }
    }
}

impl fmt::Debug for McpServerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpServerConnection")
            .field("id", &self.id)
            .field("collection_id", self.collection.id())
            .field("definition_id", self.definition.id())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

async fn monitor(
    shared: Arc<ConnectionShared>,
    transport: Arc<dyn McpMessageTransport>,
    generation: u64,
) {
    let mut states = transport.state();
    loop {
        if !shared.is_current(generation) {
            return;
        }
        let state = states.borrow_and_update().clone();
        if state == ConnectionState::Running {
            shared.set_state(ConnectionState::Running);
            if shared.handler.borrow().is_none() {
                tokio::select! {
                    outcome = handshake(&transport) => shared.finish_handshake(outcome, generation),
                    changed = states.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        continue;
                    }
                }
            }
        } else {
            shared.set_state(state);
        }
        if states.changed().await.is_err() {
            return;
        }
    }
}

async fn handshake(transport: &Arc<dyn McpMessageTransport>) -> Result<McpServerHandler, String> {
    let mut messages = transport.messages();
    transport
        .send(json!({
            "jsonrpc": "2.0",
            "id": INITIALIZE_REQUEST_ID,
            "method": "initialize",
            "params": {
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                },
            },
        }))
        .await
        .map_err(|err| err.to_string())?;

    loop {
        match messages.recv().await {
            Ok(message)
                if message.get("id").and_then(Value::as_u64) == Some(INITIALIZE_REQUEST_ID) =>
            {
                return complete_handshake(transport, &message).await;
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "MCP messages dropped while waiting for initialize");
            }
            Err(RecvError::Closed) => {
                return Err("transport closed before initialize completed".to_owned());
            }
        }
    }
}

async fn complete_handshake(
    transport: &Arc<dyn McpMessageTransport>,
    reply: &Value,
) -> Result<McpServerHandler, String> {
    if let Some(failure) = reply.get("error") {
        return Err(failure
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("initialize failed")
            .to_owned());
    }
    let result = reply.get("result").cloned().unwrap_or(Value::Null);
    let handler = McpServerHandler::from_initialize_result(&result, Arc::clone(transport));
    if let Err(err) = handler.notify("notifications/initialized", json!({})).await {
        warn!(error = %err, "failed to confirm MCP initialisation");
    }
    Ok(handler)
}

async fn forward_logs(definition_id: DefinitionId, mut logs: broadcast::Receiver<TransportLog>) {
    loop {
        match logs.recv().await {
            Ok(entry) => emit(&definition_id, &entry),
            Err(RecvError::Lagged(skipped)) => {
                trace!(%definition_id, skipped, "MCP server log lines dropped");
            }
            Err(RecvError::Closed) => return,
        }
    }
}

fn emit(definition_id: &DefinitionId, entry: &TransportLog) {
    let message = entry.message.as_str();
    if entry.level == Level::ERROR {
        error!(%definition_id, message, "MCP server log");
    } else if entry.level == Level::WARN {
        warn!(%definition_id, message, "MCP server log");
    } else if entry.level == Level::INFO {
        info!(%definition_id, message, "MCP server log");
    } else if entry.level == Level::DEBUG {
        debug!(%definition_id, message, "MCP server log");
    } else {
        trace!(%definition_id, message, "MCP server log");
    }
}
