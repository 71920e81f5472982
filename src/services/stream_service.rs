//! Live-update channel driver
//!
//! Owns one WebSocket to the transaction stream at a time and runs the
//! `ConnectionMachine` against it: connect, heartbeat, reconnect with a fixed
//! delay, teardown. Decoded JSON payloads are forwarded in arrival order;
//! their meaning is left to the reconciliation bridge.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, Sleep};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use super::connection_service::{ConnectionMachine, ConnectionState, Directive, TransportEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;
type OpenFuture = Pin<Box<dyn Future<Output = Result<WsStream, WsError>> + Send>>;

/// Keepalive token sent on every heartbeat
pub const HEARTBEAT_TOKEN: &str = "ping";
/// Plain-text keepalive reply; not JSON and not an error
pub const HEARTBEAT_REPLY: &str = "pong";

/// Derive the `ws://` / `wss://` URL of `path` on the API origin
pub fn stream_url(api_url: &Url, path: &str) -> Result<Url, String> {
    let mut url = api_url.clone();
    let scheme = match api_url.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => return Err(format!("Cannot derive a WebSocket URL from scheme '{}'", other)),
    };
    url.set_scheme(scheme)
        .map_err(|_| format!("Failed to set scheme {} on {}", scheme, api_url))?;
    url.set_path(path);
    url.set_query(None);
    Ok(url)
}

#[derive(Debug, Clone, Copy)]
pub struct StreamSettings {
    pub reconnect_delay: Duration,
    pub heartbeat_interval: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            reconnect_delay: ConnectionMachine::DEFAULT_RECONNECT_DELAY,
            heartbeat_interval: Duration::from_millis(30000),
        }
    }
}

/// Counters for the paths that are deliberately silent
#[derive(Debug, Default)]
pub struct StreamDiagnostics {
    messages: AtomicU64,
    ignored_payloads: AtomicU64,
    heartbeat_replies: AtomicU64,
    heartbeats_sent: AtomicU64,
    heartbeats_skipped: AtomicU64,
    heartbeat_failures: AtomicU64,
    reconnects: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiagnosticsSnapshot {
    pub messages: u64,
    pub ignored_payloads: u64,
    pub heartbeat_replies: u64,
    pub heartbeats_sent: u64,
    pub heartbeats_skipped: u64,
    pub heartbeat_failures: u64,
    pub reconnects: u64,
}

impl StreamDiagnostics {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            messages: self.messages.load(Ordering::Relaxed),
            ignored_payloads: self.ignored_payloads.load(Ordering::Relaxed),
            heartbeat_replies: self.heartbeat_replies.load(Ordering::Relaxed),
            heartbeats_sent: self.heartbeats_sent.load(Ordering::Relaxed),
            heartbeats_skipped: self.heartbeats_skipped.load(Ordering::Relaxed),
            heartbeat_failures: self.heartbeat_failures.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
        }
    }
}

/// Handle to the background connection task.
///
/// Dropping the handle tears the connection down the same way `shutdown`
/// does, but without waiting for it.
pub struct ConnectionManager {
    url: Url,
    state_rx: watch::Receiver<ConnectionState>,
    latest_rx: watch::Receiver<Option<Value>>,
    diagnostics: Arc<StreamDiagnostics>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    /// Start connecting to `url`. Returns the handle and the in-order stream
    /// of decoded messages.
    pub fn spawn(url: Url, settings: StreamSettings) -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (latest_tx, latest_rx) = watch::channel(None);
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let diagnostics = Arc::new(StreamDiagnostics::default());

        let driver = Driver {
            url: url.to_string(),
            machine: ConnectionMachine::new(settings.reconnect_delay),
            heartbeat_interval: settings.heartbeat_interval,
            state_tx,
            latest_tx,
            message_tx,
            diagnostics: Arc::clone(&diagnostics),
            link: Link::default(),
        };

        let task = tokio::spawn(driver.run(shutdown_rx));

        let manager = Self {
            url,
            state_rx,
            latest_rx,
            diagnostics,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        };
        (manager, message_rx)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Watch connection-state changes
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Watch the most recent decoded message, `None` until the first one
    pub fn subscribe_latest(&self) -> watch::Receiver<Option<Value>> {
        self.latest_rx.clone()
    }

    /// Shared counters, readable after the handle has moved elsewhere
    pub fn diagnostics_handle(&self) -> Arc<StreamDiagnostics> {
        Arc::clone(&self.diagnostics)
    }

    /// Cancel heartbeat and any pending reconnect, close the socket and wait
    /// for the task to finish
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Connection task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[derive(Default)]
struct Link {
    writer: Option<WsWriter>,
    reader: Option<WsReader>,
    opening: Option<OpenFuture>,
    reconnect: Option<Pin<Box<Sleep>>>,
}

enum Wake {
    Shutdown,
    Opened(Result<WsStream, WsError>),
    Frame(Option<Result<Message, WsError>>),
    ReconnectDue,
    Heartbeat,
}

struct Driver {
    url: String,
    machine: ConnectionMachine,
    heartbeat_interval: Duration,
    state_tx: watch::Sender<ConnectionState>,
    latest_tx: watch::Sender<Option<Value>>,
    message_tx: mpsc::UnboundedSender<Value>,
    diagnostics: Arc<StreamDiagnostics>,
    link: Link,
}

impl Driver {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        let mut heartbeat = tokio::time::interval_at(
            Instant::now() + self.heartbeat_interval,
            self.heartbeat_interval,
        );
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.dispatch(TransportEvent::Start).await;

        loop {
            let wake = tokio::select! {
                _ = &mut shutdown => Wake::Shutdown,
                res = next_open(&mut self.link.opening) => Wake::Opened(res),
                frame = next_frame(&mut self.link.reader) => Wake::Frame(frame),
                _ = next_deadline(&mut self.link.reconnect) => Wake::ReconnectDue,
                _ = heartbeat.tick() => Wake::Heartbeat,
            };

            match wake {
                Wake::Shutdown => self.dispatch(TransportEvent::Dispose).await,
                Wake::Opened(Ok(ws)) => {
                    let (writer, reader) = ws.split();
                    self.link.writer = Some(writer);
                    self.link.reader = Some(reader);
                    info!("Live channel connected: {}", self.url);
                    self.dispatch(TransportEvent::Opened).await;
                }
                Wake::Opened(Err(e)) => {
                    warn!("Live channel connect failed: {}", e);
                    self.dispatch(TransportEvent::OpenFailed).await;
                }
                Wake::Frame(Some(Ok(message))) => self.on_message(message).await,
                Wake::Frame(Some(Err(e))) => {
                    warn!("Live channel error: {}", e);
                    self.dispatch(TransportEvent::Errored).await;
                    self.drop_transport();
                    self.dispatch(TransportEvent::Closed).await;
                }
                Wake::Frame(None) => {
                    self.drop_transport();
                    self.dispatch(TransportEvent::Closed).await;
                }
                Wake::ReconnectDue => self.dispatch(TransportEvent::ReconnectDue).await,
                Wake::Heartbeat => self.send_heartbeat().await,
            }

            if self.machine.is_disposed() {
                break;
            }
        }

        debug!("Live channel task stopped");
    }

    async fn on_message(&mut self, message: Message) {
        match message {
            Message::Text(text) => self.decode(&text),
            Message::Close(frame) => {
                debug!("Live channel closed by server: {:?}", frame);
                self.drop_transport();
                self.dispatch(TransportEvent::Closed).await;
            }
            Message::Binary(_) => {
                debug!("Ignoring binary frame");
                StreamDiagnostics::bump(&self.diagnostics.ignored_payloads);
            }
            // control frames are answered by tungstenite itself
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }

    fn decode(&mut self, text: &str) {
        if text == HEARTBEAT_REPLY {
            StreamDiagnostics::bump(&self.diagnostics.heartbeat_replies);
            return;
        }

        match serde_json::from_str::<Value>(text) {
            Ok(value) => {
                StreamDiagnostics::bump(&self.diagnostics.messages);
                self.latest_tx.send_replace(Some(value.clone()));
                if self.message_tx.send(value).is_err() {
                    debug!("No consumer for live messages");
                }
            }
            Err(e) => {
                debug!("Ignoring non-JSON payload ({}): {}", e, text);
                StreamDiagnostics::bump(&self.diagnostics.ignored_payloads);
            }
        }
    }

    async fn send_heartbeat(&mut self) {
        let writer = match self.link.writer.as_mut() {
            Some(writer) if self.machine.can_send() => writer,
            _ => {
                StreamDiagnostics::bump(&self.diagnostics.heartbeats_skipped);
                return;
            }
        };

        match writer.send(Message::Text(HEARTBEAT_TOKEN.into())).await {
            Ok(()) => StreamDiagnostics::bump(&self.diagnostics.heartbeats_sent),
            Err(e) => {
                debug!("Heartbeat send failed: {}", e);
                StreamDiagnostics::bump(&self.diagnostics.heartbeat_failures);
            }
        }
    }

    /// Feed an event to the machine, execute its directives, publish state
    async fn dispatch(&mut self, event: TransportEvent) {
        let before = self.machine.state();
        let directives = self.machine.handle(event);

        for directive in directives {
            match directive {
                Directive::Open => {
                    debug!("Connecting to {}", self.url);
                    let url = self.url.clone();
                    self.link.opening = Some(Box::pin(async move {
                        connect_async(url).await.map(|(ws, _response)| ws)
                    }));
                }
                Directive::ScheduleReconnect(delay) => {
                    info!("Live channel disconnected, reconnecting in {}ms", delay.as_millis());
                    self.link.reconnect = Some(Box::pin(tokio::time::sleep(delay)));
                }
                Directive::CancelReconnect => {
                    self.link.reconnect = None;
                }
                // the heartbeat interval lives in `run` and stops with the loop
                Directive::CancelHeartbeat => {}
                Directive::CloseTransport => {
                    self.link.opening = None;
                    if let Some(mut writer) = self.link.writer.take() {
                        if let Err(e) = writer.close().await {
                            debug!("Error closing live channel: {}", e);
                        }
                    }
                    self.link.reader = None;
                }
            }
        }

        let after = self.machine.state();
        if before != after {
            debug!(
                "Live channel state {} -> {} (reconnect pending: {})",
                before,
                after,
                self.machine.reconnect_pending()
            );
        }
        self.diagnostics
            .reconnects
            .store(self.machine.reconnects(), Ordering::Relaxed);
        self.state_tx.send_replace(after);
    }

    fn drop_transport(&mut self) {
        self.link.writer = None;
        self.link.reader = None;
    }
}

async fn next_open(opening: &mut Option<OpenFuture>) -> Result<WsStream, WsError> {
    let result = match opening.as_mut() {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    };
    *opening = None;
    result
}

async fn next_frame(reader: &mut Option<WsReader>) -> Option<Result<Message, WsError>> {
    match reader.as_mut() {
        Some(reader) => reader.next().await,
        None => std::future::pending().await,
    }
}

async fn next_deadline(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline.as_mut() {
        Some(sleep) => sleep.await,
        None => std::future::pending().await,
    }
    *deadline = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio::time::timeout;
    use tokio_tungstenite::accept_async;

    fn fast_settings() -> StreamSettings {
        StreamSettings {
            reconnect_delay: Duration::from_millis(50),
            heartbeat_interval: Duration::from_secs(60),
        }
    }

    async fn listener() -> (TcpListener, Url) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let url = Url::parse(&format!("ws://{}/api/transactions/stream", addr)).expect("url");
        (listener, url)
    }

    async fn wait_for(rx: &mut watch::Receiver<ConnectionState>, wanted: ConnectionState) {
        timeout(Duration::from_secs(5), async {
            loop {
                if *rx.borrow_and_update() == wanted {
                    return;
                }
                if rx.changed().await.is_err() {
                    return;
                }
            }
        })
        .await
        .expect("state reached");
    }

    #[test]
    fn test_stream_url() {
        let api = Url::parse("https://txn.example.com:8443/").expect("url");
        let ws = stream_url(&api, "/api/transactions/stream").expect("ws url");
        assert_eq!(ws.as_str(), "wss://txn.example.com:8443/api/transactions/stream");

        let local = Url::parse("http://localhost:8000").expect("url");
        assert_eq!(
            stream_url(&local, "/api/transactions/stream").expect("ws url").as_str(),
            "ws://localhost:8000/api/transactions/stream"
        );
    }

    #[tokio::test]
    async fn test_forwards_json_in_order_and_ignores_the_rest() {
        let (listener, url) = listener().await;
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(tcp).await.expect("handshake");
            for frame in [
                HEARTBEAT_REPLY,
                r#"{"type":"STATUS_CHANGE","data":{"id":"a1","status":"procesado"}}"#,
                "not json at all",
                r#"{"type":"STATUS_CHANGE","data":{"id":"b2","status":"fallido"}}"#,
            ] {
                ws.send(Message::Text(frame.into())).await.expect("send");
            }
            // hold the socket open until the client leaves
            while let Some(Ok(_)) = ws.next().await {}
        });

        let (manager, mut messages) = ConnectionManager::spawn(url, fast_settings());

        let first = timeout(Duration::from_secs(5), messages.recv()).await.expect("first").expect("value");
        let second = timeout(Duration::from_secs(5), messages.recv()).await.expect("second").expect("value");
        assert_eq!(first["data"]["id"], "a1");
        assert_eq!(second["data"]["id"], "b2");
        let latest = manager.subscribe_latest().borrow().clone();
        assert_eq!(latest.expect("latest")["data"]["id"], "b2");
        assert_eq!(*manager.subscribe_state().borrow(), ConnectionState::Connected);

        let diagnostics = manager.diagnostics_handle().snapshot();
        assert_eq!(diagnostics.messages, 2);
        assert_eq!(diagnostics.heartbeat_replies, 1);
        assert_eq!(diagnostics.ignored_payloads, 1);

        manager.shutdown().await;
        timeout(Duration::from_secs(5), server).await.expect("server done").expect("server ok");
    }

    #[tokio::test]
    async fn test_reconnects_after_server_close() {
        let (listener, url) = listener().await;
        let (accepted_tx, mut accepted_rx) = mpsc::unbounded_channel();
        let server = tokio::spawn(async move {
            // first connection is dropped straight away, second one is kept
            for n in 0..2u32 {
                let (tcp, _) = listener.accept().await.expect("accept");
                let mut ws = accept_async(tcp).await.expect("handshake");
                accepted_tx.send(n).expect("notify");
                if n == 0 {
                    ws.close(None).await.ok();
                } else {
                    while let Some(Ok(_)) = ws.next().await {}
                }
            }
        });

        let (manager, _messages) = ConnectionManager::spawn(url, fast_settings());
        let mut state = manager.subscribe_state();

        assert_eq!(timeout(Duration::from_secs(5), accepted_rx.recv()).await.expect("first"), Some(0));
        assert_eq!(timeout(Duration::from_secs(5), accepted_rx.recv()).await.expect("second"), Some(1));
        wait_for(&mut state, ConnectionState::Connected).await;
        assert_eq!(manager.diagnostics_handle().snapshot().reconnects, 1);

        manager.shutdown().await;
        timeout(Duration::from_secs(5), server).await.expect("server done").expect("server ok");
    }

    #[tokio::test]
    async fn test_heartbeat_sends_ping() {
        let (listener, url) = listener().await;
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(tcp).await.expect("handshake");
            loop {
                match ws.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let text: &str = &text;
                        return text.to_string();
                    }
                    Some(Ok(_)) => continue,
                    _ => return String::new(),
                }
            }
        });

        let settings = StreamSettings {
            reconnect_delay: Duration::from_secs(60),
            heartbeat_interval: Duration::from_millis(50),
        };
        let (manager, _messages) = ConnectionManager::spawn(url, settings);

        let received = timeout(Duration::from_secs(5), server).await.expect("ping").expect("server ok");
        assert_eq!(received, HEARTBEAT_TOKEN);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_during_reconnect_wait() {
        // bind and release a port so the connect is refused
        let (listener, url) = listener().await;
        drop(listener);

        let settings = StreamSettings {
            reconnect_delay: Duration::from_secs(30),
            heartbeat_interval: Duration::from_secs(60),
        };
        let (manager, _messages) = ConnectionManager::spawn(url, settings);
        let mut state = manager.subscribe_state();
        wait_for(&mut state, ConnectionState::Disconnected).await;
        // Disconnected is also the initial value; give the refused connect time to land
        tokio::time::sleep(Duration::from_millis(200)).await;

        timeout(Duration::from_secs(2), manager.shutdown())
            .await
            .expect("shutdown does not wait for the reconnect timer");
    }
}
