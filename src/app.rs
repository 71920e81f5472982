//! Shared client state passed to every command and background task

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tracing::{info, warn};

use crate::api::{ApiError, TransactionApiClient};
use crate::config::Config;
use crate::models::{NotificationEntry, Session, Severity};
use crate::services::connection_service::ConnectionState;
use crate::services::notification_service::NotificationFeed;
use crate::services::reconciliation_service;
use crate::services::session_service::SessionStore;
use crate::services::stream_service::{DiagnosticsSnapshot, StreamDiagnostics};
use crate::services::transaction_store::TransactionStore;

/// Everything the console needs, cheap to clone into spawned tasks.
///
/// The session lives here rather than in a global so that login and logout
/// are the only places it changes.
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub api: TransactionApiClient,
    pub store: Arc<Mutex<TransactionStore>>,
    pub feed: Arc<Mutex<NotificationFeed>>,
    session: Arc<RwLock<Option<Session>>>,
    session_store: SessionStore,
    connection: watch::Receiver<ConnectionState>,
    latest: watch::Receiver<Option<Value>>,
    diagnostics: Arc<StreamDiagnostics>,
}

impl AppContext {
    pub fn new(
        config: Config,
        connection: watch::Receiver<ConnectionState>,
        latest: watch::Receiver<Option<Value>>,
        diagnostics: Arc<StreamDiagnostics>,
    ) -> Self {
        let api = TransactionApiClient::new(config.api_url.as_str());
        let session_store = SessionStore::new(config.session_file.clone(), config.session_key);
        let feed = NotificationFeed::new(config.timings.notification_ttl);

        Self {
            config,
            api,
            store: Arc::new(Mutex::new(TransactionStore::new())),
            feed: Arc::new(Mutex::new(feed)),
            session: Arc::new(RwLock::new(None)),
            session_store,
            connection,
            latest,
            diagnostics,
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    /// Last message received on the live channel, if any
    pub fn latest_message(&self) -> Option<Value> {
        self.latest.borrow().clone()
    }

    pub fn stream_diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Bearer token of the current session, or a message asking to log in
    pub async fn require_token(&self) -> Result<String, String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or_else(|| "Inicia sesion primero (login <email> <password>)".to_string())
    }

    /// Load the persisted session once at start-up
    pub async fn restore_session(&self) -> Option<Session> {
        let restored = self.session_store.load_or_discard().await;
        *self.session.write().await = restored.clone();
        restored
    }

    pub async fn begin_session(&self, session: Session) {
        if let Err(e) = self.session_store.save(&session).await {
            warn!("Could not persist session: {}", e);
        }
        info!("Logged in as {}", session.user.email);
        *self.session.write().await = Some(session);
    }

    /// Drop the session in memory and on disk, and forget the loaded list
    pub async fn end_session(&self) {
        *self.session.write().await = None;
        if let Err(e) = self.session_store.clear().await {
            warn!("Could not remove session file: {}", e);
        }
        self.store.lock().await.clear();
    }

    /// Push a notification, print it, and schedule its removal
    pub async fn notify(&self, severity: Severity, message: impl Into<String>) -> NotificationEntry {
        let entry = self.feed.lock().await.push(severity, message, Instant::now());
        self.announce(&entry);
        entry
    }

    fn announce(&self, entry: &NotificationEntry) {
        println!("[{}] {}", entry.severity.label().to_uppercase(), entry.message);
        self.schedule_expiry(entry.id);
    }

    fn schedule_expiry(&self, id: u64) {
        let feed = Arc::clone(&self.feed);
        let ttl = self.config.timings.notification_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            feed.lock().await.dismiss(id);
        });
    }

    /// Turn an API failure into user feedback.
    ///
    /// A 401 logs the user out instead of producing a notification; every
    /// other failure becomes an error notification with the server message.
    pub async fn report_api_error(&self, err: &ApiError) {
        if err.is_unauthorized() {
            warn!("Session rejected by backend, logging out");
            self.end_session().await;
            println!("{}", err);
            return;
        }
        self.notify(Severity::Error, err.to_string()).await;
    }

    /// Consume live messages in arrival order until the channel closes
    pub async fn run_bridge(self, mut messages: mpsc::UnboundedReceiver<Value>) {
        while let Some(value) = messages.recv().await {
            let entry = {
                let mut store = self.store.lock().await;
                let mut feed = self.feed.lock().await;
                reconciliation_service::reconcile(&value, &mut store, &mut feed, Instant::now())
            };
            if let Some(entry) = entry {
                self.announce(&entry);
            }
        }
        info!("Live message stream closed");
    }
}
