use reqwest::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::ApiError;
use crate::models::{
    AssistantLogEntry, AsyncProcessResponse, LoginRequest, NewTransaction, RegisterRequest,
    Session, SummarizeRequest, SummarizeResponse, TransactionFilter, TransactionRecord, User,
    WikipediaLogEntry, WikipediaSearchRequest, WikipediaSearchResponse,
};
use crate::utils::extract_detail_message;

/// Whether a 401 should be reported as an expired session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthCheck {
    Enforce,
    Skip,
}

/// HTTP client for the transaction backend's REST API
#[derive(Clone)]
pub struct TransactionApiClient {
    http_client: HttpClient,
    base_url: String,
}

impl TransactionApiClient {
    /// Create a client for the backend at `base_url` (origin, no `/api` suffix)
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Create default headers, with bearer authorization when a token is given
    fn create_headers(token: Option<&str>) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = token {
            let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::Request(format!("Failed to create auth header: {}", e)))?;
            headers.insert(AUTHORIZATION, auth_value);
        }

        Ok(headers)
    }

    /// Send a request and decode a JSON body, mapping failures to [`ApiError`]
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        auth: AuthCheck,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED && auth == AuthCheck::Enforce {
            warn!("Backend rejected the session token (401)");
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_detail_message(&body, fallback);
            debug!("Request failed with {}: {}", status.as_u16(), message);
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// POST /api/auth/register
    pub async fn register(&self, body: &RegisterRequest) -> Result<User, ApiError> {
        let request = self
            .http_client
            .post(self.url("/auth/register"))
            .headers(Self::create_headers(None)?)
            .json(body);
        self.send(request, AuthCheck::Skip, "Error al registrar").await
    }

    /// POST /api/auth/login
    ///
    /// A 401 here means bad credentials, not an expired session, so it is
    /// surfaced as an ordinary rejection.
    pub async fn login(&self, body: &LoginRequest) -> Result<Session, ApiError> {
        let request = self
            .http_client
            .post(self.url("/auth/login"))
            .headers(Self::create_headers(None)?)
            .json(body);
        self.send(request, AuthCheck::Skip, "Error al iniciar sesion").await
    }

    /// GET /api/auth/me
    pub async fn me(&self, token: &str) -> Result<User, ApiError> {
        let request = self
            .http_client
            .get(self.url("/auth/me"))
            .headers(Self::create_headers(Some(token))?);
        self.send(request, AuthCheck::Enforce, "No autenticado").await
    }

    /// POST /api/transactions/create
    ///
    /// Synchronous create; the returned record is already processed.
    pub async fn create_transaction(
        &self,
        token: &str,
        body: &NewTransaction,
    ) -> Result<TransactionRecord, ApiError> {
        let request = self
            .http_client
            .post(self.url("/transactions/create"))
            .headers(Self::create_headers(Some(token))?)
            .json(body);
        self.send(request, AuthCheck::Enforce, "Error al crear transaccion").await
    }

    /// POST /api/transactions/async-process
    ///
    /// Queues the create; the status change arrives later on the live channel.
    pub async fn create_async_transaction(
        &self,
        token: &str,
        body: &NewTransaction,
    ) -> Result<AsyncProcessResponse, ApiError> {
        let request = self
            .http_client
            .post(self.url("/transactions/async-process"))
            .headers(Self::create_headers(Some(token))?)
            .json(body);
        self.send(request, AuthCheck::Enforce, "Error al crear transaccion async").await
    }

    /// GET /api/transactions/ with optional filters, newest first
    pub async fn list_transactions(
        &self,
        token: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<TransactionRecord>, ApiError> {
        let request = self
            .http_client
            .get(self.url("/transactions/"))
            .headers(Self::create_headers(Some(token))?)
            .query(&filter.to_query());
        self.send(request, AuthCheck::Enforce, "Error al obtener transacciones").await
    }

    /// GET /api/transactions/{id}
    pub async fn get_transaction(&self, token: &str, id: &str) -> Result<TransactionRecord, ApiError> {
        let request = self
            .http_client
            .get(self.url(&format!("/transactions/{}", id)))
            .headers(Self::create_headers(Some(token))?);
        self.send(request, AuthCheck::Enforce, "Transaccion no encontrada").await
    }

    /// GET /api/health
    pub async fn health(&self) -> Result<serde_json::Value, ApiError> {
        let request = self.http_client.get(self.url("/health"));
        self.send(request, AuthCheck::Skip, "API no disponible").await
    }

    /// POST /api/assistant/summarize
    pub async fn summarize(
        &self,
        token: &str,
        body: &SummarizeRequest,
    ) -> Result<SummarizeResponse, ApiError> {
        let request = self
            .http_client
            .post(self.url("/assistant/summarize"))
            .headers(Self::create_headers(Some(token))?)
            .json(body);
        self.send(request, AuthCheck::Enforce, "Error al generar resumen").await
    }

    /// GET /api/assistant/history?skip=&limit=
    pub async fn summary_history(
        &self,
        token: &str,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<AssistantLogEntry>, ApiError> {
        let request = self
            .http_client
            .get(self.url("/assistant/history"))
            .headers(Self::create_headers(Some(token))?)
            .query(&[("skip", skip), ("limit", limit)]);
        self.send(request, AuthCheck::Enforce, "Error al obtener historial").await
    }

    /// POST /api/wikipedia/search
    pub async fn wikipedia_search(
        &self,
        token: &str,
        body: &WikipediaSearchRequest,
    ) -> Result<WikipediaSearchResponse, ApiError> {
        let request = self
            .http_client
            .post(self.url("/wikipedia/search"))
            .headers(Self::create_headers(Some(token))?)
            .json(body);
        self.send(request, AuthCheck::Enforce, "Error al buscar en Wikipedia").await
    }

    /// GET /api/wikipedia/history?skip=&limit=
    pub async fn wikipedia_history(
        &self,
        token: &str,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<WikipediaLogEntry>, ApiError> {
        let request = self
            .http_client
            .get(self.url("/wikipedia/history"))
            .headers(Self::create_headers(Some(token))?)
            .query(&[("skip", skip), ("limit", limit)]);
        self.send(request, AuthCheck::Enforce, "Error al obtener historial de Wikipedia").await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{TransactionKind, TransactionStatus};
    use rust_decimal_macros::dec;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve exactly one HTTP response and hand back the raw request text
    pub(crate) async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.expect("read");
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.expect("write");
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    #[tokio::test]
    async fn test_create_sends_bearer_and_body() {
        let body = r#"{"id":"a1","user_id":"u-1","monto":100.0,"tipo":"deposito","status":"procesado"}"#;
        let (base, server) = serve_once("201 Created", body).await;
        let client = TransactionApiClient::new(&base);

        let record = client
            .create_transaction(
                "tok",
                &NewTransaction {
                    user_id: "u-1".to_string(),
                    amount: dec!(100),
                    kind: TransactionKind::Deposito,
                },
            )
            .await
            .expect("create");

        let request = server.await.expect("server");
        assert!(request.starts_with("POST /api/transactions/create"));
        assert!(request.to_lowercase().contains("authorization: bearer tok"));
        assert!(request.contains(r#""tipo":"deposito""#));
        assert_eq!(record.status, TransactionStatus::Procesado);
    }

    #[tokio::test]
    async fn test_detail_message_surfaces_verbatim() {
        let body = r#"{"detail":{"error":"DUPLICATE_TRANSACTION","message":"Ya existe una transaccion con estos datos"}}"#;
        let (base, server) = serve_once("409 Conflict", body).await;
        let client = TransactionApiClient::new(&base);

        let err = client
            .list_transactions("tok", &TransactionFilter::default())
            .await
            .expect_err("conflict");
        server.await.expect("server");

        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "Ya existe una transaccion con estos datos");
    }

    #[tokio::test]
    async fn test_unauthorized_on_authenticated_call() {
        let (base, server) = serve_once("401 Unauthorized", r#"{"detail":"Token invalido"}"#).await;
        let client = TransactionApiClient::new(&base);

        let err = client.me("stale").await.expect_err("401");
        server.await.expect("server");
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_login_401_is_a_plain_rejection() {
        let (base, server) = serve_once("401 Unauthorized", r#"{"detail":"Credenciales invalidas"}"#).await;
        let client = TransactionApiClient::new(&base);

        let err = client
            .login(&LoginRequest {
                email: "a@b.c".to_string(),
                password: "x".to_string(),
            })
            .await
            .expect_err("401");
        server.await.expect("server");

        assert!(!err.is_unauthorized());
        assert_eq!(err.to_string(), "Credenciales invalidas");
    }

    #[tokio::test]
    async fn test_list_sends_filters() {
        let (base, server) = serve_once("200 OK", "[]").await;
        let client = TransactionApiClient::new(&base);
        let filter = TransactionFilter {
            user_id: Some("u-9".to_string()),
            status: Some(TransactionStatus::Fallido),
            ..Default::default()
        };

        let records = client.list_transactions("tok", &filter).await.expect("list");
        let request = server.await.expect("server");

        assert!(records.is_empty());
        assert!(request.starts_with("GET /api/transactions/?user_id=u-9&tx_status=fallido"));
    }
}
