use thiserror::Error;

/// Failure of a call to the transaction backend
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// 401 on an authenticated endpoint; the session is no longer valid
    #[error("Sesion expirada. Inicia sesion nuevamente")]
    Unauthorized,
    /// Non-2xx response; `message` is the backend `detail` or a fallback
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// Network or transport failure
    #[error("Error de red: {0}")]
    Request(String),
    /// 2xx response with a body we could not decode
    #[error("Respuesta invalida del servidor: {0}")]
    Deserialization(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
