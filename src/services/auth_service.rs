//! Login, registration and session restore

use tracing::{info, warn};

use super::transaction_service;
use crate::api::ApiError;
use crate::app::AppContext;
use crate::models::{LoginRequest, RegisterRequest, Session, TransactionFilter, User};

/// Log in, persist the session and load the transaction list.
///
/// A failed list load after a successful login is reported but does not
/// undo the login.
pub async fn login(ctx: &AppContext, email: &str, password: &str) -> Result<Session, ApiError> {
    let session = ctx
        .api
        .login(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })
        .await?;

    ctx.begin_session(session.clone()).await;

    if let Err(e) = transaction_service::refresh(ctx, &session.access_token, &TransactionFilter::default()).await {
        ctx.report_api_error(&e).await;
    }
    Ok(session)
}

pub async fn register(
    ctx: &AppContext,
    email: &str,
    password: &str,
    full_name: Option<String>,
) -> Result<User, ApiError> {
    let user = ctx
        .api
        .register(&RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name,
        })
        .await?;
    info!("Registered {}", user.email);
    Ok(user)
}

pub async fn logout(ctx: &AppContext) {
    ctx.end_session().await;
    info!("Logged out");
}

/// Ask the backend who the token belongs to
pub async fn current_user(ctx: &AppContext, token: &str) -> Result<User, ApiError> {
    ctx.api.me(token).await
}

/// Restore the saved session and check it is still accepted.
///
/// A rejected token ends the session; an unreachable backend keeps it so the
/// user is not logged out by a network blip.
pub async fn restore(ctx: &AppContext) -> Option<Session> {
    let session = ctx.restore_session().await?;

    match ctx.api.me(&session.access_token).await {
        Ok(user) => {
            info!("Resumed session for {}", user.email);
            if let Err(e) =
                transaction_service::refresh(ctx, &session.access_token, &TransactionFilter::default()).await
            {
                warn!("Initial transaction load failed: {}", e);
            }
            Some(session)
        }
        Err(e) if e.is_unauthorized() => {
            warn!("Saved session was rejected, discarding it");
            ctx.end_session().await;
            None
        }
        Err(e) => {
            warn!("Could not verify saved session: {}", e);
            Some(session)
        }
    }
}
