pub mod assistant;
pub mod auth;
pub mod help;
pub mod notifications;
pub mod status;
pub mod transaction;
pub mod wikipedia;

use tracing::{debug, warn};

use crate::api::ApiError;
use crate::app::AppContext;
use crate::models::Severity;

/// Whether the input loop should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Why a command did not complete
#[derive(Debug)]
pub enum CommandError {
    /// Bad input or a local precondition; shown as an error notification
    Message(String),
    /// Backend failure; a 401 logs the user out instead of notifying
    Api(ApiError),
}

impl From<String> for CommandError {
    fn from(message: String) -> Self {
        CommandError::Message(message)
    }
}

impl From<&str> for CommandError {
    fn from(message: &str) -> Self {
        CommandError::Message(message.to_string())
    }
}

impl From<ApiError> for CommandError {
    fn from(err: ApiError) -> Self {
        CommandError::Api(err)
    }
}

pub type CommandResult = Result<(), CommandError>;

/// Run one line of console input
pub async fn handle_line(ctx: &AppContext, line: &str) -> Flow {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((first, args)) = parts.split_first() else {
        return Flow::Continue;
    };

    let command = first.to_lowercase();
    debug!("Command '{}' with {} args", command, args.len());

    let result = match command.as_str() {
        "help" | "?" => help::execute(),
        "login" => auth::login(ctx, args).await,
        "register" => auth::register(ctx, args).await,
        "logout" => auth::logout(ctx).await,
        "me" | "whoami" => auth::me(ctx).await,
        "create" => transaction::create(ctx, args).await,
        "queue" | "async" => transaction::queue(ctx, args).await,
        "list" | "ls" => transaction::list(ctx, args).await,
        "show" => transaction::show(ctx, args).await,
        "refresh" => transaction::refresh(ctx).await,
        "summarize" => assistant::summarize(ctx, args).await,
        "summaries" => assistant::history(ctx, args).await,
        "wiki" => wikipedia::search(ctx, args).await,
        "wiki-history" => wikipedia::history(ctx, args).await,
        "notifications" | "notifs" => notifications::list(ctx).await,
        "dismiss" => notifications::dismiss(ctx, args).await,
        "status" => status::execute(ctx).await,
        "quit" | "exit" => return Flow::Quit,
        _ => Err(format!("Comando desconocido: {}. Escribe 'help' para ver los comandos", command).into()),
    };

    if let Err(e) = result {
        match e {
            CommandError::Message(message) => {
                warn!("Command {} failed: {}", command, message);
                ctx.notify(Severity::Error, message).await;
            }
            CommandError::Api(err) => {
                match err.status() {
                    Some(status) => warn!("Command {} rejected with {}: {}", command, status, err),
                    None => warn!("Command {} failed: {}", command, err),
                }
                ctx.report_api_error(&err).await;
            }
        }
    }

    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_context;
    use std::time::Instant;

    #[tokio::test]
    async fn test_quit_and_blank_lines() {
        let ctx = test_context("http://127.0.0.1:9");
        assert_eq!(handle_line(&ctx, "   ").await, Flow::Continue);
        assert_eq!(handle_line(&ctx, "QUIT").await, Flow::Quit);
        assert!(ctx.feed.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_notifies() {
        let ctx = test_context("http://127.0.0.1:9");
        assert_eq!(handle_line(&ctx, "frobnicate").await, Flow::Continue);

        let feed = ctx.feed.lock().await;
        let visible = feed.visible(Instant::now());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].severity, Severity::Error);
        assert!(visible[0].message.contains("frobnicate"));
    }

    #[tokio::test]
    async fn test_session_required() {
        let ctx = test_context("http://127.0.0.1:9");
        handle_line(&ctx, "list").await;

        let feed = ctx.feed.lock().await;
        let visible = feed.visible(Instant::now());
        assert_eq!(visible.len(), 1);
        assert!(visible[0].message.starts_with("Inicia sesion"));
    }
}
