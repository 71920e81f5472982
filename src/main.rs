use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod commands;
mod config;
mod models;
mod services;
mod utils;

use app::AppContext;
use commands::Flow;
use config::Config;
use services::auth_service;
use services::connection_service::ConnectionState;
use services::stream_service::{stream_url, ConnectionManager, StreamSettings};

fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    for directive in ["txn_console=debug", "tokio_tungstenite=warn"] {
        match directive.parse() {
            Ok(d) => filter = filter.add_directive(d),
            Err(e) => eprintln!("Ignoring log directive {}: {}", directive, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Log every change of the live channel so the console shows its state
async fn watch_connection(mut state: watch::Receiver<ConnectionState>) {
    while state.changed().await.is_ok() {
        let current = *state.borrow_and_update();
        match current {
            ConnectionState::Connected => info!("Live updates connected"),
            ConnectionState::Errored => warn!("Live updates error, waiting for close"),
            other => info!("Live updates {}", other),
        }
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing();

    info!("Starting txn-console...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };

    let url = match stream_url(&config.api_url, &config.stream_path) {
        Ok(url) => url,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };
    let settings = StreamSettings {
        reconnect_delay: config.timings.reconnect_delay,
        heartbeat_interval: config.timings.heartbeat_interval,
    };
    let (manager, messages) = ConnectionManager::spawn(url, settings);
    info!("API at {}, live updates at {}", config.api_url, manager.url());

    let ctx = AppContext::new(
        config,
        manager.subscribe_state(),
        manager.subscribe_latest(),
        manager.diagnostics_handle(),
    );
    let bridge = tokio::spawn(ctx.clone().run_bridge(messages));
    let watcher = tokio::spawn(watch_connection(manager.subscribe_state()));

    match auth_service::restore(&ctx).await {
        Some(session) => println!(
            "Sesion restaurada: {}. Escribe 'help' para ver los comandos",
            session.user.display_name()
        ),
        None => println!("Escribe 'login <email> <password>' para empezar, o 'help'"),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if commands::handle_line(&ctx, &line).await == Flow::Quit {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    info!("Shutting down...");
    manager.shutdown().await;
    watcher.abort();
    if let Err(e) = bridge.await {
        warn!("Bridge task ended abnormally: {}", e);
    }
}
