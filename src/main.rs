#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use anyhow::Context;
use lectern_server::adapters::database;
use lectern_server::api;
use lectern_server::config::Config;
use lectern_server::domain::token::TokenCodec;
use lectern_server::services::auth_service::AuthService;
use lectern_server::telemetry;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    telemetry::init_telemetry(&config.telemetry)?;

    // Signing setup is validated before anything binds; a short secret or a
    // broken TTL string must never reach a serving process.
    let codec = TokenCodec::new(&config.auth).context("auth configuration rejected")?;

    let pool = database::init_pool(&config.database).await.context("database connection failed")?;
    database::run_migrations(&pool).await.context("migrations failed")?;

    let users = Arc::new(database::user_repo::UserRepository::new(pool.clone()));
    let sessions = Arc::new(database::session_repo::RefreshSessionRepository::new(pool.clone()));
    let auth_service = AuthService::new(codec, users, sessions);

    let app = api::app_router(config.clone(), auth_service, pool);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
