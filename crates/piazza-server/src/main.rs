use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use piazza_api::{AppStateInner, router};
use piazza_roster::{Roster, run_sweep_loop};
use piazza_store::CredentialStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "piazza_server=debug,piazza_api=debug,piazza_store=debug,piazza_roster=debug,tower_http=debug"
                    .into()
            }),
        )
        .init();

    // Config
    let host = std::env::var("PIAZZA_HOST").unwrap_or_else(|_| "127.0.0.1".into());
    let port: u16 = std::env::var("PIAZZA_PORT")
        .unwrap_or_else(|_| "5001".into())
        .parse()?;
    let users_path: PathBuf = match std::env::var("PIAZZA_USERS_PATH") {
        Ok(p) => p.into(),
        Err(_) => piazza_store::default_store_path(),
    };
    let sweep_secs: u64 = std::env::var("PIAZZA_SWEEP_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(60);
    let idle_secs: u64 = std::env::var("PIAZZA_IDLE_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(90);

    // Durable credentials, volatile presence
    let creds = CredentialStore::open(users_path)?;
    info!("{} registered nickname(s)", creds.len()?);
    let roster = Roster::new();

    // Background sweeper
    tokio::spawn(run_sweep_loop(
        roster.clone(),
        Duration::from_secs(sweep_secs),
        Duration::from_secs(idle_secs),
    ));

    let state = Arc::new(AppStateInner { creds, roster });
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("piazza relay listening on {}", addr);
    info!("sweeper runs every {}s, idle threshold {}s", sweep_secs, idle_secs);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
