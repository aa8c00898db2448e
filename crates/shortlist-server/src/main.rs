//! Shortlist HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use shortlist::config::{Config, RankingConfig};
use shortlist::embedding::{BiEncoder, CrossEncoder, EncoderConfig, RerankerConfig};
use shortlist::reputation::{ReputationAggregator, ReputationConfig};
use shortlist_server::gateway::{HandlerState, create_router_with_state};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!(
        r#"
 ___ _  _  ___  ___ _____ _    ___ ___ _____
/ __| || |/ _ \| _ \_   _| |  |_ _/ __|_   _|
\__ \ __ | (_) |   / | | | |__ | |\__ \ | |
|___/_||_|\___/|_|_\ |_| |____|___|___/ |_|

        EMBED. RERANK. VOUCH.
                                    AGPL-3.0
"#
    );

    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        "Shortlist starting"
    );

    let ranking_config = RankingConfig::from_env()?;
    let reputation_config = ReputationConfig::from_env()?;

    let encoder = BiEncoder::load(EncoderConfig::from_path(config.encoder_path.clone()))?;

    let reranker = CrossEncoder::load(RerankerConfig::from_path(config.reranker_path.clone()))?;

    let reputation = ReputationAggregator::from_config(&reputation_config)?;
    tracing::info!(
        sources = reputation.sources().len(),
        max_retries = reputation_config.retry.max_retries,
        "Reputation sources configured"
    );

    let state = HandlerState::new(
        ranking_config,
        Arc::new(encoder),
        Arc::new(reranker),
        reputation,
    )?;

    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shortlist shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("SHORTLIST_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
