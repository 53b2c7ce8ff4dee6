use anyhow::Context;
use leadboard::api::{self, AppState};
use leadboard::config::{AppConfig, LogFormat};
use leadboard::fixture;
use leadboard::source::{FixtureSource, LeadStore};
use leadboard::telemetry::Telemetry;
use leadboard::upstream::UpstreamClient;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cfg = AppConfig::from_env()?;
    init_tracing(cfg.log_format);

    let telemetry = Telemetry::new()?;
    let store = build_store(&cfg, &telemetry).await?;

    let state = AppState {
        store,
        telemetry,
        api_base: cfg.public_api_base.clone(),
    };
    let app = api::router(state);

    let listen_addr = cfg.listen_addr();
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    tracing::info!(%listen_addr, "starting leadboard");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("leadboard exited cleanly");

    Ok(())
}

async fn build_store(cfg: &AppConfig, telemetry: &Telemetry) -> anyhow::Result<LeadStore> {
    if let Some(upstream) = cfg.upstream.clone() {
        let base_url = upstream.base_url.clone();
        let client = UpstreamClient::try_new(upstream)?.with_telemetry(telemetry.clone());

        match client.health().await {
            Ok(health) => {
                tracing::info!(%base_url, status = %health.status, service = %health.service, "lead backend reachable")
            }
            Err(error) => {
                tracing::warn!(%base_url, %error, "lead backend not reachable yet; serving anyway")
            }
        }

        return Ok(LeadStore::new(client));
    }

    let leads = match &cfg.fixture_path {
        Some(path) => fixture::load_leads(path)?,
        None => fixture::bundled_leads().context("failed to load bundled leads")?,
    };

    tracing::info!(count = leads.len(), "no upstream configured; serving fixture leads");
    Ok(LeadStore::new(FixtureSource::new(leads)))
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Plain => builder.init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term_signal) => term_signal.recv().await,
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
                None
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
