//! Parley chat API server binary.
//!
//! Reads configuration from the environment (and `.env`), lets a few CLI
//! flags override it, and serves the REST API until Ctrl-C.

use clap::Parser;
use parley_api::AppState;
use parley_api::config::ApiConfig;
use parley_core::provider::config::ProviderKind;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const DEFAULT_LOG_FILTER: &str = "info,parley_api=debug,parley_core=debug";

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "parley_server", about = "Parley chat API server")]
struct Args {
    /// Host to bind; overrides the host part of `BIND_ADDR`.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (0 = ephemeral); overrides the port part of `BIND_ADDR`.
    #[arg(long)]
    port: Option<u16>,

    /// Generation provider: `gemini` or `local`.
    #[arg(long, env = "PARLEY_PROVIDER")]
    provider: Option<ProviderKind>,
}

impl Args {
    fn apply(self, config: &mut ApiConfig) {
        if self.host.is_some() || self.port.is_some() {
            let (host, port) = config
                .bind_addr
                .rsplit_once(':')
                .unwrap_or((config.bind_addr.as_str(), "5000"));
            let host = self.host.as_deref().unwrap_or(host);
            let port = self.port.map(|p| p.to_string()).unwrap_or_else(|| port.to_string());
            config.bind_addr = format!("{host}:{port}");
        }
        if let Some(kind) = self.provider {
            config.provider.kind = kind;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();
    let mut config = ApiConfig::from_env()?;
    args.apply(&mut config);

    info!(
        bind_addr = %config.bind_addr,
        provider = %config.provider.kind,
        "starting parley_server"
    );
    if config.provider.kind == ProviderKind::Local && config.provider.api_key.is_none() {
        warn!("no GEMINI_API_KEY configured, replies come from the local provider");
    }

    let shutdown = CancellationToken::new();
    let state = AppState::from_config(config.clone(), shutdown.clone())?;
    let app = parley_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested");
            }
            shutdown.cancel();
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(host: Option<&str>, port: Option<u16>) -> Args {
        Args {
            host: host.map(str::to_string),
            port,
            provider: None,
        }
    }

    #[test]
    fn port_flag_keeps_configured_host() {
        let mut config = ApiConfig::default();
        args(None, Some(8080)).apply(&mut config);
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn host_flag_keeps_configured_port() {
        let mut config = ApiConfig::default();
        args(Some("0.0.0.0"), None).apply(&mut config);
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
    }

    #[test]
    fn provider_flag_overrides_config() {
        let mut config = ApiConfig::default();
        Args {
            host: None,
            port: None,
            provider: Some(ProviderKind::Gemini),
        }
        .apply(&mut config);
        assert_eq!(config.provider.kind, ProviderKind::Gemini);
    }
}
