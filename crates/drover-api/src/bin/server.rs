//! Drover server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the campaign API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use drover_api::{
  ApiConfig, AppState,
  mailgun::{MailgunConfig, MailgunTransport},
};
use drover_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Drover campaign server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `DROVER_*` environment variables.
#[derive(Deserialize, Clone)]
struct ServerConfig {
  host:            String,
  port:            u16,
  store_path:      PathBuf,
  tracking_secret: String,
  cron_secret:     Option<String>,
  #[serde(default = "default_rate")]
  default_rate_per_sec: f64,
  mailgun_api_key: String,
  mailgun_domain:  String,
  mailgun_sender:  String,
}

fn default_rate() -> f64 {
  10.0
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("DROVER"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  let transport = MailgunTransport::new(MailgunConfig::new(
    server_cfg.mailgun_api_key.clone(),
    server_cfg.mailgun_domain.clone(),
    server_cfg.mailgun_sender.clone(),
  ))
  .context("mailgun transport misconfigured")?;

  let state = AppState {
    store:     Arc::new(store),
    transport: Arc::new(transport),
    config:    Arc::new(ApiConfig {
      tracking_secret:      server_cfg.tracking_secret.clone(),
      cron_secret:          server_cfg.cron_secret.clone(),
      default_rate_per_sec: server_cfg.default_rate_per_sec,
    }),
  };

  let app = drover_api::router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
