use std::{net::SocketAddr, sync::Arc, time::Duration};

use clap::Parser;
use idea_validator_core::ListPolicy;
use idea_validator_daemon::{
    config::{DaemonConfig, DEFAULT_MODEL, DEFAULT_OPENAI_BASE_URL},
    http,
    llm::OpenAiClient,
    service::ValidationService,
};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "idea-validator-daemon", version, about = "Business idea validation service")]
struct Args {
    /// Listen address, e.g. 127.0.0.1:3000
    #[arg(long, env = "IDEA_VALIDATOR_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// Credential for the model service.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_BASE_URL)]
    openai_base_url: String,

    /// Model identifier sent with every request.
    #[arg(long, env = "IDEA_VALIDATOR_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Do not let the model search the web.
    #[arg(long, default_value_t = false)]
    no_web_search: bool,

    /// Abandon a model call after this many seconds.
    #[arg(long, default_value_t = 120)]
    request_timeout_secs: u64,

    /// strict: reject replies with wrong list sizes; lenient: pad/truncate them.
    #[arg(long, default_value = "strict")]
    list_policy: ListPolicy,

    /// Include diagnostic details in error responses.
    #[arg(long, env = "IDEA_VALIDATOR_DEV", default_value_t = false)]
    dev_mode: bool,

    /// Log level (env-filter syntax).
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DaemonConfig {
        listen: args.listen,
        openai_api_key: args.openai_api_key,
        openai_base_url: args.openai_base_url,
        model: args.model,
        web_search: !args.no_web_search,
        request_timeout: Duration::from_secs(args.request_timeout_secs),
        list_policy: args.list_policy,
        dev_mode: args.dev_mode,
    };
    tracing::info!(?config, "starting daemon");

    let client = OpenAiClient::from_config(&config);
    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; validation requests will fail until it is");
    }
    let svc = Arc::new(ValidationService::new(Arc::new(client), &config));
    let app = http::router(svc, config.dev_mode);

    tracing::info!(listen = %config.listen, "listening");
    axum::serve(tokio::net::TcpListener::bind(config.listen).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown requested");
}
