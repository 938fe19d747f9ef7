use anyhow::Result;
use clap::{
    Parser,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use dotenvy::dotenv;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;
use votegate::{UpstreamSettings, VotegateServer, VotegateServerSettings, url::Url};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightMagenta.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightMagenta.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about, styles = styles())]
struct AppOptions {
    /// The socket address that the local server should be hosted on.
    #[arg(
        long = "address",
        env = "VOTEGATE_ADDRESS",
        default_value = "127.0.0.1:3000"
    )]
    address: SocketAddr,

    /// Base URL of the upstream votes API.
    #[arg(
        long = "upstream-url",
        env = "VOTEGATE_UPSTREAM_URL",
        default_value = "https://returnyoutubedislikeapi.com"
    )]
    upstream_url: Url,

    /// The HTTP proxy to route upstream requests through.
    /// Values that cannot be parsed as a URL are ignored and requests are made directly.
    #[arg(long = "upstream-request-proxy", env = "PROXY")]
    upstream_request_proxy: Option<String>,

    /// Maximum amount of send attempts per relayed request before answering with a gateway error.
    /// When unset, transient upstream failures are retried indefinitely.
    #[arg(
        long = "upstream-max-retry-attempts",
        env = "VOTEGATE_UPSTREAM_MAX_RETRY_ATTEMPTS"
    )]
    upstream_max_retry_attempts: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info")))
        .init();
    let args = AppOptions::parse();

    VotegateServer::new(VotegateServerSettings {
        upstream_settings: UpstreamSettings {
            base_url: args.upstream_url,
            request_proxy: args
                .upstream_request_proxy
                .and_then(|proxy| Url::parse(&proxy).ok()),
            max_retry_attempts: args.upstream_max_retry_attempts,
        },
    })?
    .start(&args.address)
    .await
}
