//! Crate for Votegate, a minimal relay for a video votes API.

#[cfg(feature = "rustls-tls")]
#[cfg(feature = "native-tls")]
compile_error!("You can only enable one TLS backend");

pub extern crate url;

mod decode;
mod http_client;
mod routes;
mod video_id;

use crate::http_client::{BuildHttpClientArgs, HttpClient, build_http_client};
use anyhow::Result;
use axum::{Router, routing::get};
use reqwest::Proxy;
use routes::{HEALTH_ENDPOINT, INDEX_ENDPOINT, VOTES_BY_PATH_ENDPOINT, VOTES_ENDPOINT};
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, signal};
use tower_http::{
    catch_panic::CatchPanicLayer,
    normalize_path::NormalizePathLayer,
    trace::{self, TraceLayer},
};
use tracing::{Level, info};
use url::Url;

/// Votes API that upstream requests are made to unless overridden.
const DEFAULT_UPSTREAM_URL: &str = "https://returnyoutubedislikeapi.com";

/// # Example
/// ```rust,no_run
/// use std::net::{SocketAddr, IpAddr, Ipv4Addr};
/// use votegate::{VotegateServer, VotegateServerSettings};
///
/// # #[tokio::main]
/// # async fn main() {
/// let server = VotegateServer::new(VotegateServerSettings::default()).unwrap();
/// server.start(&SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 3000)).await.unwrap();
/// # }
/// ```
#[derive(Debug)]
pub struct VotegateServer {
    router_inner: Router,
}

/// Settings to run the Votegate server with.
#[derive(Debug, Clone, Default)]
pub struct VotegateServerSettings {
    /// See [`UpstreamSettings`].
    pub upstream_settings: UpstreamSettings,
}

/// Configuration options used when making any call to the upstream votes API.
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    /// Base [`Url`] of the upstream votes API.
    pub base_url: Url,

    /// The proxy to route upstream requests through.
    ///
    /// Values that cannot be turned into a usable proxy are ignored and
    /// requests are made directly instead.
    pub request_proxy: Option<Url>,

    /// Maximum amount of send attempts per relayed request before giving up
    /// and answering with a gateway error.
    ///
    /// When unset, transient upstream failures are retried for as long as the
    /// client keeps the connection open.
    pub max_retry_attempts: Option<u32>,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_UPSTREAM_URL)
                .expect("default upstream url should be a valid url"),
            request_proxy: None,
            max_retry_attempts: None,
        }
    }
}

#[derive(Debug)]
struct AppState {
    client: HttpClient,
    settings: VotegateServerSettings,
}

impl VotegateServer {
    /// Create a new server with the provided settings.
    pub fn new(settings: VotegateServerSettings) -> Result<Self> {
        let router = Router::new()
            .route(INDEX_ENDPOINT, get(routes::index_handler))
            .route(HEALTH_ENDPOINT, get(routes::health_handler))
            .route(VOTES_ENDPOINT, get(routes::votes_query_handler))
            .route(VOTES_BY_PATH_ENDPOINT, get(routes::votes_path_handler))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(NormalizePathLayer::trim_trailing_slash())
            .layer(CatchPanicLayer::new())
            .with_state(Arc::new(AppState {
                client: build_http_client(BuildHttpClientArgs {
                    proxy: settings
                        .upstream_settings
                        .request_proxy
                        .as_ref()
                        .and_then(|proxy| Proxy::all(proxy.as_str()).ok()),
                })?,
                settings,
            }));

        Ok(Self {
            router_inner: router,
        })
    }

    /// Start the server and expose it locally on the provided [`SocketAddr`].
    pub async fn start(self, address: &SocketAddr) -> Result<()> {
        let tcp_listener = TcpListener::bind(&address).await?;
        info!("Listening on http://{}", tcp_listener.local_addr()?);
        self.serve(tcp_listener).await
    }

    /// Serve requests on an already-bound [`TcpListener`] until shutdown.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        axum::serve(listener, self.router_inner)
            .with_graceful_shutdown(Self::shutdown_signal())
            .await?;
        Ok(())
    }

    // https://github.com/tokio-rs/axum/blob/15917c6dbcb4a48707a20e9cfd021992a279a662/examples/graceful-shutdown/src/main.rs#L55
    async fn shutdown_signal() {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }
}
