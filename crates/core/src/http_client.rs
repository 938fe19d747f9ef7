use anyhow::Result;
use reqwest::Proxy;
use std::time::Duration;

pub type HttpClient = reqwest::Client;

pub struct BuildHttpClientArgs {
    pub proxy: Option<Proxy>,
}

/// Create a new [`HttpClient`] with the given arguments.
///
/// The returned client owns the process-wide connection pool and is shared by
/// every relayed request, so it is built exactly once at server startup.
pub fn build_http_client(args: BuildHttpClientArgs) -> Result<HttpClient> {
    let mut builder = reqwest::ClientBuilder::default()
        .connect_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(30))
        .read_timeout(Duration::from_secs(20))
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(10);
    if let Some(proxy) = args.proxy {
        builder = builder.proxy(proxy);
    }
    Ok(builder.build()?)
}
