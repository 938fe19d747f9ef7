pub const INDEX_ENDPOINT: &str = "/";

pub async fn index_handler() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"))
}
