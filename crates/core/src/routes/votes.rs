use crate::{AppState, decode::BodyDecoder, video_id};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

pub const VOTES_ENDPOINT: &str = "/votes";
pub const VOTES_BY_PATH_ENDPOINT: &str = "/votes/{video_id}";

#[derive(Debug, Deserialize)]
pub struct VotesQueryParams {
    /// Identifier of the video to fetch votes for.
    #[serde(rename = "videoId", default)]
    pub video_id: String,
}

pub async fn votes_query_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VotesQueryParams>,
) -> Response {
    relay_votes(&state, &query.video_id).await
}

pub async fn votes_path_handler(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Response {
    relay_votes(&state, &video_id).await
}

/// Fixed browser-mimicking header set attached to every upstream attempt.
fn upstream_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(8);
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; rv:91.0) Gecko/20100101 Firefox/91.0",
        ),
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(
        header::ACCEPT_ENCODING,
        HeaderValue::from_static("gzip, deflate, br"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("empty"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("cors"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-origin"),
    );
    headers
}

/// Forward a votes lookup to the upstream API and stream back its answer.
///
/// Transport failures and rate-limit answers from the upstream are retried
/// with a freshly built request and are never surfaced to the client; any
/// other upstream status is relayed verbatim with the body decoded per its
/// declared Content-Encoding.
async fn relay_votes(state: &AppState, video_id: &str) -> Response {
    if !video_id::is_plausible_video_id(video_id) {
        return (StatusCode::BAD_REQUEST, "Invalid video id").into_response();
    }

    // The identifier is appended verbatim, as is the empty likeCount
    // parameter the upstream expects.
    let url = format!(
        "{}/Votes?videoId={video_id}&likeCount=",
        state
            .settings
            .upstream_settings
            .base_url
            .as_str()
            .trim_end_matches('/'),
    );

    let mut attempts: u32 = 0;
    let upstream_response = loop {
        attempts += 1;
        match state
            .client
            .get(url.as_str())
            .headers(upstream_headers())
            .send()
            .await
        {
            Ok(response) if response.status() != StatusCode::TOO_MANY_REQUESTS => break response,
            Ok(_) => debug!("Upstream rate limited request attempt {attempts}"),
            Err(err) => debug!("Upstream request attempt {attempts} failed: {err}"),
        }

        let retries_exhausted = state
            .settings
            .upstream_settings
            .max_retry_attempts
            .is_some_and(|max_attempts| attempts >= max_attempts);
        if retries_exhausted {
            warn!("Abandoning upstream request after {attempts} attempts");
            return (
                StatusCode::BAD_GATEWAY,
                "Unable to retrieve content from upstream server.",
            )
                .into_response();
        }
    };

    let decoder = BodyDecoder::from_headers(upstream_response.headers());
    Response::builder()
        .status(upstream_response.status())
        .body(decoder.decode(upstream_response.bytes_stream()))
        .expect("response built from an upstream status should always be valid")
}
