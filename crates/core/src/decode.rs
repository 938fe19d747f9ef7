use async_compression::tokio::bufread::{BrotliDecoder, GzipDecoder};
use axum::{
    body::Body,
    http::{HeaderMap, header},
};
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use std::{error::Error, io};
use tokio_util::io::{ReaderStream, StreamReader};

/// Transform applied to an upstream response body before it is relayed,
/// selected from the Content-Encoding the upstream declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyDecoder {
    /// Relay the body untouched.
    Identity,
    /// Decode the body as a gzip stream.
    Gzip,
    /// Decode the body as a brotli stream.
    Brotli,
}

impl BodyDecoder {
    /// Pick the decoder matching the Content-Encoding of an upstream response.
    ///
    /// Unknown or absent encodings fall back to [`BodyDecoder::Identity`].
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match headers
            .get(header::CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
        {
            Some("gzip") => Self::Gzip,
            Some("br") => Self::Brotli,
            _ => Self::Identity,
        }
    }

    /// Wrap the upstream byte stream into a response [`Body`] that yields
    /// decoded bytes as they arrive.
    ///
    /// A malformed compressed stream surfaces as a read error while the body
    /// is being drained, aborting the relayed response mid-stream.
    pub fn decode<S, E>(self, stream: S) -> Body
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<Box<dyn Error + Send + Sync>> + Send + 'static,
    {
        match self {
            Self::Identity => Body::from_stream(stream),
            Self::Gzip => {
                let reader = StreamReader::new(stream.map_err(io::Error::other));
                let mut decoder = GzipDecoder::new(reader);
                // Upstreams may concatenate gzip members; decode them all.
                decoder.multiple_members(true);
                Body::from_stream(ReaderStream::new(decoder))
            }
            Self::Brotli => {
                let reader = StreamReader::new(stream.map_err(io::Error::other));
                Body::from_stream(ReaderStream::new(BrotliDecoder::new(reader)))
            }
        }
    }
}
