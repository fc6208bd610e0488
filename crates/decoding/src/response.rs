//! Transparent gzip decoding of HTTP responses.

use crate::body::GzipBody;
use crate::config::DecoderConfig;
use http::header::{CONTENT_ENCODING, CONTENT_LENGTH};
use http::{HeaderMap, Response, StatusCode};
use http_body::Body;
use http_body_util::Either;
use tracing::debug;

/// Returns true if `headers` declare a body encoded with gzip alone.
///
/// `x-gzip` is accepted as an alias. Bodies with several codings applied are
/// not considered gzip encoded, since decoding gzip would not yield the
/// identity body.
pub fn is_gzip_encoded(headers: &HeaderMap) -> bool {
    let mut codings = headers
        .get_all(CONTENT_ENCODING)
        .iter()
        .flat_map(|value| value.to_str().unwrap_or_default().split(','))
        .map(str::trim)
        .filter(|coding| !coding.is_empty() && !coding.eq_ignore_ascii_case("identity"));

    match (codings.next(), codings.next()) {
        (Some(coding), None) => coding.eq_ignore_ascii_case("gzip") || coding.eq_ignore_ascii_case("x-gzip"),
        _ => false,
    }
}

/// Returns true if a response with `status` carries no body at all.
fn is_bodiless(status: StatusCode) -> bool {
    status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
}

/// Decodes the body of a gzip encoded response, passing any other through.
///
/// A decoded response loses its `Content-Encoding` and `Content-Length`
/// headers, which describe the encoded body. Responses without a body, such
/// as `304 Not Modified` or replies to `HEAD`, are passed through with their
/// headers untouched.
pub fn decode_response<B: Body>(response: Response<B>) -> Response<Either<GzipBody<B>, B>> {
    decode_response_with_config(response, DecoderConfig::default())
}

pub fn decode_response_with_config<B: Body>(
    response: Response<B>,
    config: DecoderConfig,
) -> Response<Either<GzipBody<B>, B>> {
    if !is_gzip_encoded(response.headers()) {
        return response.map(Either::Right);
    }

    let body = response.body();
    if is_bodiless(response.status()) || body.is_end_stream() || body.size_hint().exact() == Some(0) {
        debug!(status = %response.status(), "gzip encoded response has no body");
        return response.map(Either::Right);
    }

    let (mut parts, body) = response.into_parts();
    parts.headers.remove(CONTENT_ENCODING);
    parts.headers.remove(CONTENT_LENGTH);
    debug!(status = %parts.status, "decoding gzip encoded response body");

    Response::from_parts(parts, Either::Left(GzipBody::with_config(body, config)))
}
