use http::{HeaderMap, Method, StatusCode, Uri};

/// Recorded for exchanges where neither side carried a URI.
pub(super) const DEFAULT_REQUEST_URI: &str = "/";

/// Request side of an exchange, reduced to what the cache looks at.
#[derive(Debug, Clone)]
pub struct CacheRequest {
    pub method: Method,
    pub uri: Option<Uri>,
    pub headers: HeaderMap,
}

/// Response side of an exchange.
#[derive(Debug, Clone)]
pub struct CacheResponse {
    pub status: StatusCode,
    /// URI the exchange actually ended on, when redirects moved it away
    /// from the one requested.
    pub final_uri: Option<Uri>,
    pub body: Vec<u8>,
}

/// URI recorded alongside a saved entry: the response's final URI wins
/// over the request's, and an exchange with neither falls back to `/`.
pub(super) fn effective_uri(request: &CacheRequest, response: &CacheResponse) -> String {
    match response.final_uri.as_ref().or(request.uri.as_ref()) {
        Some(uri) => uri.to_string(),
        None => DEFAULT_REQUEST_URI.to_string(),
    }
}

/// URI used on the lookup path, where only the request is available.
pub(super) fn request_uri(request: &CacheRequest) -> String {
    match request.uri.as_ref() {
        Some(uri) => uri.to_string(),
        None => DEFAULT_REQUEST_URI.to_string(),
    }
}
