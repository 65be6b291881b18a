use super::request::{CacheRequest, CacheResponse};

/// Requests carrying either of these headers hold short-lived credential
/// material; their responses must never reach the disk.
pub const SECURITY_KEY_HEADER: &str = "x-security-key";
pub const SECURITY_KEY_HEX_HEADER: &str = "x-security-key-hex";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SaveSkipReason {
    NonSuccessStatus,
    SecurityMarkedRequest,
    EmptyBody,
}

impl SaveSkipReason {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            SaveSkipReason::NonSuccessStatus => "non_success_status",
            SaveSkipReason::SecurityMarkedRequest => "security_marked_request",
            SaveSkipReason::EmptyBody => "empty_body",
        }
    }
}

/// Decides whether an exchange may be saved. Returns the first reason to
/// refuse, or `None` when the response can go to disk.
pub(super) fn save_skip_reason(
    request: &CacheRequest,
    response: &CacheResponse,
) -> Option<SaveSkipReason> {
    if !response.status.is_success() {
        return Some(SaveSkipReason::NonSuccessStatus);
    }

    if request.headers.contains_key(SECURITY_KEY_HEADER)
        || request.headers.contains_key(SECURITY_KEY_HEX_HEADER)
    {
        return Some(SaveSkipReason::SecurityMarkedRequest);
    }

    if response.body.is_empty() {
        return Some(SaveSkipReason::EmptyBody);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, Method, StatusCode};

    fn request() -> CacheRequest {
        CacheRequest {
            method: Method::GET,
            uri: Some("https://example.com/a".parse().expect("valid uri")),
            headers: HeaderMap::new(),
        }
    }

    fn response(status: StatusCode, body: &[u8]) -> CacheResponse {
        CacheResponse {
            status,
            final_uri: None,
            body: body.to_vec(),
        }
    }

    #[test]
    fn admits_a_plain_success() {
        assert_eq!(
            save_skip_reason(&request(), &response(StatusCode::OK, b"payload")),
            None
        );
    }

    #[test]
    fn refuses_non_success_statuses() {
        for status in [
            StatusCode::MOVED_PERMANENTLY,
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            assert_eq!(
                save_skip_reason(&request(), &response(status, b"payload")),
                Some(SaveSkipReason::NonSuccessStatus)
            );
        }
    }

    #[test]
    fn refuses_security_marked_requests() {
        for header in [SECURITY_KEY_HEADER, SECURITY_KEY_HEX_HEADER] {
            let mut request = request();
            request
                .headers
                .insert(header, "opaque".parse().expect("valid value"));
            assert_eq!(
                save_skip_reason(&request, &response(StatusCode::OK, b"payload")),
                Some(SaveSkipReason::SecurityMarkedRequest)
            );
        }
    }

    #[test]
    fn refuses_empty_bodies() {
        assert_eq!(
            save_skip_reason(&request(), &response(StatusCode::OK, b"")),
            Some(SaveSkipReason::EmptyBody)
        );
    }

    #[test]
    fn status_is_checked_before_the_other_rules() {
        let mut request = request();
        request
            .headers
            .insert(SECURITY_KEY_HEADER, "opaque".parse().expect("valid value"));
        assert_eq!(
            save_skip_reason(&request, &response(StatusCode::BAD_GATEWAY, b"")),
            Some(SaveSkipReason::NonSuccessStatus)
        );
    }
}
