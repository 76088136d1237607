//! Request extractors.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Header set by fragment-swapping clients on boosted requests.
pub const HX_REQUEST: &str = "hx-request";

/// How the client wants mutation responses shaped.
///
/// `Full` is the plain API contract: the affected entity (or no body on
/// delete). `Partial` is for clients that swap a page fragment in place and
/// therefore want the refreshed collection back from the same request,
/// without a follow-up GET. The mode is carried explicitly per request via
/// the `HX-Request` header rather than inferred from ambient state, so the
/// same handler serves both shapes and tests can exercise each directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    #[default]
    Full,
    Partial,
}

impl ResponseMode {
    pub fn is_partial(self) -> bool {
        matches!(self, Self::Partial)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ResponseMode
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mode = match parts.headers.get(HX_REQUEST) {
            Some(value) if value.as_bytes().eq_ignore_ascii_case(b"true") => Self::Partial,
            _ => Self::Full,
        };
        Ok(mode)
    }
}
