use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

use crate::{auth::jwt::JwtKeys, error::ApiError};

/// The authenticated principal, placed in request extensions by [`require_auth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

impl AuthUser {
    /// Checked accessor; a route without the auth layer gets a 401 instead of a panic.
    pub fn from_parts(parts: &Parts) -> Result<Self, ApiError> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(ApiError::Unauthenticated("authentication required"))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts)
    }
}

/// Accepts `Token <jwt>` (RealWorld clients) and `Bearer <jwt>`.
pub fn token_from_headers(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(ApiError::Unauthenticated("missing Authorization header"))?;

    let (scheme, token) = auth
        .split_once(' ')
        .ok_or(ApiError::Unauthenticated("invalid Authorization header"))?;

    if !(scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer")) {
        return Err(ApiError::Unauthenticated("invalid auth scheme"));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::Unauthenticated("invalid Authorization header"));
    }
    Ok(token)
}

/// Verifies the token and stores the principal for downstream extractors.
pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = token_from_headers(req.headers())?;

    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        ApiError::Unauthenticated("invalid or expired token")
    })?;

    req.extensions_mut().insert(AuthUser(claims.id));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request as HttpRequest};

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn accepts_token_and_bearer_schemes() {
        assert_eq!(token_from_headers(&headers("Token abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(token_from_headers(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(token_from_headers(&headers("bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn rejects_missing_or_unknown_scheme() {
        assert!(token_from_headers(&HeaderMap::new()).is_err());
        assert!(token_from_headers(&headers("Basic dXNlcjpwYXNz")).is_err());
        assert!(token_from_headers(&headers("Token")).is_err());
        assert!(token_from_headers(&headers("Token   ")).is_err());
    }

    #[test]
    fn missing_principal_is_unauthenticated() {
        let (parts, _) = HttpRequest::new(()).into_parts();
        let err = AuthUser::from_parts(&parts).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[test]
    fn principal_is_read_back_from_extensions() {
        let id = Uuid::new_v4();
        let mut req = HttpRequest::new(());
        req.extensions_mut().insert(AuthUser(id));
        let (parts, _) = req.into_parts();
        assert_eq!(AuthUser::from_parts(&parts).unwrap(), AuthUser(id));
    }
}
