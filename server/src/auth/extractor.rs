use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::User;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use std::sync::Arc;

use super::db::get_user_from_token;

/// Extractor that validates the Authorization header and provides the authenticated user.
///
/// Use this in any handler that requires authentication:
/// ```ignore
/// async fn my_handler(AuthUser(user): AuthUser) -> impl IntoResponse {
///     // user is the authenticated User
/// }
/// ```
pub struct AuthUser(pub User);

/// Like [`AuthUser`], for endpoints that are also open to anonymous callers.
///
/// A missing header yields `None`; a header carrying a bad token is still
/// rejected with 401.
pub struct OptionalUser(pub Option<User>);

#[derive(Debug, PartialEq, Eq)]
pub enum AuthHeader<'a> {
    Missing,
    Malformed,
    Token(&'a str),
}

/// Read `Authorization: Token <t>` or `Authorization: Bearer <t>`.
pub fn parse_authorization(headers: &HeaderMap) -> AuthHeader<'_> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return AuthHeader::Missing;
    };
    let Ok(value) = value.to_str() else {
        return AuthHeader::Malformed;
    };

    let token = value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))
        .map(str::trim);

    match token {
        Some(t) if !t.is_empty() && !t.contains(' ') => AuthHeader::Token(t),
        _ => AuthHeader::Malformed,
    }
}

fn lookup(pool: &DbPool, token: &str) -> Result<User, ApiError> {
    let mut conn = pool.get()?;
    get_user_from_token(&mut conn, token)?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token.".to_string()))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = Arc::<DbPool>::from_ref(state);

        match parse_authorization(&parts.headers) {
            AuthHeader::Missing => Err(ApiError::not_authenticated()),
            AuthHeader::Malformed => Err(ApiError::Unauthorized(
                "Invalid token header.".to_string(),
            )),
            AuthHeader::Token(token) => lookup(&pool, token).map(AuthUser),
        }
    }
}

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = Arc::<DbPool>::from_ref(state);

        match parse_authorization(&parts.headers) {
            AuthHeader::Missing => Ok(OptionalUser(None)),
            AuthHeader::Malformed => Err(ApiError::Unauthorized(
                "Invalid token header.".to_string(),
            )),
            AuthHeader::Token(token) => lookup(&pool, token).map(|u| OptionalUser(Some(u))),
        }
    }
}

impl OptionalUser {
    pub fn id(&self) -> Option<i32> {
        self.0.as_ref().map(|u| u.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_token_and_bearer_schemes() {
        assert_eq!(
            parse_authorization(&headers("Token abc123")),
            AuthHeader::Token("abc123")
        );
        assert_eq!(
            parse_authorization(&headers("Bearer abc123")),
            AuthHeader::Token("abc123")
        );
    }

    #[test]
    fn test_missing_and_malformed() {
        assert_eq!(parse_authorization(&HeaderMap::new()), AuthHeader::Missing);
        assert_eq!(parse_authorization(&headers("Basic abc")), AuthHeader::Malformed);
        assert_eq!(parse_authorization(&headers("Token ")), AuthHeader::Malformed);
        assert_eq!(parse_authorization(&headers("Token a b")), AuthHeader::Malformed);
        assert_eq!(parse_authorization(&headers("abc123")), AuthHeader::Malformed);
    }
}
