//! Page-number pagination envelope and the request URL it links from.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{header, request::Parts},
};
use foodgram_core::{PageMeta, PageRequest, PageSettings};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;

/// One page of a listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct Paginated<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(meta: PageMeta, results: Vec<T>) -> Self {
        Self {
            count: meta.count,
            next: meta.next,
            previous: meta.previous,
            results,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageParams {
    /// Page number, 1-based
    pub page: Option<String>,
    /// Page size (default 6, max 50)
    pub limit: Option<String>,
}

impl PageParams {
    pub fn request(&self, settings: &PageSettings) -> Result<PageRequest, ApiError> {
        Ok(PageRequest::parse(
            self.page.as_deref(),
            self.limit.as_deref(),
            settings,
        )?)
    }
}

/// Absolute URL of the current request, used to build `next`/`previous`.
///
/// The host comes from the `Host` header and the scheme from
/// `X-Forwarded-Proto` when a proxy sets it.
pub struct RequestUrl(pub Url);

impl<S> FromRequestParts<S> for RequestUrl
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| &original.0)
            .unwrap_or(&parts.uri);
        let path_and_query = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");

        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("localhost");
        let scheme = match parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|h| h.to_str().ok())
        {
            Some("https") => "https",
            _ => "http",
        };

        Url::parse(&format!("{scheme}://{host}{path_and_query}"))
            .map(RequestUrl)
            .map_err(|e| ApiError::non_field(format!("Invalid request URL: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Url, ApiError> {
        let (mut parts, _) = request.into_parts();
        RequestUrl::from_request_parts(&mut parts, &()).await.map(|u| u.0)
    }

    #[tokio::test]
    async fn test_url_from_host_header() {
        let request = Request::builder()
            .uri("/api/users/?page=2")
            .header(header::HOST, "testserver")
            .body(())
            .unwrap();
        let url = extract(request).await.unwrap();
        assert_eq!(url.as_str(), "http://testserver/api/users/?page=2");
    }

    #[tokio::test]
    async fn test_forwarded_https() {
        let request = Request::builder()
            .uri("/api/recipes/")
            .header(header::HOST, "foodgram.example.org")
            .header("x-forwarded-proto", "https")
            .body(())
            .unwrap();
        let url = extract(request).await.unwrap();
        assert_eq!(url.as_str(), "https://foodgram.example.org/api/recipes/");
    }

    #[test]
    fn test_bad_page_param() {
        let params = PageParams {
            page: Some("x".to_string()),
            limit: None,
        };
        assert!(matches!(
            params.request(&PageSettings::default()),
            Err(ApiError::NotFound(_))
        ));
    }
}
