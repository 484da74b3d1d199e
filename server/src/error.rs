use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use diesel::r2d2;
use foodgram_core::error::REQUIRED;
use foodgram_core::{FieldErrors, PaginationError, ValidationError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_path_to_error::Segment;
use thiserror::Error;
use utoipa::ToSchema;

/// Key for errors that don't belong to a single request field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Body of 401/403/404/500 responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Body of a rejected relationship toggle.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConflictResponse {
    pub errors: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(FieldErrors),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation(FieldErrors::single(field, message))
    }

    pub fn non_field(message: impl Into<String>) -> Self {
        Self::field(NON_FIELD_ERRORS, message)
    }

    pub fn not_authenticated() -> Self {
        ApiError::Unauthorized("Authentication credentials were not provided.".to_string())
    }

    pub fn not_found() -> Self {
        ApiError::NotFound("Not found.".to_string())
    }

    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        ApiError::Internal(format!("{context}: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = |status: StatusCode, detail: String| {
            (status, Json(ErrorResponse { detail })).into_response()
        };

        match self {
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            ApiError::Conflict(errors) => {
                (StatusCode::BAD_REQUEST, Json(ConflictResponse { errors })).into_response()
            }
            ApiError::Unauthorized(message) => detail(StatusCode::UNAUTHORIZED, message),
            e @ ApiError::Forbidden => detail(StatusCode::FORBIDDEN, e.to_string()),
            ApiError::NotFound(message) => detail(StatusCode::NOT_FOUND, message),
            ApiError::Internal(cause) => {
                tracing::error!("{}", cause);
                detail(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.0)
    }
}

impl From<PaginationError> for ApiError {
    fn from(err: PaginationError) -> Self {
        ApiError::NotFound(err.to_string())
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => ApiError::not_found(),
            e => ApiError::internal("Database error", e),
        }
    }
}

impl From<r2d2::PoolError> for ApiError {
    fn from(err: r2d2::PoolError) -> Self {
        ApiError::internal("Database connection failed", err)
    }
}

/// `Json` that reports malformed bodies as a 400 with field-style errors.
///
/// Syntax errors land under `non_field_errors`. A value of the wrong type is
/// reported under the top-level key it was sent as.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !has_json_content_type(req.headers()) {
            return Err(ApiError::non_field(
                "Expected request with `Content-Type: application/json`",
            ));
        }
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::non_field(rejection.body_text()))?;
        let value: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| ApiError::non_field(format!("JSON parse error - {e}")))?;
        from_value(value).map(ValidJson)
    }
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Deserialize an already parsed body, keying type errors by the field that
/// carried the bad value.
pub fn from_value<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, ApiError> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let field = err.path().iter().find_map(|segment| match segment {
            Segment::Map { key } => Some(key.clone()),
            _ => None,
        });
        let message = field_message(&err.inner().to_string());
        match field {
            Some(field) => ApiError::field(&field, message),
            None => ApiError::non_field("Invalid data. Expected a dictionary."),
        }
    })
}

const INTEGER_TYPES: [&str; 8] = ["i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64"];

/// Replace serde's type-mismatch wording with a message fit for clients.
fn field_message(raw: &str) -> String {
    if raw.starts_with("missing field") {
        return REQUIRED.to_string();
    }
    if !(raw.starts_with("invalid type") || raw.starts_with("invalid value")) {
        return raw.to_string();
    }
    let expected = raw.rsplit_once(", expected ").map_or("", |(_, e)| e);
    if expected.contains("integer") || INTEGER_TYPES.contains(&expected) {
        "A valid integer is required.".to_string()
    } else if expected.contains("string") {
        "Not a valid string.".to_string()
    } else if expected.contains("sequence") {
        "Expected a list of items.".to_string()
    } else if expected.contains("map") || expected.starts_with("struct") {
        "Invalid data. Expected a dictionary.".to_string()
    } else {
        "Invalid value.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Body {
        name: Option<String>,
        #[serde(default, deserialize_with = "crate::api::lenient::optional_integer")]
        cooking_time: Option<i64>,
        items: Option<Vec<Item>>,
    }

    #[derive(Debug, Deserialize)]
    struct Item {
        #[allow(dead_code)]
        id: i32,
    }

    fn field_errors(err: ApiError) -> FieldErrors {
        match err {
            ApiError::Validation(fields) => fields,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::field("name", "bad"), StatusCode::BAD_REQUEST),
            (ApiError::Conflict("dup".into()), StatusCode::BAD_REQUEST),
            (ApiError::not_authenticated(), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden, StatusCode::FORBIDDEN),
            (ApiError::not_found(), StatusCode::NOT_FOUND),
            (
                ApiError::internal("boom", "disk full"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_diesel_not_found_maps_to_404() {
        let err: ApiError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
        let err: ApiError = diesel::result::Error::RollbackTransaction.into();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn test_invalid_page_is_404() {
        let err: ApiError = PaginationError::InvalidPage.into();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Invalid page."));
    }

    #[test]
    fn test_validation_error_keeps_fields() {
        let err: ApiError = ValidationError::single("email", "taken").into();
        match err {
            ApiError::Validation(fields) => {
                assert_eq!(fields.get("email"), Some(&["taken".to_string()][..]))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_type_errors_are_keyed_by_field() {
        let err = from_value::<Body>(json!({"cooking_time": "abc"})).unwrap_err();
        let fields = field_errors(err);
        assert_eq!(
            fields.get("cooking_time"),
            Some(&["A valid integer is required.".to_string()][..])
        );
        assert!(!fields.contains(NON_FIELD_ERRORS));

        let fields = field_errors(from_value::<Body>(json!({"name": 5})).unwrap_err());
        assert_eq!(fields.get("name"), Some(&["Not a valid string.".to_string()][..]));
    }

    #[test]
    fn test_nested_errors_use_top_level_key() {
        let fields =
            field_errors(from_value::<Body>(json!({"items": [{"id": "x"}]})).unwrap_err());
        assert!(fields.contains("items"));

        let fields = field_errors(from_value::<Body>(json!({"items": [{}]})).unwrap_err());
        assert_eq!(fields.get("items"), Some(&[REQUIRED.to_string()][..]));
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let body = from_value::<Body>(json!({"cooking_time": "20"})).unwrap();
        assert_eq!(body.cooking_time, Some(20));
    }

    #[test]
    fn test_non_object_body() {
        let fields = field_errors(from_value::<Body>(json!([1, 2])).unwrap_err());
        assert!(fields.contains(NON_FIELD_ERRORS));
    }

    #[test]
    fn test_json_content_type() {
        let mut headers = HeaderMap::new();
        assert!(!has_json_content_type(&headers));
        headers.insert(
            header::CONTENT_TYPE,
            "application/json; charset=utf-8".parse().unwrap(),
        );
        assert!(has_json_content_type(&headers));
        headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
        assert!(!has_json_content_type(&headers));
    }
}
