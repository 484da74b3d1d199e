//! Bodies that arrive either as JSON or as `multipart/form-data`.

use std::collections::HashMap;

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header;
use foodgram_core::ImagePayload;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{from_value, ApiError, ValidJson};

/// Form fields whose text is itself JSON.
const JSON_FIELDS: [&str; 1] = ["ingredients"];

/// A request body plus the raw bytes of any file parts, keyed by field name.
///
/// JSON bodies never carry files. In a multipart body every text part becomes
/// a string value, except [`JSON_FIELDS`], which are parsed as JSON.
pub struct FormOrJson<T> {
    pub body: T,
    pub files: HashMap<String, Vec<u8>>,
}

impl<T> FormOrJson<T> {
    /// The image sent as `field`: an uploaded file wins over an inline string.
    pub fn image(&mut self, field: &str, inline: Option<String>) -> Option<ImagePayload> {
        match self.files.remove(field) {
            Some(data) => Some(ImagePayload::Upload(data)),
            None => inline.map(ImagePayload::Inline),
        }
    }
}

impl<S, T> FromRequest<S> for FormOrJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"));

        if !is_multipart {
            let ValidJson(body) = ValidJson::<T>::from_request(req, state).await?;
            return Ok(FormOrJson {
                body,
                files: HashMap::new(),
            });
        }

        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::non_field(rejection.body_text()))?;
        let (fields, files) = read_parts(multipart).await?;
        Ok(FormOrJson {
            body: from_value(Value::Object(fields))?,
            files,
        })
    }
}

async fn read_parts(
    mut multipart: Multipart,
) -> Result<(Map<String, Value>, HashMap<String, Vec<u8>>), ApiError> {
    let mut fields = Map::new();
    let mut files = HashMap::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Multipart read error: {}", e);
                return Err(ApiError::non_field(format!(
                    "Failed to read multipart data: {}",
                    e.body_text()
                )));
            }
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if field.file_name().is_some() {
            let data = field.bytes().await.map_err(|e| {
                tracing::warn!("Field read error: {}", e);
                ApiError::field(&name, format!("Failed to read file data: {}", e.body_text()))
            })?;
            files.insert(name, data.to_vec());
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| ApiError::field(&name, e.body_text()))?;
        let value = if JSON_FIELDS.contains(&name.as_str()) {
            serde_json::from_str(&text)
                .map_err(|_| ApiError::field(&name, "Value must be valid JSON."))?
        } else {
            Value::String(text)
        };
        fields.insert(name, value);
    }

    Ok((fields, files))
}
