/// Extraction of the create/update request body into a [`PostForm`]
///
/// Accepts `multipart/form-data` (text fields plus the `image` file part),
/// `application/json` and `application/x-www-form-urlencoded`. Strings are
/// trimmed and blank values become `None`; a zero-byte file part counts as
/// no image. Every multipart part, and a whole JSON or urlencoded body, is
/// capped at `UploadConfig::max_part_bytes`.
use crate::config::UploadConfig;
use crate::error::AppError;
use crate::models::{PostForm, UploadedFile};
use actix_multipart::{Field, Multipart};
use actix_web::dev::{JsonBody, Payload, UrlEncoded};
use actix_web::{web, FromRequest, HttpMessage, HttpRequest};
use bytes::BytesMut;
use futures_util::future::LocalBoxFuture;
use futures_util::StreamExt;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Text-only body for JSON and urlencoded requests
#[derive(Debug, Default, Deserialize)]
struct TextFields {
    #[serde(default, deserialize_with = "scalar_text")]
    title: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    content: Option<String>,
}

/// Strings pass through, numbers and booleans are rendered as text, anything
/// else counts as missing
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Trimmed value, `None` when blank
fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<TextFields> for PostForm {
    fn from(fields: TextFields) -> Self {
        PostForm {
            title: normalize(fields.title),
            content: normalize(fields.content),
            image: None,
        }
    }
}

fn max_body_bytes(req: &HttpRequest) -> usize {
    req.app_data::<web::Data<UploadConfig>>()
        .map(|cfg| cfg.max_part_bytes)
        .unwrap_or_else(|| UploadConfig::default().max_part_bytes)
}

/// Parse the request body into a [`PostForm`]. Handlers that must resolve
/// the route first call this with the raw payload.
pub async fn read_post_form(req: &HttpRequest, payload: &mut Payload) -> Result<PostForm, actix_web::Error> {
    let content_type = req.content_type().to_ascii_lowercase();
    let limit = max_body_bytes(req);

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::new(req.headers(), payload.take());
        return Ok(read_multipart(multipart, limit).await?);
    }

    if content_type.starts_with("application/json") {
        let fields = JsonBody::<TextFields>::new(req, payload, None, true)
            .limit(limit)
            .await?;
        return Ok(fields.into());
    }

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let fields = UrlEncoded::<TextFields>::new(req, payload).limit(limit).await?;
        return Ok(fields.into());
    }

    // No recognised body: every field is missing
    Ok(PostForm::default())
}

impl FromRequest for PostForm {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        let mut payload = payload.take();

        Box::pin(async move { read_post_form(&req, &mut payload).await })
    }
}

async fn read_multipart(mut multipart: Multipart, max_part_bytes: usize) -> Result<PostForm, AppError> {
    let mut form = PostForm::default();

    while let Some(field) = multipart.next().await {
        let mut field =
            field.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_string);
                let content_type = field.content_type().map(|m| m.to_string());
                let bytes = read_part(&mut field, &name, max_part_bytes).await?;

                form.image = (!bytes.is_empty()).then(|| UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.freeze(),
                });
            }
            "title" | "content" => {
                let bytes = read_part(&mut field, &name, max_part_bytes).await?;
                let text = String::from_utf8(bytes.to_vec()).map_err(|_| {
                    AppError::BadRequest(format!("Field {} is not valid UTF-8", name))
                })?;

                if name == "title" {
                    form.title = normalize(Some(text));
                } else {
                    form.content = normalize(Some(text));
                }
            }
            _ => {
                tracing::debug!(field = %name, "Ignoring unknown multipart field");
            }
        }
    }

    Ok(form)
}

async fn read_part(field: &mut Field, name: &str, max_part_bytes: usize) -> Result<BytesMut, AppError> {
    let mut buf = BytesMut::new();

    while let Some(chunk) = field.next().await {
        let chunk =
            chunk.map_err(|e| AppError::BadRequest(format!("Failed to read field {}: {}", name, e)))?;

        if buf.len() + chunk.len() > max_part_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Field {} exceeds {} bytes",
                name, max_part_bytes
            )));
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf)
}
