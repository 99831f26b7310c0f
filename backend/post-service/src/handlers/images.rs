/// Public image handler - serves stored post images
use crate::error::{AppError, Result};
use crate::services::PostService;
use crate::storage::{content_type_for, is_safe_name};
use actix_web::http::header;
use actix_web::{web, HttpResponse};

const MSG_IMAGE_NOT_FOUND: &str = "Image not found";

/// Bytes of `posts/{name}` with a content type taken from the extension
pub async fn serve_image(service: web::Data<PostService>, name: web::Path<String>) -> Result<HttpResponse> {
    let name = name.into_inner();
    if !is_safe_name(&name) {
        return Err(AppError::NotFound(MSG_IMAGE_NOT_FOUND.to_string()));
    }

    let bytes = service
        .image(&name)
        .await?
        .ok_or_else(|| AppError::NotFound(MSG_IMAGE_NOT_FOUND.to_string()))?;

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&name))
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .body(bytes))
}
