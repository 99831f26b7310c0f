/// Post handlers - HTTP endpoints for the post resource
use crate::error::{AppError, Result};
use crate::handlers::form::read_post_form;
use crate::models::{ApiResponse, MessageResponse, Paginator, Post, PostForm, PostTitle};
use crate::services::posts::{MSG_DELETE_NOT_FOUND, MSG_POST_NOT_FOUND, MSG_UNKNOWN_ID};
use crate::services::PostService;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
}

/// 1-based page number; anything missing or unparsable is page 1
fn page_number(query: &ListQuery) -> u64 {
    query
        .page
        .as_deref()
        .and_then(|p| p.trim().parse::<u64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

/// Route ids are matched leniently: a non-numeric id is simply unknown
fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Absolute URL of the current request without its query string
fn request_url(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}{}", info.scheme(), info.host(), req.path())
}

/// List posts, newest first, five per page
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(("page" = Option<u64>, Query, description = "1-based page number")),
    responses(
        (status = 200, description = "Paginated posts"),
        (status = 500, description = "Server error"),
    )
)]
pub async fn list_posts(
    service: web::Data<PostService>,
    req: HttpRequest,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let page = service.list(page_number(&query)).await?;
    let paginator = Paginator::from_page(page, &request_url(&req));

    Ok(HttpResponse::Ok().json(ApiResponse::success("List Data Posts", paginator)))
}

/// Create a post from a multipart body with `image`, `title` and `content`
#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 413, description = "Upload part too large"),
        (status = 422, description = "Validation failed"),
    )
)]
pub async fn create_post(service: web::Data<PostService>, form: PostForm) -> Result<HttpResponse> {
    let post = service.create(form).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        "Data Post Berhasil Ditambahkan!",
        post,
    )))
}

/// Title of a single post
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post found", body = PostTitle),
        (status = 404, description = "Post not found"),
    )
)]
pub async fn get_post(service: web::Data<PostService>, id: web::Path<String>) -> Result<HttpResponse> {
    let id = parse_id(&id).ok_or_else(|| AppError::NotFound(MSG_POST_NOT_FOUND.to_string()))?;
    let title = service.get(id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Data Post Ditemukan!", title)))
}

/// Update title/content and optionally replace the image
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post updated", body = Post),
        (status = 404, description = "Unknown id"),
        (status = 422, description = "Validation failed"),
    )
)]
pub async fn update_post(
    service: web::Data<PostService>,
    req: HttpRequest,
    id: web::Path<String>,
    payload: web::Payload,
) -> actix_web::Result<HttpResponse> {
    let id = parse_id(&id).ok_or_else(|| AppError::UnknownId(MSG_UNKNOWN_ID.to_string()))?;
    // Unknown ids answer 404 before the body is read
    let current = service.find_for_update(id).await?;
    let form = read_post_form(&req, &mut payload.into_inner()).await?;
    let post = service.apply_update(current, form).await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Data Post Berhasil Diubah!".to_string(),
        data: post,
    }))
}

/// Delete a post and its stored image
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 404, description = "Post not found"),
    )
)]
pub async fn delete_post(service: web::Data<PostService>, id: web::Path<String>) -> Result<HttpResponse> {
    let id = parse_id(&id).ok_or_else(|| AppError::UnknownId(MSG_DELETE_NOT_FOUND.to_string()))?;
    let post = service.find_for_delete(id).await?;
    service.delete(&post).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::<Post>::empty("Data Post Berhasil Dihapus!")))
}
