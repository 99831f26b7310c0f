/// OpenAPI documentation for Post Service
use crate::handlers::posts;
use crate::models::{Post, PostTitle};
use actix_web::HttpResponse;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Post Service API",
        version = "1.0.0",
        description = "Blog post resource: paginated listing, creation with an image upload, title lookup, update with optional image replacement, and deletion of a post together with its stored image.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development server"),
    ),
    paths(
        posts::list_posts,
        posts::create_post,
        posts::get_post,
        posts::update_post,
        posts::delete_post,
    ),
    components(schemas(Post, PostTitle)),
    tags(
        (name = "posts", description = "Post creation, retrieval, updates, and deletion"),
    ),
)]
pub struct ApiDoc;

impl ApiDoc {
    pub fn openapi_json_path() -> &'static str {
        "/api/openapi.json"
    }
}

/// Serve the generated document as JSON
pub async fn openapi_json() -> actix_web::Result<HttpResponse> {
    let body = serde_json::to_string(&ApiDoc::openapi()).map_err(|e| {
        tracing::error!("OpenAPI serialization failed: {}", e);
        actix_web::error::ErrorInternalServerError("OpenAPI serialization error")
    })?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}
