/// Route table for post-service
///
/// Shared by `main` and the HTTP tests so both serve the same surface.
use crate::handlers;
use crate::metrics::serve_metrics;
use crate::middleware::MetricsMiddleware;
use crate::openapi::{openapi_json, ApiDoc};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(serve_metrics))
        .route(ApiDoc::openapi_json_path(), web::get().to(openapi_json))
        // Health check endpoints
        .route("/api/health", web::get().to(handlers::health_summary))
        .route("/api/health/ready", web::get().to(handlers::readiness_summary))
        .route("/api/health/live", web::get().to(handlers::liveness_check))
        .service(
            web::scope("/storage/posts")
                .wrap(MetricsMiddleware)
                .route("/{name}", web::get().to(handlers::serve_image)),
        )
        .service(
            web::scope("/api/posts")
                .wrap(MetricsMiddleware)
                .service(
                    web::resource("")
                        .route(web::get().to(handlers::list_posts))
                        .route(web::post().to(handlers::create_post)),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(handlers::get_post))
                        .route(web::put().to(handlers::update_post))
                        .route(web::patch().to(handlers::update_post))
                        .route(web::post().to(handlers::update_post))
                        .route(web::delete().to(handlers::delete_post)),
                ),
        );
}
