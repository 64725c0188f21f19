//! HTTP handlers and route configuration.

mod health;
mod posts;

use actix_web::web;

/// Largest accepted image upload.
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/public/blogs/{blog_id}/posts")
                    .route("", web::get().to(posts::list_published))
                    .route("/{slug}", web::get().to(posts::get_published)),
            )
            // Authenticated routes
            .service(
                web::scope("/v1")
                    .service(
                        web::resource("/blogs/{blog_id}/posts")
                            .route(web::get().to(posts::list_posts))
                            .route(web::post().to(posts::create_post)),
                    )
                    .service(
                        web::scope("/posts/{id}")
                            .route("", web::get().to(posts::get_post))
                            .route("", web::patch().to(posts::update_post))
                            .route("", web::delete().to(posts::delete_post))
                            .service(
                                web::resource("/image")
                                    .app_data(web::PayloadConfig::new(MAX_IMAGE_BYTES))
                                    .route(web::put().to(posts::upload_image)),
                            )
                            .route("/markdown", web::get().to(posts::get_markdown))
                            .route("/export", web::post().to(posts::export_markdown)),
                    ),
            ),
    );
}
