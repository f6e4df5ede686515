use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod service;
pub mod state;
pub mod views;

#[cfg(test)]
mod testing;

pub use service::ArticleService;
pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    let controller = Router::new()
        .route("/health", get(handlers::controller_health))
        .route("/crawl/overview-page/start", post(handlers::trigger_crawl_now))
        .route(
            "/crawl/single/article/start",
            post(handlers::trigger_single_article_crawl),
        )
        .route(
            "/get/crawler/schedule/interval",
            get(handlers::get_schedule_interval),
        )
        .route(
            "/change/crawler/schedule/interval",
            put(handlers::change_schedule_interval),
        )
        .route("/get/crawler/status", get(handlers::get_scheduler_status))
        .route("/crawler/scheduler/enable", post(handlers::enable_scheduler))
        .route("/crawler/scheduler/disable", post(handlers::disable_scheduler));

    let explorer = Router::new()
        .route("/health", get(handlers::explorer_health))
        .route("/articles", get(handlers::list_articles))
        .route("/articles/:article_detail_id", get(handlers::get_article_detail))
        .route("/search", get(handlers::search_articles));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/controller", controller)
        .nest("/explorer", explorer)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::{create_app, AppState, ArticleService};
    pub use at_core::{Error, Result};
}
