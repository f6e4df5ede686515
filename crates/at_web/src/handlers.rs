use crate::views::{ArticleDetailView, ArticleView, IntervalView, MessageView};
use crate::AppState;
use at_core::Error;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Deserialize)]
pub struct ArticleQuery {
    pub article_url: String,
}

#[derive(Debug, Deserialize)]
pub struct IntervalQuery {
    pub minutes: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
}

fn reply(status: StatusCode, body: MessageView) -> Response {
    (status, Json(body)).into_response()
}

fn internal_error(context: &str, e: &Error, message: &str) -> Response {
    error!("❌ {}: {}", context, e);
    reply(StatusCode::INTERNAL_SERVER_ERROR, MessageView::error(message))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    match state.service.health().await {
        Ok(()) => (StatusCode::OK, Json("Yay, the API is healthy")).into_response(),
        Err(e) => {
            error!("❌ Health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Oops, the API is down or not responding!"),
            )
                .into_response()
        }
    }
}

pub async fn controller_health() -> impl IntoResponse {
    Json("controller api is healthy")
}

pub async fn explorer_health() -> impl IntoResponse {
    Json("explore api is healthy")
}

pub async fn trigger_crawl_now(State(state): State<Arc<AppState>>) -> Response {
    if state.service.trigger_full_crawl_now() {
        reply(
            StatusCode::OK,
            MessageView::success("Crawler successfully triggered for the overview page."),
        )
    } else {
        reply(StatusCode::BAD_REQUEST, MessageView::error("Crawl job not found"))
    }
}

pub async fn trigger_single_article_crawl(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ArticleQuery>,
) -> Response {
    match state
        .service
        .trigger_single_article_crawl(&query.article_url)
        .await
    {
        Ok(_) => reply(
            StatusCode::OK,
            MessageView::success("Crawling started for the specified article."),
        ),
        Err(Error::ArticleNotFound(_)) => {
            reply(StatusCode::BAD_REQUEST, MessageView::error("Article not found"))
        }
        Err(e) => internal_error(
            &format!("Crawl of {} failed", query.article_url),
            &e,
            "An internal error occurred while starting the crawl.",
        ),
    }
}

pub async fn get_schedule_interval(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(IntervalView::minutes(
        state.service.get_current_scheduler_interval(),
    ))
}

pub async fn change_schedule_interval(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IntervalQuery>,
) -> Response {
    let minutes = query.minutes;
    match state.service.change_scheduler_interval(minutes) {
        Ok(true) => reply(
            StatusCode::OK,
            MessageView::success(format!("Interval updated to {} minutes.", minutes)),
        ),
        Ok(false) => reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            MessageView::error("Failed to update interval"),
        ),
        Err(e) if e.is_client_error() => reply(
            StatusCode::BAD_REQUEST,
            MessageView::error("Interval must be at least 1 minute"),
        ),
        Err(e) => internal_error(
            "Updating scheduler interval failed",
            &e,
            "An internal error occurred while updating the interval.",
        ),
    }
}

pub async fn get_scheduler_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.get_scheduler_status())
}

pub async fn enable_scheduler(State(state): State<Arc<AppState>>) -> Response {
    if state.service.enable_scheduler() {
        reply(StatusCode::OK, MessageView::success("Crawler scheduler enabled."))
    } else {
        reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            MessageView::error("Failed to enable the crawler scheduler."),
        )
    }
}

pub async fn disable_scheduler(State(state): State<Arc<AppState>>) -> Response {
    if state.service.disable_scheduler() {
        reply(StatusCode::OK, MessageView::success("Crawler scheduler disabled."))
    } else {
        reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            MessageView::error("Failed to disable the crawler scheduler."),
        )
    }
}

pub async fn list_articles(State(state): State<Arc<AppState>>) -> Response {
    match state.service.retrieve_all_articles().await {
        Ok(articles) => {
            Json(articles.iter().map(ArticleView::from).collect::<Vec<_>>()).into_response()
        }
        Err(e) => internal_error(
            "Listing articles failed",
            &e,
            "An internal error occurred while retrieving the articles.",
        ),
    }
}

pub async fn get_article_detail(
    State(state): State<Arc<AppState>>,
    Path(article_detail_id): Path<i64>,
) -> Response {
    match state.service.retrieve_article_detail(article_detail_id).await {
        Ok(Some(detail)) => Json(ArticleDetailView::from(&detail)).into_response(),
        Ok(None) => reply(
            StatusCode::NOT_FOUND,
            MessageView::error("Article detail not found"),
        ),
        Err(e) => internal_error(
            "Loading article detail failed",
            &e,
            "An internal error occurred while retrieving the article.",
        ),
    }
}

pub async fn search_articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match state.service.search_articles_by_keyword(&query.keyword).await {
        Ok(details) => {
            let views: Vec<_> = details.iter().map(ArticleDetailView::from).collect();
            Json(views).into_response()
        }
        Err(e) => internal_error(
            "Search failed",
            &e,
            "An internal error occurred while searching the articles.",
        ),
    }
}
