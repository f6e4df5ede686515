use crate::service::ArticleService;
use std::sync::Arc;

pub struct AppState {
    pub service: Arc<ArticleService>,
}
