pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::services::{
    completion_service::CompletionService, document_service::FileDocumentParser,
    quiz_service::QuizService,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use reqwest::Client;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: QuizService,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config) -> error::Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()?;

        let completion_service = CompletionService::new(config.completion.clone(), http_client);
        let quiz_service = QuizService::new(
            completion_service,
            Arc::new(FileDocumentParser),
            config.script_path.clone(),
        );

        Ok(Self {
            quiz_service,
            max_upload_bytes: config.max_upload_bytes(),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    let quiz_api = Router::new()
        .route("/api/quiz/generate", post(routes::quiz::generate_question))
        .route("/api/quiz/upload", post(routes::quiz::upload_document))
        .route("/api/quiz/extract", post(routes::quiz::extract_completion));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(quiz_api)
        .with_state(state)
        .layer(middleware::cors::quiz_client_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
}
