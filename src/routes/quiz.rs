use crate::{
    dto::quiz_dto::{
        ExtractCompletionPayload, ExtractedQuestionResponse, GenerateQuestionPayload,
        QuizBatchResponse, UploadOptions,
    },
    error::{Error, Result},
    utils::validation::validate,
    AppState,
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;

#[axum::debug_handler]
pub async fn generate_question(
    State(state): State<AppState>,
    payload: Option<Json<GenerateQuestionPayload>>,
) -> Result<impl IntoResponse> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    validate(&payload)?;

    let output = match payload.text.as_deref() {
        Some(text) => state.quiz_service.question_from_text(text).await?,
        None => state.quiz_service.question_from_script().await?,
    };

    tracing::info!(source = ?output.source, "Generated quiz question");
    Ok((StatusCode::OK, Json(QuizBatchResponse::from(output))))
}

#[axum::debug_handler]
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut options = UploadOptions::default();
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to get next field: {}", e);
        Error::BadRequest(e.to_string())
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "num_questions" => {
                let raw = field.text().await?;
                options.num_questions = raw.trim().parse().map_err(|_| {
                    Error::BadRequest(format!("num_questions must be a number, got '{}'", raw))
                })?;
            }
            "file" => {
                let filename = field.file_name().unwrap_or("upload.bin").to_string();
                let data = field.bytes().await.map_err(|e| {
                    tracing::error!("Failed to read upload bytes: {}", e);
                    Error::BadRequest("Failed to read file upload".into())
                })?;
                file = Some((filename, data));
            }
            _ => {}
        }
    }

    validate(&options)?;
    let (filename, data) = file
        .filter(|(_, data)| !data.is_empty())
        .ok_or_else(|| Error::BadRequest("Document file is required".into()))?;

    tracing::info!(%filename, bytes = data.len(), "Document upload received");
    let output = state
        .quiz_service
        .questions_from_document(&filename, data, options.num_questions)
        .await?;

    Ok((StatusCode::OK, Json(QuizBatchResponse::from(output))))
}

#[axum::debug_handler]
pub async fn extract_completion(
    State(state): State<AppState>,
    Json(payload): Json<ExtractCompletionPayload>,
) -> Result<impl IntoResponse> {
    validate(&payload)?;
    let question = state.quiz_service.extract_completion(&payload.content);
    Ok((StatusCode::OK, Json(ExtractedQuestionResponse::from(question))))
}
