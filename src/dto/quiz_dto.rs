use crate::models::quiz_question::{AnswerView, QuizQuestion};
use crate::services::completion_service::{GenerationOutput, QuizSource};
use crate::services::quiz_extractor::DEFAULT_QUESTION_COUNT;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct GenerateQuestionPayload {
    /// Source text; the configured script file is used when absent.
    #[validate(length(min = 1))]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ExtractCompletionPayload {
    #[validate(length(min = 1))]
    pub content: String,
}

#[derive(Debug, Validate)]
pub struct UploadOptions {
    #[validate(range(min = 1, max = 50))]
    pub num_questions: usize,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            num_questions: DEFAULT_QUESTION_COUNT,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuizBatchResponse {
    pub questions: Vec<QuizQuestion>,
    pub count: usize,
    pub source: QuizSource,
    pub generated_at: DateTime<Utc>,
}

impl From<GenerationOutput> for QuizBatchResponse {
    fn from(output: GenerationOutput) -> Self {
        Self {
            count: output.questions.len(),
            questions: output.questions,
            source: output.source,
            generated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExtractedQuestionResponse {
    #[serde(flatten)]
    pub question: QuizQuestion,
    pub view: AnswerView,
}

impl From<QuizQuestion> for ExtractedQuestionResponse {
    fn from(question: QuizQuestion) -> Self {
        let view = question.answer_view();
        Self { question, view }
    }
}
