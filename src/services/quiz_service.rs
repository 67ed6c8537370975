use crate::error::{Error, Result};
use crate::models::quiz_question::QuizQuestion;
use crate::services::completion_service::{CompletionService, GenerationOutput, QuizSource};
use crate::services::document_service::{DocumentKind, DocumentParser};
use crate::services::quiz_extractor::{extract_from_completion, generate_fallback_questions};
use bytes::Bytes;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;

/// Wires document parsing, completion and extraction into the two
/// client flows: document upload and single-question generation.
#[derive(Clone)]
pub struct QuizService {
    completion: CompletionService,
    parser: Arc<dyn DocumentParser>,
    script_path: PathBuf,
}

impl QuizService {
    pub fn new(
        completion: CompletionService,
        parser: Arc<dyn DocumentParser>,
        script_path: PathBuf,
    ) -> Self {
        Self {
            completion,
            parser,
            script_path,
        }
    }

    pub fn ai_enabled(&self) -> bool {
        self.completion.is_enabled()
    }

    /// Upload flow: heuristic cards only, parse failures surface.
    pub async fn questions_from_document(
        &self,
        filename: &str,
        data: Bytes,
        count: usize,
    ) -> Result<GenerationOutput> {
        let kind = DocumentKind::from_filename(filename)?;
        let parser = Arc::clone(&self.parser);

        let text = tokio::task::spawn_blocking(move || parser.extract_text(kind, &data))
            .await
            .map_err(|e| Error::Internal(format!("Document parsing task failed: {}", e)))??;

        tracing::info!(
            filename,
            ?kind,
            chars = text.chars().count(),
            "Extracted document text"
        );

        let mut rng = StdRng::from_entropy();
        Ok(GenerationOutput {
            questions: generate_fallback_questions(&text, count, &mut rng),
            source: QuizSource::Fallback,
        })
    }

    /// Single-question flow. Keeps only the first card, like the client.
    pub async fn question_from_text(&self, text: &str) -> Result<GenerationOutput> {
        let output = self.completion.generate_quiz(text).await;
        let first = output.questions.into_iter().next().ok_or(Error::NoQuestions)?;

        Ok(GenerationOutput {
            questions: vec![first],
            source: output.source,
        })
    }

    pub async fn question_from_script(&self) -> Result<GenerationOutput> {
        let script = tokio::fs::read_to_string(&self.script_path)
            .await
            .map_err(|e| {
                tracing::error!("Failed to read script {:?}: {}", self.script_path, e);
                Error::NotFound(format!("Failed to load script: {}", e))
            })?;

        self.question_from_text(&script).await
    }

    pub fn extract_completion(&self, content: &str) -> QuizQuestion {
        extract_from_completion(content)
    }
}
