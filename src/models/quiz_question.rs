use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use uuid::Uuid;

/// Shown by clients when a question carries no answer text at all.
pub const NO_OPTIONS_PLACEHOLDER: &str = "No options provided";

fn option_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-D][).]").expect("option line pattern is valid"))
}

/// A single flashcard. Built only by the extraction pipeline and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizQuestion {
    id: Uuid,
    question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
}

impl QuizQuestion {
    pub(crate) fn new(question: impl Into<String>, answer: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            answer,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// How a card's back side should be rendered.
    pub fn answer_view(&self) -> AnswerView {
        match self.answer.as_deref() {
            None | Some("") => AnswerView::Missing,
            Some(answer) if answer.contains('\n') => AnswerView::Options(
                answer.lines().filter_map(AnswerOption::parse).collect(),
            ),
            Some(answer) => AnswerView::Plain(answer.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOption {
    /// Label exactly as written in the source, e.g. `A)` or `C.`.
    pub label: String,
    pub text: String,
}

impl AnswerOption {
    /// Lines that are not lettered options are noise and yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if !option_line().is_match(line) {
            return None;
        }
        // The label is two ASCII bytes, so splitting here is on a char boundary.
        let (label, text) = line.split_at(2);
        Some(Self {
            label: label.to_string(),
            text: text.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerView {
    Options(Vec<AnswerOption>),
    Plain(String),
    Missing,
}

impl AnswerView {
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            AnswerView::Missing => Some(NO_OPTIONS_PLACEHOLDER),
            _ => None,
        }
    }
}
