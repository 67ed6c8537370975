//! Text -> `QuizQuestion` extraction.
//!
//! Two entry points: [`extract_from_completion`] turns one LLM completion
//! into one card, [`generate_fallback_questions`] samples sentences from
//! arbitrary text when no model is available. Neither fails; degenerate
//! input yields emptier output.

use crate::models::quiz_question::QuizQuestion;
use rand::Rng;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

pub const DEFAULT_QUESTION_COUNT: usize = 10;
pub const NO_ANSWER_PLACEHOLDER: &str = "No answer provided";
pub const FALLBACK_ANSWER: &str =
    "The answer would be generated using AI or provided by the user.";

const MIN_SENTENCE_CHARS: usize = 20;
const MAX_SENTENCE_CHARS: usize = 200;

macro_rules! cached_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("static pattern is valid"))
        }
    };
}

cached_regex!(lettered_run, r"\n\s*[A-D][).]\s.+(?:\n\s*[A-D][).]\s.+)*");
cached_regex!(numbered_run, r"\n\s*[1-4][).]\s.+(?:\n\s*[1-4][).]\s.+)*");
cached_regex!(q_prefix, r"^Q(?:\.\s*|\s+)");
cached_regex!(question_label, r"(?i)^question:?\s*");
cached_regex!(enumeration_prefix, r"^Q?\d+\.\s*");
cached_regex!(sentence_break, r"[.!?]\s+");

/// Matchers tried in fixed priority by [`split_completion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    LetteredOptions,
    NumberedOptions,
    QuestionMark,
    WholeText,
}

impl SplitStrategy {
    pub const PRIORITY: [SplitStrategy; 4] = [
        SplitStrategy::LetteredOptions,
        SplitStrategy::NumberedOptions,
        SplitStrategy::QuestionMark,
        SplitStrategy::WholeText,
    ];

    /// `None` means this matcher does not apply and the next one should run.
    pub fn apply(self, text: &str) -> Option<Split<'_>> {
        match self {
            SplitStrategy::LetteredOptions => split_at_run(self, lettered_run(), text),
            SplitStrategy::NumberedOptions => split_at_run(self, numbered_run(), text),
            SplitStrategy::QuestionMark => {
                let idx = text.find('?').filter(|&i| i > 0)?;
                let (question, answer) = text.split_at(idx + 1);
                Some(Split {
                    strategy: self,
                    question: question.trim(),
                    answer: answer.trim(),
                })
            }
            SplitStrategy::WholeText => Some(Split {
                strategy: self,
                question: text,
                answer: "",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    pub strategy: SplitStrategy,
    pub question: &'a str,
    pub answer: &'a str,
}

fn split_at_run<'a>(strategy: SplitStrategy, pattern: &Regex, text: &'a str) -> Option<Split<'a>> {
    let run = pattern.find(text).filter(|m| m.start() > 0)?;
    Some(Split {
        strategy,
        question: text[..run.start()].trim(),
        answer: run.as_str().trim(),
    })
}

/// Splits a completion into question and options text. The input is
/// trimmed first; the first matching strategy wins.
pub fn split_completion(content: &str) -> Split<'_> {
    let text = content.trim();
    SplitStrategy::PRIORITY
        .iter()
        .find_map(|strategy| strategy.apply(text))
        .unwrap_or(Split {
            strategy: SplitStrategy::WholeText,
            question: text,
            answer: "",
        })
}

/// Removes `Q.` / `Q `, `Question:` and `1.` / `Q1.` style prefixes, in that order.
pub fn strip_question_prefixes(question: &str) -> String {
    let question = q_prefix().replace(question, "");
    let question = question_label().replace(&question, "");
    enumeration_prefix().replace(&question, "").into_owned()
}

/// Builds exactly one card from a raw completion.
pub fn extract_from_completion(content: &str) -> QuizQuestion {
    let split = split_completion(content);
    tracing::debug!(strategy = ?split.strategy, "split completion text");

    let answer = if split.answer.is_empty() {
        NO_ANSWER_PLACEHOLDER.to_string()
    } else {
        split.answer.to_string()
    };

    QuizQuestion::new(strip_question_prefixes(split.question), Some(answer))
}

/// Trimmed sentences whose length is strictly between 20 and 200 chars.
pub fn qualifying_sentences(text: &str) -> Vec<&str> {
    sentence_break()
        .split(text)
        .map(str::trim)
        .filter(|s| {
            let len = s.chars().count();
            len > MIN_SENTENCE_CHARS && len < MAX_SENTENCE_CHARS
        })
        .collect()
}

/// Heuristic cards from source text with no model involved.
///
/// Picks `min(count, qualifying sentences)` distinct sentences uniformly
/// at random by reject-and-resample, so output differs between calls
/// unless `rng` is seeded. Cards are emitted in selection order.
pub fn generate_fallback_questions<R: Rng>(
    text: &str,
    count: usize,
    rng: &mut R,
) -> Vec<QuizQuestion> {
    let sentences = qualifying_sentences(text);
    let max_questions = count.min(sentences.len());

    let mut seen = HashSet::with_capacity(max_questions);
    let mut selected = Vec::with_capacity(max_questions);
    while selected.len() < max_questions {
        let idx = rng.gen_range(0..sentences.len());
        if seen.insert(idx) {
            selected.push(idx);
        }
    }

    selected
        .into_iter()
        .map(|idx| {
            QuizQuestion::new(
                format!("What does this mean: \"{}\"?", sentences[idx]),
                Some(FALLBACK_ANSWER.to_string()),
            )
        })
        .collect()
}
