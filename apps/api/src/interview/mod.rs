//! Interview Prep — AI quiz generation and assessment grading.
//!
//! Quiz generation is rate-limited per user and returns a validated
//! 10-question payload. Saving an assessment grades the answers and,
//! when any were wrong, asks the model for a short improvement tip —
//! tip failures are tolerated, the assessment is saved without one.

pub mod handlers;
pub mod prompts;

use serde::{Deserialize, Serialize};

use crate::ai::schemas::QuizQuestion;

/// One graded quiz answer, stored with the assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question: String,
    /// The correct answer.
    pub answer: String,
    pub user_answer: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// Grades submitted answers positionally against the quiz questions.
/// A missing answer grades as wrong.
pub fn grade_answers(questions: &[QuizQuestion], answers: &[String]) -> Vec<QuestionResult> {
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let user_answer = answers.get(i).cloned().unwrap_or_default();
            QuestionResult {
                question: q.question.clone(),
                answer: q.correct_answer.clone(),
                is_correct: q.correct_answer == user_answer,
                user_answer,
                explanation: q.explanation.clone(),
            }
        })
        .collect()
}
