// Prompt constants for the Interview module.

use crate::ai::prompts::JSON_ONLY_INSTRUCTION;

use super::QuestionResult;

/// Quiz prompt template. Replace `{industry}` and `{skills_context}`
/// before sending.
const QUIZ_PROMPT_TEMPLATE: &str = r#"Generate 10 technical interview questions for a {industry} professional{skills_context}.

Each question should be multiple choice with 4 options.

Return ONLY valid JSON, no markdown or additional text:
{
  "questions": [
    {
      "question": "string",
      "options": ["string", "string", "string", "string"],
      "correctAnswer": "string (must match one of options)",
      "explanation": "string"
    }
  ]
}"#;

pub fn build_quiz_prompt(industry: &str, skills: &[String]) -> String {
    let skills_context = if skills.is_empty() {
        String::new()
    } else {
        format!(" with expertise in {}", skills.join(", "))
    };
    format!(
        "{}\n{JSON_ONLY_INSTRUCTION}",
        QUIZ_PROMPT_TEMPLATE
            .replace("{industry}", industry)
            .replace("{skills_context}", &skills_context)
    )
}

/// Improvement-tip prompt built from the questions the user missed.
pub fn build_improvement_tip_prompt(wrong: &[&QuestionResult]) -> String {
    let wrong_questions = wrong
        .iter()
        .map(|r| format!("- {} (You answered: {})", r.question, r.user_answer))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "A user answered these questions incorrectly in an interview prep quiz:\n\n\
         {wrong_questions}\n\n\
         Based on these mistakes, provide a concise, specific improvement tip.\n\
         Focus on the knowledge gaps revealed by these wrong answers.\n\
         Keep the response under 2 sentences and make it encouraging.\n\
         Don't explicitly mention the mistakes, instead focus on what to learn/practice."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiz_prompt_with_skills() {
        let prompt = build_quiz_prompt("tech", &["rust".to_string(), "sql".to_string()]);
        assert!(prompt.contains("for a tech professional with expertise in rust, sql."));
    }

    #[test]
    fn test_quiz_prompt_without_skills() {
        let prompt = build_quiz_prompt("tech", &[]);
        assert!(prompt.contains("for a tech professional."));
    }

    #[test]
    fn test_improvement_tip_prompt_lists_wrong_answers() {
        let result = QuestionResult {
            question: "What is a lifetime?".to_string(),
            answer: "a".to_string(),
            user_answer: "b".to_string(),
            is_correct: false,
            explanation: None,
        };
        let prompt = build_improvement_tip_prompt(&[&result]);
        assert!(prompt.contains("- What is a lifetime? (You answered: b)"));
    }
}
