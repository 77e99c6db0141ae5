//! Typed AI payloads with post-parse validation.
//!
//! Serde gives structural checking (fields, types, enums); `validate`
//! layers the domain constraints the prompts promise (minimum counts,
//! exact option arity). `generate_json` only ever returns a payload that
//! passed both.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A JSON payload the AI client can request. `validate` returns the full
/// list of issues so exhausted retries can surface them for diagnostics.
pub trait AiPayload: DeserializeOwned {
    fn validate(&self) -> Result<(), Vec<String>>;
}

// ────────────────────────────────────────────────────────────────────────────
// Quiz
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// A generated multiple-choice quiz. At least 5 questions, each with
/// exactly 4 options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

impl AiPayload for Quiz {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut issues = Vec::new();
        if self.questions.len() < 5 {
            issues.push(format!(
                "expected at least 5 questions, got {}",
                self.questions.len()
            ));
        }
        for (i, q) in self.questions.iter().enumerate() {
            if q.options.len() != 4 {
                issues.push(format!(
                    "question {i} must have exactly 4 options, got {}",
                    q.options.len()
                ));
            }
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Industry insights
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DemandLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarketOutlook {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRange {
    pub role: String,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    #[serde(default)]
    pub location: Option<String>,
}

/// Generated market analysis for one industry. Salary ranges, skills,
/// and trends each need at least 5 entries; `skill_gap` may be empty
/// (and is absent entirely when the model has nothing to flag).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryInsights {
    pub salary_ranges: Vec<SalaryRange>,
    pub growth_rate: f64,
    pub demand_level: DemandLevel,
    pub top_skills: Vec<String>,
    pub market_outlook: MarketOutlook,
    pub key_trends: Vec<String>,
    pub recommended_skills: Vec<String>,
    #[serde(default)]
    pub skill_gap: Vec<String>,
}

impl AiPayload for IndustryInsights {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut issues = Vec::new();
        if self.salary_ranges.len() < 5 {
            issues.push(format!(
                "expected at least 5 salary ranges, got {}",
                self.salary_ranges.len()
            ));
        }
        if self.top_skills.len() < 5 {
            issues.push(format!(
                "expected at least 5 top skills, got {}",
                self.top_skills.len()
            ));
        }
        if self.key_trends.len() < 5 {
            issues.push(format!(
                "expected at least 5 key trends, got {}",
                self.key_trends.len()
            ));
        }
        if self.recommended_skills.len() < 5 {
            issues.push(format!(
                "expected at least 5 recommended skills, got {}",
                self.recommended_skills.len()
            ));
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}
