//! Job-match analysis — resume vs job description.
//!
//! Combines deterministic scoring (keyword overlap, ATS heuristics) with
//! AI-generated narrative (alignment notes, suggestions). Results are
//! memoized for 24 hours per (user, job description) since the full
//! pipeline makes four generation calls.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ai::{AiClient, AiError, RetryPolicy};
use crate::cache::TtlCache;
use crate::errors::AppError;
use crate::job_match::prompts;

const JOB_MATCH_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cap on reported missing keywords.
const MAX_MISSING_KEYWORDS: usize = 15;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// One prioritized resume suggestion from the model (or the static
/// fallback set when the model's reply does not parse).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// "keyword", "format", "content", or "achievement".
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    /// "high", "medium", or "low".
    pub priority: String,
}

/// Full analysis of one resume against one job description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMatchAnalysis {
    pub ats_score: u32,
    pub match_percentage: u32,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub suggestions: Vec<Suggestion>,
    pub alignment_notes: String,
    pub improvement_tips: Vec<String>,
}

/// Skill-gap analysis between a user's skills and a job description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGapAnalysis {
    pub required_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub skills_to_improve: Vec<String>,
    pub learning_priority: LearningPriority,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearningPriority {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Deterministic scoring
// ────────────────────────────────────────────────────────────────────────────

/// Cache-key digest of a job description: first 16 hex chars of the
/// SHA-256 of the trimmed, lowercased text, so trivial reformatting
/// still hits the cache.
pub fn hash_job_description(jd: &str) -> String {
    let digest = Sha256::digest(jd.trim().to_lowercase().as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}

/// Counts quantified achievements: percentages ("25%"), open-ended
/// counts ("5+"), dollar amounts ("$10000"), and durations
/// ("3 years", "6 months").
fn count_quantified(text: &str) -> usize {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut count = 0;
    let numeric_prefix = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    for (i, token) in tokens.iter().enumerate() {
        let trimmed = token.trim_matches(|c: char| c == ',' || c == '.' || c == ';' || c == ')');

        if let Some(body) = trimmed.strip_suffix('%') {
            if numeric_prefix(body) {
                count += 1;
                continue;
            }
        }
        if let Some(body) = trimmed.strip_suffix('+') {
            if numeric_prefix(body) {
                count += 1;
                continue;
            }
        }
        if let Some(body) = trimmed.strip_prefix('$') {
            if body.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                count += 1;
                continue;
            }
        }
        if numeric_prefix(trimmed) {
            if let Some(next) = tokens.get(i + 1) {
                let unit = next
                    .trim_matches(|c: char| !c.is_ascii_alphabetic())
                    .to_lowercase();
                if unit == "years" || unit == "months" {
                    count += 1;
                }
            }
        }
    }

    count
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// ATS compatibility score, 0–100:
/// keyword match ratio (40), section structure (20), length band (15),
/// quantified achievements (15), markdown headers (10).
pub fn calculate_ats_score(
    resume_content: &str,
    matched_keywords: &[String],
    missing_keywords: &[String],
) -> u32 {
    let mut score = 0.0_f64;
    let lower = resume_content.to_lowercase();

    let total_keywords = matched_keywords.len() + missing_keywords.len();
    if total_keywords > 0 {
        score += matched_keywords.len() as f64 / total_keywords as f64 * 40.0;
    }

    if contains_any(&lower, &["email", "phone", "linkedin"]) {
        score += 5.0;
    }
    if contains_any(&lower, &["experience", "work history", "employment"]) {
        score += 5.0;
    }
    if contains_any(&lower, &["education", "degree", "university"]) {
        score += 5.0;
    }
    if contains_any(&lower, &["skills", "technologies", "tools"]) {
        score += 5.0;
    }

    let word_count = resume_content.split_whitespace().count();
    if (200..=1000).contains(&word_count) {
        score += 15.0;
    } else if word_count >= 100 {
        score += 8.0;
    }

    score += (count_quantified(resume_content) * 3).min(15) as f64;

    let has_headers = resume_content
        .lines()
        .any(|l| ["# ", "## ", "### "].iter().any(|h| l.starts_with(h)));
    if has_headers {
        score += 10.0;
    }

    (score.round() as u32).min(100)
}

/// Truncates to at most `max` characters on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Word-shaped fallback when the model's keyword reply does not parse:
/// the first 20 distinct alphabetic tokens of length ≥ 2.
fn fallback_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();
    for token in text.split(|c: char| !c.is_alphanumeric()) {
        if token.len() < 2 || !token.chars().any(|c| c.is_alphabetic()) {
            continue;
        }
        if seen.insert(token.to_lowercase()) {
            keywords.push(token.to_string());
            if keywords.len() == 20 {
                break;
            }
        }
    }
    keywords
}

// ────────────────────────────────────────────────────────────────────────────
// AI-backed steps
// ────────────────────────────────────────────────────────────────────────────

/// Extracts keywords from `text` via the model, falling back to word
/// heuristics when the reply is not a JSON array.
async fn extract_keywords(
    ai: &AiClient,
    text: &str,
    kind: &str,
) -> Result<Vec<String>, AppError> {
    let prompt = prompts::build_keywords_prompt(text, kind);
    let response = ai.generate_text(&prompt, &RetryPolicy::default()).await?;

    match serde_json::from_str::<Vec<String>>(&response) {
        Ok(keywords) => Ok(keywords),
        Err(e) => {
            warn!("Keyword extraction reply did not parse ({e}), using fallback");
            Ok(fallback_keywords(text))
        }
    }
}

fn fallback_suggestions(missing_keywords: &[String]) -> Vec<Suggestion> {
    vec![
        Suggestion {
            kind: "keyword".to_string(),
            message: format!(
                "Add these missing keywords: {}",
                missing_keywords
                    .iter()
                    .take(5)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            priority: "high".to_string(),
        },
        Suggestion {
            kind: "content".to_string(),
            message: "Tailor your experience section to highlight relevant achievements"
                .to_string(),
            priority: "high".to_string(),
        },
        Suggestion {
            kind: "format".to_string(),
            message: "Use quantifiable metrics to demonstrate impact".to_string(),
            priority: "medium".to_string(),
        },
    ]
}

fn build_improvement_tips(
    analysis_input: &JobMatchAnalysis,
    resume_content: &str,
) -> Vec<String> {
    let mut tips = Vec::new();

    if analysis_input.match_percentage < 50 {
        tips.push(
            "Consider significantly revising your resume to better match the job requirements"
                .to_string(),
        );
    }
    if analysis_input.missing_keywords.len() > 10 {
        tips.push(format!(
            "Add key skills: {}",
            analysis_input
                .missing_keywords
                .iter()
                .take(5)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    if analysis_input.ats_score < 60 {
        tips.push(
            "Improve ATS compatibility by using standard section headings \
             (Experience, Education, Skills)"
                .to_string(),
        );
    }
    if count_quantified(resume_content) == 0 {
        tips.push(
            "Add quantifiable achievements (e.g., 'Increased sales by 25%', \
             'Led team of 5 developers')"
                .to_string(),
        );
    }
    tips.push(format!(
        "Focus on highlighting: {}",
        analysis_input
            .matched_keywords
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    ));
    if tips.len() < 3 {
        tips.push("Review the alignment notes for specific areas to improve".to_string());
    }

    tips
}

/// Runs the full resume-vs-JD analysis, serving from cache when the same
/// user has analyzed the same job description within 24 hours.
pub async fn analyze_job_match(
    ai: &AiClient,
    cache: &TtlCache,
    resume_content: &str,
    job_description: &str,
    job_title: &str,
    company_name: &str,
    user_id: Uuid,
) -> Result<JobMatchAnalysis, AppError> {
    let cache_key = format!(
        "jobmatch:{user_id}:{}",
        hash_job_description(job_description)
    );
    if let Some(cached) = cache.get(&cache_key) {
        debug!("Serving cached job match analysis for user {user_id}");
        let analysis: JobMatchAnalysis =
            serde_json::from_value(cached).map_err(AiError::from)?;
        return Ok(analysis);
    }

    let jd_keywords = extract_keywords(ai, job_description, "job description").await?;
    let resume_keywords = extract_keywords(ai, resume_content, "resume").await?;

    let resume_lower: HashSet<String> =
        resume_keywords.iter().map(|k| k.to_lowercase()).collect();

    let matched_keywords: Vec<String> = jd_keywords
        .iter()
        .filter(|k| resume_lower.contains(&k.to_lowercase()))
        .cloned()
        .collect();
    let missing_keywords: Vec<String> = jd_keywords
        .iter()
        .filter(|k| !resume_lower.contains(&k.to_lowercase()))
        .take(MAX_MISSING_KEYWORDS)
        .cloned()
        .collect();

    let ats_score = calculate_ats_score(resume_content, &matched_keywords, &missing_keywords);
    let match_percentage = (matched_keywords.len() as f64
        / jd_keywords.len().max(1) as f64
        * 100.0)
        .round() as u32;

    let alignment_prompt = prompts::build_alignment_prompt(
        job_title,
        company_name,
        truncate_chars(job_description, 2000),
        truncate_chars(resume_content, 2000),
    );
    let alignment_notes = ai
        .generate_text(&alignment_prompt, &RetryPolicy::default())
        .await?;

    let suggestions_prompt = prompts::build_suggestions_prompt(
        job_title,
        company_name,
        &matched_keywords,
        &missing_keywords,
        match_percentage,
    );
    let suggestions_text = ai
        .generate_text(&suggestions_prompt, &RetryPolicy::default())
        .await?;
    let suggestions = match serde_json::from_str::<Vec<Suggestion>>(&suggestions_text) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Suggestions reply did not parse ({e}), using fallback set");
            fallback_suggestions(&missing_keywords)
        }
    };

    let mut analysis = JobMatchAnalysis {
        ats_score,
        match_percentage,
        matched_keywords,
        missing_keywords,
        suggestions,
        alignment_notes,
        improvement_tips: Vec::new(),
    };
    analysis.improvement_tips = build_improvement_tips(&analysis, resume_content);

    info!(
        "Job match analysis for user {user_id}: ats={ats_score} match={match_percentage}%"
    );

    let value = serde_json::to_value(&analysis).map_err(AiError::from)?;
    cache.set(&cache_key, value, Some(JOB_MATCH_CACHE_TTL));

    Ok(analysis)
}

/// Skill gap between the user's current skills and a job description.
/// Falls back to an empty analysis when the reply does not parse.
pub async fn analyze_skill_gap(
    ai: &AiClient,
    user_skills: &[String],
    job_description: &str,
) -> Result<SkillGapAnalysis, AppError> {
    let prompt =
        prompts::build_skill_gap_prompt(user_skills, truncate_chars(job_description, 2000));
    let response = ai.generate_text(&prompt, &RetryPolicy::default()).await?;

    match serde_json::from_str::<SkillGapAnalysis>(&response) {
        Ok(analysis) => Ok(analysis),
        Err(e) => {
            warn!("Skill gap reply did not parse ({e}), returning empty analysis");
            Ok(SkillGapAnalysis::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_16_hex_chars() {
        let a = hash_job_description("Senior Rust Engineer");
        let b = hash_job_description("Senior Rust Engineer");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_ignores_case_and_surrounding_whitespace() {
        assert_eq!(
            hash_job_description("  Senior Rust Engineer  "),
            hash_job_description("senior rust engineer")
        );
    }

    #[test]
    fn test_hash_differs_for_different_descriptions() {
        assert_ne!(
            hash_job_description("Rust Engineer"),
            hash_job_description("Go Engineer")
        );
    }

    #[test]
    fn test_count_quantified_recognizes_each_shape() {
        assert_eq!(count_quantified("Increased sales by 25%"), 1);
        assert_eq!(count_quantified("Led a team of 5+ engineers"), 1);
        assert_eq!(count_quantified("Saved $40000 annually"), 1);
        assert_eq!(count_quantified("3 years of experience"), 1);
        assert_eq!(count_quantified("6 months on the project"), 1);
        assert_eq!(count_quantified("no numbers here"), 0);
    }

    #[test]
    fn test_ats_score_keyword_ratio_dominates() {
        let matched: Vec<String> = (0..8).map(|i| format!("kw{i}")).collect();
        let missing: Vec<String> = (0..2).map(|i| format!("miss{i}")).collect();
        // Bare content: only the keyword component contributes.
        let score = calculate_ats_score("x y", &matched, &missing);
        assert_eq!(score, 32); // 8/10 * 40
    }

    #[test]
    fn test_ats_score_structure_points() {
        let resume = "Email: a@b.c\n## Experience\nwork\n## Education\ndegree\n## Skills\nrust";
        let matched = vec!["rust".to_string()];
        let score = calculate_ats_score(resume, &matched, &[]);
        // 40 (all matched) + 20 (structure) + 0 (too short) + 0 + 10 (headers)
        assert_eq!(score, 70);
    }

    #[test]
    fn test_ats_score_word_count_band() {
        let long_resume = "word ".repeat(300);
        let score = calculate_ats_score(&long_resume, &[], &[]);
        assert_eq!(score, 15);

        let short_resume = "word ".repeat(120);
        let score = calculate_ats_score(&short_resume, &[], &[]);
        assert_eq!(score, 8);
    }

    #[test]
    fn test_ats_score_quantified_capped_at_15() {
        let resume = "10% 20% 30% 40% 50% 60% 70%";
        let score = calculate_ats_score(resume, &[], &[]);
        assert_eq!(score, 15);
    }

    #[test]
    fn test_ats_score_never_exceeds_100() {
        let resume = format!(
            "email phone\n## Experience\n## Education degree\n## Skills\n{} 10% 20% 30% 40% 50%",
            "word ".repeat(300)
        );
        let matched: Vec<String> = (0..10).map(|i| format!("kw{i}")).collect();
        let score = calculate_ats_score(&resume, &matched, &[]);
        assert!(score <= 100);
    }

    #[test]
    fn test_fallback_keywords_dedupes_and_caps_at_20() {
        let text = "Rust rust RUST axum tokio ".repeat(10);
        let keywords = fallback_keywords(&text);
        assert_eq!(keywords, vec!["Rust", "axum", "tokio"]);

        let many: String = (0..30).map(|i| format!("word{i} ")).collect();
        assert_eq!(fallback_keywords(&many).len(), 20);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }

    #[test]
    fn test_improvement_tips_for_weak_match() {
        let analysis = JobMatchAnalysis {
            ats_score: 40,
            match_percentage: 30,
            matched_keywords: vec!["rust".to_string()],
            missing_keywords: (0..12).map(|i| format!("kw{i}")).collect(),
            suggestions: vec![],
            alignment_notes: String::new(),
            improvement_tips: vec![],
        };
        let tips = build_improvement_tips(&analysis, "no metrics in here");
        assert!(tips.iter().any(|t| t.contains("significantly revising")));
        assert!(tips.iter().any(|t| t.starts_with("Add key skills:")));
        assert!(tips.iter().any(|t| t.contains("ATS compatibility")));
        assert!(tips.iter().any(|t| t.contains("quantifiable achievements")));
        assert!(tips.iter().any(|t| t.starts_with("Focus on highlighting:")));
    }

    #[test]
    fn test_improvement_tips_pad_with_review_note_when_sparse() {
        let analysis = JobMatchAnalysis {
            ats_score: 90,
            match_percentage: 90,
            matched_keywords: vec!["rust".to_string()],
            missing_keywords: vec![],
            suggestions: vec![],
            alignment_notes: String::new(),
            improvement_tips: vec![],
        };
        let tips = build_improvement_tips(&analysis, "Improved throughput by 40%");
        assert!(tips.len() >= 2);
        assert!(tips.iter().any(|t| t.contains("Review the alignment notes")));
    }

    #[test]
    fn test_suggestion_wire_format_uses_type_field() {
        let json = r#"[{"type": "keyword", "message": "add rust", "priority": "high"}]"#;
        let suggestions: Vec<Suggestion> = serde_json::from_str(json).unwrap();
        assert_eq!(suggestions[0].kind, "keyword");
    }

    #[test]
    fn test_skill_gap_wire_format_is_camel_case() {
        let json = r#"{
            "requiredSkills": ["rust"],
            "missingSkills": ["kubernetes"],
            "skillsToImprove": ["sql"],
            "learningPriority": {"high": ["kubernetes"], "medium": [], "low": []}
        }"#;
        let analysis: SkillGapAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.missing_skills, vec!["kubernetes"]);
        assert_eq!(analysis.learning_priority.high, vec!["kubernetes"]);
    }
}
