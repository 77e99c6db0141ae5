// Prompt constants for the Insights module.

use crate::ai::prompts::JSON_ONLY_INSTRUCTION;

/// Insights prompt template. Replace `{industry}` and `{skills_context}`
/// before sending.
const INSIGHTS_PROMPT_TEMPLATE: &str = r#"Analyze the current state of the {industry} industry and provide insights in ONLY the following JSON format without any additional notes or explanations:
{skills_context}
{
  "salaryRanges": [
    { "role": "string", "min": number, "max": number, "median": number, "location": "string" }
  ],
  "growthRate": number,
  "demandLevel": "High" | "Medium" | "Low",
  "topSkills": ["skill1", "skill2"],
  "marketOutlook": "Positive" | "Neutral" | "Negative",
  "keyTrends": ["trend1", "trend2"],
  "recommendedSkills": ["skill1", "skill2"],
  "skillGap": ["skill to learn 1", "skill to learn 2"]
}

Include at least 5 common roles for salary ranges.
Growth rate should be a percentage.
Include at least 5 skills, trends, and learning recommendations.
skillGap should list high-priority skills the user should learn (empty array if all top skills are already known)."#;

pub fn build_insights_prompt(industry: &str, skills: &[String]) -> String {
    let skills_context = if skills.is_empty() {
        String::new()
    } else {
        format!(
            "User's current skills: {}. Prioritize recommendations based on complementing these existing skills.",
            skills.join(", ")
        )
    };

    format!(
        "{}\n{JSON_ONLY_INSTRUCTION}",
        INSIGHTS_PROMPT_TEMPLATE
            .replace("{industry}", industry)
            .replace("{skills_context}", &skills_context)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_industry_and_skills() {
        let prompt = build_insights_prompt("tech", &["rust".to_string()]);
        assert!(prompt.contains("the tech industry"));
        assert!(prompt.contains("User's current skills: rust"));
    }

    #[test]
    fn test_prompt_without_skills_omits_skills_context() {
        let prompt = build_insights_prompt("tech", &[]);
        assert!(!prompt.contains("User's current skills"));
    }
}
