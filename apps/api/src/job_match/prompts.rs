// Prompt constants for the Job Match module.

pub fn build_keywords_prompt(text: &str, kind: &str) -> String {
    format!(
        "Extract the most important keywords, skills, and technical terms from this {kind}. \n\
         Return ONLY a JSON array of strings. No explanations.\n\n\
         {kind}:\n\
         {text}\n\n\
         Return format: [\"keyword1\", \"keyword2\", \"keyword3\"]"
    )
}

pub fn build_alignment_prompt(
    job_title: &str,
    company_name: &str,
    job_description: &str,
    resume_content: &str,
) -> String {
    format!(
        "Analyze how well this resume aligns with the job description. \
         Provide specific, actionable feedback.\n\n\
         Job Title: {job_title}\n\
         Company: {company_name}\n\n\
         Job Description:\n{job_description}\n\n\
         Resume:\n{resume_content}\n\n\
         Provide a detailed analysis covering:\n\
         1. Overall fit and alignment\n\
         2. Strengths that match the role\n\
         3. Gaps or areas of concern\n\
         4. Specific recommendations\n\n\
         Keep it concise but actionable (200-300 words)."
    )
}

pub fn build_suggestions_prompt(
    job_title: &str,
    company_name: &str,
    matched_keywords: &[String],
    missing_keywords: &[String],
    match_percentage: u32,
) -> String {
    format!(
        "Based on this job match analysis, provide 5-7 specific suggestions to improve \
         the resume for this role.\n\n\
         Job: {job_title} at {company_name}\n\
         Matched Keywords: {}\n\
         Missing Keywords: {}\n\
         Current Match: {match_percentage}%\n\n\
         Return ONLY a JSON array with this format:\n\
         [\n\
           {{\n\
             \"type\": \"keyword\" | \"format\" | \"content\" | \"achievement\",\n\
             \"message\": \"specific actionable suggestion\",\n\
             \"priority\": \"high\" | \"medium\" | \"low\"\n\
           }}\n\
         ]",
        matched_keywords.join(", "),
        missing_keywords.join(", ")
    )
}

pub fn build_skill_gap_prompt(user_skills: &[String], job_description: &str) -> String {
    format!(
        "Analyze the skill gap between the user's current skills and job requirements.\n\n\
         User's Current Skills:\n{}\n\n\
         Job Description:\n{job_description}\n\n\
         Return a JSON object with this format:\n\
         {{\n\
           \"requiredSkills\": [\"skill1\", \"skill2\"],\n\
           \"missingSkills\": [\"skill3\", \"skill4\"],\n\
           \"skillsToImprove\": [\"skill5\", \"skill6\"],\n\
           \"learningPriority\": {{\n\
             \"high\": [\"most critical skills to learn\"],\n\
             \"medium\": [\"important but not urgent\"],\n\
             \"low\": [\"nice to have\"]\n\
           }}\n\
         }}",
        user_skills.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_prompt_names_the_source_kind() {
        let prompt = build_keywords_prompt("Rust, Tokio", "resume");
        assert!(prompt.contains("from this resume"));
        assert!(prompt.contains("Rust, Tokio"));
    }

    #[test]
    fn test_suggestions_prompt_embeds_match_state() {
        let prompt = build_suggestions_prompt(
            "Engineer",
            "Acme",
            &["rust".to_string()],
            &["kubernetes".to_string()],
            60,
        );
        assert!(prompt.contains("Engineer at Acme"));
        assert!(prompt.contains("Matched Keywords: rust"));
        assert!(prompt.contains("Missing Keywords: kubernetes"));
        assert!(prompt.contains("Current Match: 60%"));
    }
}
