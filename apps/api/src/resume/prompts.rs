// Prompt constants for the Resume module.

/// Section-improvement prompt. `kind` is the section being improved
/// ("experience", "project", "summary", ...).
pub fn build_improve_prompt(kind: &str, industry: &str, current: &str) -> String {
    format!(
        "As an expert resume writer, improve the following {kind} description \
         for a {industry} professional.\n\
         Make it more impactful, quantifiable, and aligned with industry standards.\n\
         Current content: \"{current}\"\n\n\
         Requirements:\n\
         1. Use action verbs\n\
         2. Include metrics and results where possible\n\
         3. Highlight relevant technical skills\n\
         4. Keep it concise but detailed\n\
         5. Focus on achievements over responsibilities\n\
         6. Use industry-specific keywords\n\n\
         Format the response as a single paragraph without any additional text or explanations."
    )
}
