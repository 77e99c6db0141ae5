// Shared prompt fragments. Each service that needs generation defines
// its own prompts.rs alongside it; this file holds cross-cutting pieces.

/// Instruction appended to every prompt that must yield machine-readable
/// JSON. Gemini has no separate system channel, so this travels inline.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    IMPORTANT: Return ONLY the JSON. \
    No additional text, notes, or markdown formatting.";
