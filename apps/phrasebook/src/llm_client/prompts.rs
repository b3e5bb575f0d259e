// Shared prompt constants.
// Each stage that needs LLM calls defines its own prompts.rs alongside it.

/// System prompt that enforces JSON-array-only output.
pub const JSON_ARRAY_ONLY_SYSTEM: &str = "You are a JSON-only output machine. \
    Return only valid JSON arrays. \
    Do NOT include any text outside the JSON array. \
    Do NOT use markdown code fences.";
