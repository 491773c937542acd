// Shared prompt constants and prompt-building utilities.
// Features that call the LLM keep their own prompts.rs next to them; this file
// holds the fragments they all share.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps the model inside the candidate list it was given.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Only discuss careers, colleges and scholarships that appear in the \
    context provided. Do NOT invent institutions, exams, fees or salary figures. \
    If the context does not support a claim, omit it.";

/// Instructs the model to write all free text in the student's language.
pub fn language_instruction(language: &str) -> String {
    format!(
        "Write every free-text field in {language}. \
         Keep JSON keys, career ids and numbers exactly as given."
    )
}

/// Joins system prompt fragments with blank lines.
pub fn system_prompt(parts: &[&str]) -> String {
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_instruction_names_language() {
        let text = language_instruction("Tamil");
        assert!(text.contains("in Tamil"));
    }

    #[test]
    fn test_system_prompt_joins_parts() {
        assert_eq!(system_prompt(&["a", "b"]), "a\n\nb");
    }
}
