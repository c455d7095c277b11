//! Prompt assembly: the fixed analysis template plus the user's idea.

/// Analysis template. Names every output field and its cardinality
/// (3 competitors, 3 risks per category, at most 3 recommendations).
pub const VALIDATION_TEMPLATE: &str = include_str!("validation_prompt.txt");

/// Marker in [`VALIDATION_TEMPLATE`] replaced by the idea text.
pub const IDEA_PLACEHOLDER: &str = "{{IDEA_TEXT}}";

/// Persona line sent ahead of the template.
pub const SYSTEM_INSTRUCTION: &str = "당신은 비즈니스 아이디어 검증 전문가입니다. \
웹 검색을 통해 최신 시장 정보와 트렌드를 활용하여 정확하고 구체적인 분석을 제공합니다. \
반드시 JSON 형식으로만 응답하세요.";

/// Substitutes the (trimmed) idea into the template.
pub fn assemble(idea: &str) -> String {
    VALIDATION_TEMPLATE.replacen(IDEA_PLACEHOLDER, idea.trim(), 1)
}

/// The complete model input: system instruction, blank line, assembled prompt.
pub fn full_input(idea: &str) -> String {
    format!("{SYSTEM_INSTRUCTION}\n\n{}", assemble(idea))
}
