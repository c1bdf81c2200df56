//! Prompt sent to the text-generation provider.

use super::EXPECTED_CARD_COUNT;

pub fn build_prompt(deck_name: &str, description: Option<&str>) -> String {
    let n = EXPECTED_CARD_COUNT;
    let description_line = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| format!("**Description:** {}\n", d))
        .unwrap_or_default();

    format!(
        r#"CRITICAL: You MUST generate EXACTLY {n} flashcards. Not {below}, not {above}, but exactly {n}.

Generate flashcards for this deck:

**Deck Title:** "{deck_name}"
{description_line}
**REQUIRED: Generate EXACTLY {n} cards (count carefully)**

**Card Format Guidelines:**
- front: The question, prompt, term, or source content
- back: The answer, explanation, definition, or target content

**Adapt your approach based on the content:**
- For vocabulary/translation: Keep the back concise (just the translation or definition)
- For concepts/topics: Provide clear explanations with examples where helpful
- For factual information: Give accurate, detailed answers
- For skills/how-to: Include step-by-step explanations

**Quality Requirements:**
- One concept per card
- Factual accuracy
- Progress from basic to more advanced

**REMINDER: Provide exactly {n} flashcards in the "cards" array.**"#,
        below = n - 1,
        above = n + 1,
    )
}
