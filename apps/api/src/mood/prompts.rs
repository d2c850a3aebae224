// Mood analysis prompt templates.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

pub fn mood_system_prompt() -> String {
    format!(
        "{JSON_ONLY_SYSTEM} You classify the emotional content of personal journal entries. \
         Score each emotion independently; the scores do not need to sum to 1."
    )
}

pub const MOOD_ANALYSIS_PROMPT: &str = r#"Analyze the emotional content of the following journal entry.

JOURNAL ENTRY:
{entry_text}

OUTPUT SCHEMA (return exactly this structure, with exactly these five fields):
{
  "happiness": number between 0.0 and 1.0,
  "fear": number between 0.0 and 1.0,
  "sadness": number between 0.0 and 1.0,
  "anger": number between 0.0 and 1.0,
  "sentiment": "positive" | "neutral" | "negative" | "mixed"
}

RULES:
1. Each score is an independent intensity for that emotion.
2. If the entry is empty or carries no emotional signal, use low scores and "neutral".
3. Return ONLY the JSON object — nothing else, no code fences."#;

pub fn build_mood_prompt(entry_text: &str) -> String {
    MOOD_ANALYSIS_PROMPT.replace("{entry_text}", entry_text)
}
