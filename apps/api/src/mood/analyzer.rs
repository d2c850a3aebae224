//! Mood Analyzer — turns entry text into a normalized `EmotionVector`.
//!
//! `AppState` holds an `Arc<dyn MoodAnalyzer>`, chosen at startup via config:
//! `LlmMoodAnalyzer` in production, `MockMoodAnalyzer` for local development
//! and tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::llm_client::LlmClient;
use crate::mood::emotion::{EmotionVector, Sentiment};
use crate::mood::error::AnalysisError;
use crate::mood::prompts::{build_mood_prompt, mood_system_prompt};

#[async_trait]
pub trait MoodAnalyzer: Send + Sync {
    /// Classifies `text`. Empty text is not rejected here.
    async fn analyze(&self, text: &str) -> Result<EmotionVector, AnalysisError>;

    /// Short backend label for logs.
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmMoodAnalyzer
// ────────────────────────────────────────────────────────────────────────────

/// The only reply shape accepted from the model.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MoodReply {
    happiness: f64,
    fear: f64,
    sadness: f64,
    anger: f64,
    sentiment: String,
}

/// One LLM call per `analyze`, no caching.
pub struct LlmMoodAnalyzer {
    llm: LlmClient,
}

impl LlmMoodAnalyzer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl MoodAnalyzer for LlmMoodAnalyzer {
    async fn analyze(&self, text: &str) -> Result<EmotionVector, AnalysisError> {
        let prompt = build_mood_prompt(text);
        let reply = self.llm.call_text(&prompt, &mood_system_prompt()).await?;
        let vector = parse_mood_reply(&reply)?;
        debug!(
            model = self.llm.model(),
            sentiment = vector.sentiment.as_str(),
            "mood analysis completed"
        );
        Ok(vector)
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

/// Parses the model's JSON reply and normalizes it.
pub fn parse_mood_reply(reply: &str) -> Result<EmotionVector, AnalysisError> {
    if reply.trim().is_empty() {
        return Err(AnalysisError::empty_response("LLM reply was blank"));
    }
    let parsed: MoodReply = serde_json::from_str(reply).map_err(|e| {
        AnalysisError::malformed(format!("LLM reply is not a valid mood object: {e}"))
            .with_source(e)
    })?;
    Ok(EmotionVector::normalized(
        parsed.happiness,
        parsed.fear,
        parsed.sadness,
        parsed.anger,
        &parsed.sentiment,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// MockMoodAnalyzer
// ────────────────────────────────────────────────────────────────────────────

const HAPPY_WORDS: &[&str] = &["happy", "great", "joy", "love", "excited", "grateful"];
const FEAR_WORDS: &[&str] = &["afraid", "scared", "anxious", "worried", "nervous"];
const SAD_WORDS: &[&str] = &["sad", "lonely", "cry", "miss", "grief", "down"];
const ANGER_WORDS: &[&str] = &["angry", "mad", "furious", "annoyed", "frustrated"];

/// Deterministic stand-in for the LLM analyzer.
///
/// Without a script it scores text by keyword hits. Scripted results are
/// returned in order before falling back to keyword scoring.
#[derive(Clone, Default)]
pub struct MockMoodAnalyzer {
    script: Arc<Mutex<VecDeque<Result<EmotionVector, AnalysisError>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockMoodAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(
        results: impl IntoIterator<Item = Result<EmotionVector, AnalysisError>>,
    ) -> Self {
        Self {
            script: Arc::new(Mutex::new(results.into_iter().collect())),
            calls: Arc::default(),
        }
    }

    /// Texts passed to `analyze`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn next_scripted(&self) -> Option<Result<EmotionVector, AnalysisError>> {
        self.script.lock().ok()?.pop_front()
    }
}

#[async_trait]
impl MoodAnalyzer for MockMoodAnalyzer {
    async fn analyze(&self, text: &str) -> Result<EmotionVector, AnalysisError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(text.to_string());
        }
        if let Some(result) = self.next_scripted() {
            return result;
        }
        Ok(keyword_vector(text))
    }

    fn backend(&self) -> &'static str {
        "mock"
    }
}

fn keyword_vector(text: &str) -> EmotionVector {
    let lower = text.to_lowercase();
    let score = |words: &[&str]| {
        let hits = words.iter().filter(|w| lower.contains(*w)).count();
        (0.1 + 0.3 * hits as f64).min(1.0)
    };
    let happiness = score(HAPPY_WORDS);
    let negative = [score(FEAR_WORDS), score(SAD_WORDS), score(ANGER_WORDS)];
    let strongest_negative = negative.iter().cloned().fold(0.0_f64, f64::max);

    let sentiment = match (happiness > 0.1, strongest_negative > 0.1) {
        (true, true) => Sentiment::Mixed,
        (true, false) => Sentiment::Positive,
        (false, true) => Sentiment::Negative,
        (false, false) => Sentiment::Neutral,
    };

    EmotionVector::normalized(
        happiness,
        negative[0],
        negative[1],
        negative[2],
        sentiment.as_str(),
    )
}
