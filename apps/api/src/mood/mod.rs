// Mood analysis: emotion model, text analyzer, multimodal extractor and the
// expression-measurement client used for video entries.

pub mod analyzer;
pub mod emotion;
pub mod error;
pub mod expression;
pub mod extractor;
pub mod prompts;

pub use analyzer::{LlmMoodAnalyzer, MockMoodAnalyzer, MoodAnalyzer};
pub use emotion::{Axis, EmotionScores, EmotionVector, Sentiment};
pub use error::{AnalysisError, AnalysisErrorKind};
pub use expression::{ExpressionMeasurer, HumeExpressionClient};
pub use extractor::{extract, EmotionScore, MultimodalEmotionReport};
