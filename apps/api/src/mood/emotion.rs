use serde::{Deserialize, Serialize};

/// Categorical sentiment attached to every analyzed entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
    Mixed,
}

impl Sentiment {
    /// Case-insensitive match against the four accepted labels.
    /// Anything else, including an empty string, becomes `Neutral`.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            "mixed" => Sentiment::Mixed,
            _ => Sentiment::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
            Sentiment::Mixed => "mixed",
        }
    }
}

/// One of the four emotion axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Happiness,
    Fear,
    Sadness,
    Anger,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::Happiness, Axis::Fear, Axis::Sadness, Axis::Anger];
}

/// Four independent intensity scores without a sentiment label.
///
/// This is what the multimodal extractor produces; it only becomes an
/// `EmotionVector` once a caller decides which sentiment goes with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionScores {
    pub happiness: f64,
    pub fear: f64,
    pub sadness: f64,
    pub anger: f64,
}

impl EmotionScores {
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Happiness => self.happiness,
            Axis::Fear => self.fear,
            Axis::Sadness => self.sadness,
            Axis::Anger => self.anger,
        }
    }

    /// Attaches a sentiment and clamps the axes into `[0, 1]`.
    pub fn with_sentiment(self, sentiment: Sentiment) -> EmotionVector {
        EmotionVector {
            happiness: clamp_unit(self.happiness),
            fear: clamp_unit(self.fear),
            sadness: clamp_unit(self.sadness),
            anger: clamp_unit(self.anger),
            sentiment,
        }
    }
}

/// Normalized emotion classification of a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionVector {
    pub happiness: f64,
    pub fear: f64,
    pub sadness: f64,
    pub anger: f64,
    pub sentiment: Sentiment,
}

impl EmotionVector {
    /// Builds a vector from raw model output. Scores outside `[0, 1]` are pulled
    /// to the nearest bound and the sentiment label is normalized.
    pub fn normalized(
        happiness: f64,
        fear: f64,
        sadness: f64,
        anger: f64,
        sentiment: &str,
    ) -> Self {
        EmotionScores {
            happiness,
            fear,
            sadness,
            anger,
        }
        .with_sentiment(Sentiment::normalize(sentiment))
    }

    /// Re-applies normalization. A no-op for any vector built through this module.
    pub fn renormalized(&self) -> Self {
        self.scores().with_sentiment(self.sentiment)
    }

    pub fn scores(&self) -> EmotionScores {
        EmotionScores {
            happiness: self.happiness,
            fear: self.fear,
            sadness: self.sadness,
            anger: self.anger,
        }
    }
}

/// NaN has no nearest bound; it is treated as zero intensity.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
