//! Emotion Extractor — maps a multimodal expression report onto the four axes.
//!
//! Face and prosody channels are pooled without weighting. Each axis is the
//! mean of its matched raw scores, or `NO_SIGNAL` when nothing matched.

use serde::{Deserialize, Serialize};

use crate::mood::emotion::{Axis, EmotionScores};

/// Score used for an axis that received no matching emotions.
pub const NO_SIGNAL: f64 = 0.5;

/// A single raw emotion reading from an external expression model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub name: String,
    pub score: f64,
}

impl EmotionScore {
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Per-channel raw emotion readings for a video entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultimodalEmotionReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<Vec<EmotionScore>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prosody: Option<Vec<EmotionScore>>,
}

impl MultimodalEmotionReport {
    /// All readings from every channel, face first.
    pub fn pooled(&self) -> impl Iterator<Item = &EmotionScore> {
        self.face
            .iter()
            .flatten()
            .chain(self.prosody.iter().flatten())
    }
}

/// External emotion vocabulary. Each name maps to exactly one axis.
const VOCABULARY: &[(&str, Axis)] = &[
    ("joy", Axis::Happiness),
    ("happiness", Axis::Happiness),
    ("amusement", Axis::Happiness),
    ("excitement", Axis::Happiness),
    ("contentment", Axis::Happiness),
    ("satisfaction", Axis::Happiness),
    ("ecstasy", Axis::Happiness),
    ("triumph", Axis::Happiness),
    ("relief", Axis::Happiness),
    ("enthusiasm", Axis::Happiness),
    ("fear", Axis::Fear),
    ("anxiety", Axis::Fear),
    ("worry", Axis::Fear),
    ("nervousness", Axis::Fear),
    ("horror", Axis::Fear),
    ("panic", Axis::Fear),
    ("dread", Axis::Fear),
    ("sadness", Axis::Sadness),
    ("disappointment", Axis::Sadness),
    ("grief", Axis::Sadness),
    ("despair", Axis::Sadness),
    ("sorrow", Axis::Sadness),
    ("melancholy", Axis::Sadness),
    ("loneliness", Axis::Sadness),
    ("anger", Axis::Anger),
    ("frustration", Axis::Anger),
    ("irritation", Axis::Anger),
    ("rage", Axis::Anger),
    ("annoyance", Axis::Anger),
    ("contempt", Axis::Anger),
    ("resentment", Axis::Anger),
];

fn axis_for(name: &str) -> Option<Axis> {
    let name = name.trim();
    VOCABULARY
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, axis)| *axis)
}

/// Aggregates a report into axis scores. Pure; never fails.
pub fn extract(report: &MultimodalEmotionReport) -> EmotionScores {
    let mut sums = [0.0_f64; 4];
    let mut counts = [0_usize; 4];

    for reading in report.pooled() {
        if let Some(axis) = axis_for(&reading.name) {
            let idx = axis_index(axis);
            sums[idx] += reading.score;
            counts[idx] += 1;
        }
    }

    let mean = |axis: Axis| {
        let idx = axis_index(axis);
        if counts[idx] == 0 {
            NO_SIGNAL
        } else {
            sums[idx] / counts[idx] as f64
        }
    };

    EmotionScores {
        happiness: mean(Axis::Happiness),
        fear: mean(Axis::Fear),
        sadness: mean(Axis::Sadness),
        anger: mean(Axis::Anger),
    }
}

fn axis_index(axis: Axis) -> usize {
    match axis {
        Axis::Happiness => 0,
        Axis::Fear => 1,
        Axis::Sadness => 2,
        Axis::Anger => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, f64)]) -> Vec<EmotionScore> {
        pairs.iter().map(|(n, s)| EmotionScore::new(*n, *s)).collect()
    }

    #[test]
    fn test_empty_report_is_no_signal() {
        let s = extract(&MultimodalEmotionReport::default());
        assert_eq!(
            s,
            EmotionScores {
                happiness: 0.5,
                fear: 0.5,
                sadness: 0.5,
                anger: 0.5,
            }
        );
    }

    #[test]
    fn test_unknown_names_only_is_no_signal() {
        let report = MultimodalEmotionReport {
            face: Some(scores(&[("Awe", 0.9), ("Boredom", 0.1)])),
            prosody: Some(scores(&[("Calmness", 0.8)])),
        };
        let s = extract(&report);
        for axis in Axis::ALL {
            assert_eq!(s.get(axis), NO_SIGNAL);
        }
    }

    #[test]
    fn test_channels_pool_into_single_mean() {
        let report = MultimodalEmotionReport {
            face: Some(scores(&[("Joy", 0.9), ("Amusement", 0.6)])),
            prosody: Some(scores(&[("Excitement", 0.3)])),
        };
        let s = extract(&report);
        assert!((s.happiness - 0.6).abs() < 1e-9, "got {}", s.happiness);
        assert_eq!(s.fear, NO_SIGNAL);
    }

    #[test]
    fn test_name_matching_is_case_insensitive() {
        let report = MultimodalEmotionReport {
            face: None,
            prosody: Some(scores(&[("ANXIETY", 0.4), ("nervousness", 0.2), (" Rage ", 0.7)])),
        };
        let s = extract(&report);
        assert!((s.fear - 0.3).abs() < 1e-9);
        assert_eq!(s.anger, 0.7);
        assert_eq!(s.sadness, NO_SIGNAL);
    }

    #[test]
    fn test_matched_axes_are_independent() {
        let report = MultimodalEmotionReport {
            face: Some(scores(&[("Disappointment", 0.2), ("Grief", 0.4), ("Frustration", 0.1)])),
            prosody: None,
        };
        let s = extract(&report);
        assert!((s.sadness - 0.3).abs() < 1e-9);
        assert_eq!(s.anger, 0.1);
        assert_eq!(s.happiness, NO_SIGNAL);
    }

    #[test]
    fn test_scores_are_not_reclamped() {
        let report = MultimodalEmotionReport {
            face: Some(scores(&[("Joy", 1.2)])),
            prosody: None,
        };
        assert_eq!(extract(&report).happiness, 1.2);
    }

    #[test]
    fn test_vocabulary_is_many_to_one() {
        let mut names: Vec<&str> = VOCABULARY.iter().map(|(n, _)| *n).collect();
        names.sort();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len(), "a name maps to more than one axis");
    }

    #[test]
    fn test_report_json_channels_are_optional() {
        let report: MultimodalEmotionReport =
            serde_json::from_str(r#"{"face":[{"name":"Joy","score":0.4}]}"#).unwrap();
        assert!(report.prosody.is_none());
        assert_eq!(report.pooled().count(), 1);
    }
}
