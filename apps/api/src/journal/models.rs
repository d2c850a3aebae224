use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::mood::{EmotionVector, MultimodalEmotionReport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    #[default]
    Pending,
    Loading,
    Success,
    Error,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Loading => "loading",
            AnalysisStatus::Success => "success",
            AnalysisStatus::Error => "error",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(AnalysisStatus::Pending),
            "loading" => Some(AnalysisStatus::Loading),
            "success" => Some(AnalysisStatus::Success),
            "error" => Some(AnalysisStatus::Error),
            _ => None,
        }
    }
}

/// Variant tag of an entry, used by the type filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Text,
    Video,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Text => "text",
            EntryType::Video => "video",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "text" => Some(EntryType::Text),
            "video" => Some(EntryType::Video),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEntry {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub media_url: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    #[serde(default)]
    pub emotion_report: Option<MultimodalEmotionReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry_type", rename_all = "snake_case")]
pub enum EntryKind {
    Text(TextEntry),
    Video(VideoEntry),
}

impl EntryKind {
    pub fn entry_type(&self) -> EntryType {
        match self {
            EntryKind::Text(_) => EntryType::Text,
            EntryKind::Video(_) => EntryType::Video,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub analysis_status: AnalysisStatus,
    pub mood_metadata: Option<EmotionVector>,
    /// Last analysis failure, kept until the next successful run.
    pub analysis_error: Option<String>,
    #[serde(flatten)]
    pub kind: EntryKind,
}

impl JournalEntry {
    pub fn entry_type(&self) -> EntryType {
        self.kind.entry_type()
    }

    /// Mood metadata, but only when analysis actually succeeded.
    pub fn analyzed_mood(&self) -> Option<&EmotionVector> {
        match self.analysis_status {
            AnalysisStatus::Success => self.mood_metadata.as_ref(),
            _ => None,
        }
    }
}

/// Fields supplied by the user when creating an entry.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub owner_id: Uuid,
    pub kind: EntryKind,
}

/// Partial update applied by the repository. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub analysis_status: Option<AnalysisStatus>,
    pub mood_metadata: Option<Option<EmotionVector>>,
    pub analysis_error: Option<Option<String>>,
    pub emotion_report: Option<MultimodalEmotionReport>,
}

impl EntryPatch {
    pub fn loading() -> Self {
        Self {
            analysis_status: Some(AnalysisStatus::Loading),
            analysis_error: Some(None),
            ..Self::default()
        }
    }

    pub fn succeeded(vector: EmotionVector) -> Self {
        Self {
            analysis_status: Some(AnalysisStatus::Success),
            mood_metadata: Some(Some(vector)),
            analysis_error: Some(None),
            ..Self::default()
        }
    }

    pub fn failed(message: String) -> Self {
        Self {
            analysis_status: Some(AnalysisStatus::Error),
            mood_metadata: Some(None),
            analysis_error: Some(Some(message)),
            ..Self::default()
        }
    }

    pub fn with_report(report: MultimodalEmotionReport) -> Self {
        Self {
            emotion_report: Some(report),
            ..Self::default()
        }
    }

    /// Applies the patch in place and bumps `updated_at`.
    pub fn apply(self, entry: &mut JournalEntry, now: DateTime<Utc>) {
        if let Some(status) = self.analysis_status {
            entry.analysis_status = status;
        }
        if let Some(mood) = self.mood_metadata {
            entry.mood_metadata = mood;
        }
        if let Some(error) = self.analysis_error {
            entry.analysis_error = error;
        }
        if let (Some(report), EntryKind::Video(video)) = (self.emotion_report, &mut entry.kind) {
            video.emotion_report = Some(report);
        }
        entry.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::Sentiment;

    fn text_entry(status: AnalysisStatus, mood: Option<EmotionVector>) -> JournalEntry {
        let now = Utc::now();
        JournalEntry {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            analysis_status: status,
            mood_metadata: mood,
            analysis_error: None,
            kind: EntryKind::Text(TextEntry {
                content: "hello".to_string(),
            }),
        }
    }

    #[test]
    fn test_analyzed_mood_requires_success() {
        let v = EmotionVector::normalized(0.5, 0.5, 0.5, 0.5, "neutral");
        assert!(text_entry(AnalysisStatus::Success, Some(v)).analyzed_mood().is_some());
        assert!(text_entry(AnalysisStatus::Error, Some(v)).analyzed_mood().is_none());
        assert!(text_entry(AnalysisStatus::Loading, Some(v)).analyzed_mood().is_none());
        assert!(text_entry(AnalysisStatus::Success, None).analyzed_mood().is_none());
    }

    #[test]
    fn test_entry_serializes_with_type_tag() {
        let entry = text_entry(AnalysisStatus::Pending, None);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["entry_type"], "text");
        assert_eq!(json["content"], "hello");
        assert_eq!(json["analysis_status"], "pending");
    }

    #[test]
    fn test_failed_patch_clears_metadata() {
        let v = EmotionVector::normalized(0.9, 0.1, 0.1, 0.1, "positive");
        let mut entry = text_entry(AnalysisStatus::Success, Some(v));
        let later = entry.updated_at + chrono::Duration::seconds(5);
        EntryPatch::failed("timeout".to_string()).apply(&mut entry, later);
        assert_eq!(entry.analysis_status, AnalysisStatus::Error);
        assert!(entry.mood_metadata.is_none());
        assert_eq!(entry.analysis_error.as_deref(), Some("timeout"));
        assert_eq!(entry.updated_at, later);
    }

    #[test]
    fn test_success_patch_replaces_metadata_wholesale() {
        let old = EmotionVector::normalized(0.9, 0.1, 0.1, 0.1, "positive");
        let new = EmotionVector::normalized(0.1, 0.8, 0.2, 0.0, "negative");
        let mut entry = text_entry(AnalysisStatus::Success, Some(old));
        EntryPatch::succeeded(new).apply(&mut entry, Utc::now());
        assert_eq!(entry.mood_metadata, Some(new));
        assert_eq!(entry.mood_metadata.map(|m| m.sentiment), Some(Sentiment::Negative));
    }

    #[test]
    fn test_report_patch_ignored_for_text_entries() {
        let mut entry = text_entry(AnalysisStatus::Pending, None);
        let before = entry.kind.clone();
        EntryPatch::with_report(MultimodalEmotionReport::default()).apply(&mut entry, Utc::now());
        assert_eq!(entry.kind, before);
    }

    #[test]
    fn test_entry_type_parse() {
        assert_eq!(EntryType::parse("Video"), Some(EntryType::Video));
        assert_eq!(EntryType::parse(" text "), Some(EntryType::Text));
        assert_eq!(EntryType::parse("audio"), None);
    }
}
