//! Filter pipeline — turns a user's entries plus a `FilterSpecification` into
//! the ordered list shown to them.
//!
//! Stages run strictly in order: emotion ranges, search, entry type, sort.
//! Later stages rely on what earlier ones removed, so the order must not change.
//! The pipeline is pure: it borrows the snapshot, never mutates it and never fails.

use crate::journal::filter::{FilterSpecification, SortKey};
use crate::journal::models::{EntryKind, JournalEntry};
use crate::mood::{extract, Axis, EmotionScores, MultimodalEmotionReport};

pub fn apply<'a>(entries: &'a [JournalEntry], spec: &FilterSpecification) -> Vec<&'a JournalEntry> {
    let selected: Vec<&JournalEntry> = entries.iter().collect();
    let selected = filter_by_emotion(selected, spec);
    let selected = filter_by_search(selected, &spec.search);
    let selected = filter_by_type(selected, spec);
    sort_entries(selected, spec.sort)
}

/// Stage 1. Identity when every range is `[0, 1]` so unanalyzed entries stay
/// visible until the user actually narrows a range.
fn filter_by_emotion<'a>(
    entries: Vec<&'a JournalEntry>,
    spec: &FilterSpecification,
) -> Vec<&'a JournalEntry> {
    if spec.has_default_ranges() {
        return entries;
    }
    entries
        .into_iter()
        .filter(|entry| match comparison_scores(entry) {
            Some(scores) => Axis::ALL
                .iter()
                .all(|axis| spec.range(*axis).contains(scores.get(*axis))),
            None => false,
        })
        .collect()
}

/// Axis values used for range comparison, or `None` if the entry is unanalyzed.
fn comparison_scores(entry: &JournalEntry) -> Option<EmotionScores> {
    let mood = entry.analyzed_mood()?;
    match &entry.kind {
        EntryKind::Text(_) => Some(mood.scores()),
        EntryKind::Video(video) => Some(match &video.emotion_report {
            Some(report) => extract(report),
            None => extract(&MultimodalEmotionReport::default()),
        }),
    }
}

/// Stage 2. Video entries have no searchable text and drop out on any search.
fn filter_by_search<'a>(entries: Vec<&'a JournalEntry>, search: &str) -> Vec<&'a JournalEntry> {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return entries;
    }
    entries
        .into_iter()
        .filter(|entry| match &entry.kind {
            EntryKind::Text(text) => text.content.to_lowercase().contains(&needle),
            EntryKind::Video(_) => false,
        })
        .collect()
}

/// Stage 3.
fn filter_by_type<'a>(
    entries: Vec<&'a JournalEntry>,
    spec: &FilterSpecification,
) -> Vec<&'a JournalEntry> {
    if spec.entry_types.len() == 2 {
        return entries;
    }
    entries
        .into_iter()
        .filter(|entry| spec.entry_types.contains(&entry.entry_type()))
        .collect()
}

/// Stage 4. `sort_by` is stable, so equal timestamps keep their incoming order.
fn sort_entries(mut entries: Vec<&JournalEntry>, sort: SortKey) -> Vec<&JournalEntry> {
    match sort {
        SortKey::NewestFirst => entries.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::filter::EmotionRange;
    use crate::journal::models::{AnalysisStatus, EntryType, TextEntry, VideoEntry};
    use crate::mood::{EmotionScore, EmotionVector};
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap()
    }

    fn mood(happiness: f64, fear: f64) -> EmotionVector {
        EmotionVector::normalized(happiness, fear, 0.1, 0.1, "neutral")
    }

    fn text(content: &str, created: DateTime<Utc>, mood: Option<EmotionVector>) -> JournalEntry {
        JournalEntry {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            created_at: created,
            updated_at: created,
            analysis_status: if mood.is_some() {
                AnalysisStatus::Success
            } else {
                AnalysisStatus::Pending
            },
            mood_metadata: mood,
            analysis_error: None,
            kind: EntryKind::Text(TextEntry {
                content: content.to_string(),
            }),
        }
    }

    fn video(
        created: DateTime<Utc>,
        status: AnalysisStatus,
        report: Option<MultimodalEmotionReport>,
    ) -> JournalEntry {
        JournalEntry {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            created_at: created,
            updated_at: created,
            analysis_status: status,
            mood_metadata: Some(EmotionVector::normalized(0.5, 0.5, 0.5, 0.5, "neutral")),
            analysis_error: None,
            kind: EntryKind::Video(VideoEntry {
                media_url: "https://cdn.example/v.mp4".to_string(),
                thumbnail_url: "https://cdn.example/v.jpg".to_string(),
                duration_seconds: 12.5,
                emotion_report: report,
            }),
        }
    }

    fn ids(result: &[&JournalEntry]) -> Vec<Uuid> {
        result.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_end_to_end_happiness_and_search() {
        let a = text("happy day", day(1), Some(mood(0.8, 0.2)));
        let b = text("sad day", day(2), Some(mood(0.2, 0.1)));
        let c = text("great happy day", day(3), Some(mood(0.9, 0.1)));
        let entries = vec![a.clone(), b, c.clone()];

        let spec = FilterSpecification::default()
            .with_range(Axis::Happiness, EmotionRange::new(0.5, 1.0))
            .with_search("happy");

        assert_eq!(ids(&apply(&entries, &spec)), vec![c.id, a.id]);
    }

    #[test]
    fn test_ranges_combine_with_and() {
        let e = text("mixed feelings", day(1), Some(mood(0.8, 0.8)));
        let spec = FilterSpecification::default()
            .with_range(Axis::Happiness, EmotionRange::new(0.5, 1.0))
            .with_range(Axis::Fear, EmotionRange::new(0.0, 0.3));
        assert!(apply(&[e], &spec).is_empty());
    }

    #[test]
    fn test_default_ranges_keep_unanalyzed_entries() {
        let mut errored = text("boom", day(2), None);
        errored.analysis_status = AnalysisStatus::Error;
        let entries = vec![
            text("pending", day(1), None),
            errored,
            video(day(3), AnalysisStatus::Loading, None),
        ];
        let result = apply(&entries, &FilterSpecification::default());
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_narrowed_range_drops_unanalyzed_entries() {
        let mut stale = text("had mood once", day(2), Some(mood(0.9, 0.0)));
        stale.analysis_status = AnalysisStatus::Error;
        let entries = vec![text("pending", day(1), None), stale];
        let spec = FilterSpecification::default()
            .with_range(Axis::Happiness, EmotionRange::new(0.0, 0.99));
        assert!(apply(&entries, &spec).is_empty());
    }

    #[test]
    fn test_range_bounds_inclusive_in_pipeline() {
        let e = text("edge", day(1), Some(mood(0.5, 0.3)));
        let spec = FilterSpecification::default()
            .with_range(Axis::Happiness, EmotionRange::new(0.5, 1.0))
            .with_range(Axis::Fear, EmotionRange::new(0.0, 0.3));
        assert_eq!(apply(std::slice::from_ref(&e), &spec).len(), 1);
    }

    #[test]
    fn test_video_ranges_use_extracted_report() {
        let joyful = MultimodalEmotionReport {
            face: Some(vec![EmotionScore::new("Joy", 0.9)]),
            prosody: Some(vec![EmotionScore::new("Contentment", 0.7)]),
        };
        let happy_video = video(day(1), AnalysisStatus::Success, Some(joyful));
        let no_report = video(day(2), AnalysisStatus::Success, None);
        let entries = vec![happy_video.clone(), no_report.clone()];

        let spec = FilterSpecification::default()
            .with_range(Axis::Happiness, EmotionRange::new(0.75, 1.0));
        assert_eq!(ids(&apply(&entries, &spec)), vec![happy_video.id]);

        // no report → every axis at the 0.5 no-signal midpoint
        let spec = FilterSpecification::default()
            .with_range(Axis::Happiness, EmotionRange::new(0.4, 0.6))
            .with_range(Axis::Anger, EmotionRange::new(0.5, 0.5));
        assert_eq!(ids(&apply(&entries, &spec)), vec![no_report.id]);
    }

    #[test]
    fn test_unanalyzed_video_dropped_by_narrowed_range() {
        let entries = vec![video(day(1), AnalysisStatus::Pending, None)];
        let spec = FilterSpecification::default()
            .with_range(Axis::Sadness, EmotionRange::new(0.0, 0.9));
        assert!(apply(&entries, &spec).is_empty());
    }

    #[test]
    fn test_search_excludes_video_entries() {
        let entries = vec![
            video(day(1), AnalysisStatus::Success, None),
            text("video diary notes", day(2), None),
        ];
        let spec = FilterSpecification::default().with_search("video");
        let result = apply(&entries, &spec);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].entry_type(), EntryType::Text);
    }

    #[test]
    fn test_search_is_trimmed_and_case_insensitive() {
        let e = text("Went HIKING with friends", day(1), None);
        let spec = FilterSpecification::default().with_search("  hiking ");
        assert_eq!(apply(std::slice::from_ref(&e), &spec).len(), 1);

        let spec = FilterSpecification::default().with_search("swimming");
        assert!(apply(std::slice::from_ref(&e), &spec).is_empty());
    }

    #[test]
    fn test_whitespace_search_is_noop() {
        let entries = vec![
            video(day(1), AnalysisStatus::Pending, None),
            text("", day(2), None),
        ];
        let spec = FilterSpecification::default().with_search("   ");
        assert_eq!(apply(&entries, &spec).len(), 2);
    }

    #[test]
    fn test_type_filter() {
        let t = text("words", day(1), None);
        let v = video(day(2), AnalysisStatus::Pending, None);
        let entries = vec![t.clone(), v.clone()];

        let only_video = FilterSpecification::default().with_entry_types([EntryType::Video]);
        assert_eq!(ids(&apply(&entries, &only_video)), vec![v.id]);

        let only_text = FilterSpecification::default().with_entry_types([EntryType::Text]);
        assert_eq!(ids(&apply(&entries, &only_text)), vec![t.id]);
    }

    #[test]
    fn test_sort_newest_first() {
        let first = text("jan 1", day(1), None);
        let third = text("jan 3", day(3), None);
        let second = text("jan 2", day(2), None);
        let entries = vec![first.clone(), third.clone(), second.clone()];
        let result = apply(&entries, &FilterSpecification::default());
        assert_eq!(ids(&result), vec![third.id, second.id, first.id]);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let a = text("a", day(5), None);
        let b = text("b", day(5), None);
        let c = text("c", day(5), None);
        let entries = vec![a.clone(), b.clone(), c.clone()];
        let result = apply(&entries, &FilterSpecification::default());
        assert_eq!(ids(&result), vec![a.id, b.id, c.id]);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let spec = FilterSpecification::default()
            .with_range(Axis::Fear, EmotionRange::new(0.2, 0.4))
            .with_search("anything")
            .with_entry_types([EntryType::Text]);
        assert!(apply(&[], &spec).is_empty());
    }

    #[test]
    fn test_pipeline_is_pure() {
        let entries = vec![
            text("happy day", day(1), Some(mood(0.8, 0.2))),
            text("sad day", day(2), Some(mood(0.2, 0.1))),
            video(day(3), AnalysisStatus::Success, None),
        ];
        let snapshot = entries.clone();
        let spec = FilterSpecification::default()
            .with_range(Axis::Happiness, EmotionRange::new(0.1, 1.0))
            .with_search("day");

        let first: Vec<JournalEntry> = apply(&entries, &spec).into_iter().cloned().collect();
        let second: Vec<JournalEntry> = apply(&entries, &spec).into_iter().cloned().collect();
        assert_eq!(first, second);
        assert_eq!(entries, snapshot);
    }
}
