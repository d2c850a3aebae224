use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::journal::models::EntryType;
use crate::mood::Axis;

/// Inclusive `[min, max]` bound on one emotion axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionRange {
    pub min: f64,
    pub max: f64,
}

impl EmotionRange {
    pub const FULL: EmotionRange = EmotionRange { min: 0.0, max: 1.0 };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn is_full(&self) -> bool {
        *self == Self::FULL
    }

    fn is_valid(&self) -> bool {
        0.0 <= self.min && self.min <= self.max && self.max <= 1.0
    }
}

impl Default for EmotionRange {
    fn default() -> Self {
        Self::FULL
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    NewestFirst,
}

/// The complete set of user-chosen display criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpecification {
    pub happiness: EmotionRange,
    pub fear: EmotionRange,
    pub sadness: EmotionRange,
    pub anger: EmotionRange,
    pub entry_types: BTreeSet<EntryType>,
    pub search: String,
    pub sort: SortKey,
}

impl Default for FilterSpecification {
    fn default() -> Self {
        Self {
            happiness: EmotionRange::FULL,
            fear: EmotionRange::FULL,
            sadness: EmotionRange::FULL,
            anger: EmotionRange::FULL,
            entry_types: [EntryType::Text, EntryType::Video].into_iter().collect(),
            search: String::new(),
            sort: SortKey::NewestFirst,
        }
    }
}

impl FilterSpecification {
    pub fn range(&self, axis: Axis) -> EmotionRange {
        match axis {
            Axis::Happiness => self.happiness,
            Axis::Fear => self.fear,
            Axis::Sadness => self.sadness,
            Axis::Anger => self.anger,
        }
    }

    pub fn with_range(mut self, axis: Axis, range: EmotionRange) -> Self {
        match axis {
            Axis::Happiness => self.happiness = range,
            Axis::Fear => self.fear = range,
            Axis::Sadness => self.sadness = range,
            Axis::Anger => self.anger = range,
        }
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_entry_types(mut self, types: impl IntoIterator<Item = EntryType>) -> Self {
        self.entry_types = types.into_iter().collect();
        self
    }

    /// True when no emotion range has been narrowed.
    pub fn has_default_ranges(&self) -> bool {
        Axis::ALL.iter().all(|axis| self.range(*axis).is_full())
    }

    /// Caller-side validation. The pipeline itself accepts any specification.
    pub fn validate(&self) -> Result<(), String> {
        for axis in Axis::ALL {
            let range = self.range(axis);
            if !range.is_valid() {
                return Err(format!(
                    "{axis:?} range must satisfy 0 <= min <= max <= 1, got [{}, {}]",
                    range.min, range.max
                ));
            }
        }
        if self.entry_types.is_empty() {
            return Err("at least one entry type must be selected".to_string());
        }
        Ok(())
    }
}
