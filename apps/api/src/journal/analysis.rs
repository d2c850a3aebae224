//! Analysis orchestration — drives an entry through `pending → loading →
//! success | error`.
//!
//! Runs out-of-band from entry creation. Retryable failures are retried with
//! exponential backoff; non-retryable ones stop immediately and are recorded on
//! the entry until the user re-triggers analysis. If the entry is deleted while
//! analysis is in flight, the result is dropped.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::journal::models::{EntryKind, EntryPatch, JournalEntry, VideoEntry};
use crate::journal::repository::EntryRepository;
use crate::mood::{
    extract, AnalysisError, EmotionVector, ExpressionMeasurer, MoodAnalyzer, Sentiment,
};

/// Sentiment attached to video analyses. The expression report carries no
/// sentiment signal, so video entries use the same default as an unrecognized label.
pub const VIDEO_SENTIMENT: Sentiment = Sentiment::Neutral;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): base, 2×base, 4×base, …
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }
}

/// How an analysis run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Analyzed(EmotionVector),
    Failed(String),
    /// The entry was gone before the result could be applied.
    Discarded,
}

#[derive(Clone)]
pub struct AnalysisService {
    repo: Arc<dyn EntryRepository>,
    analyzer: Arc<dyn MoodAnalyzer>,
    measurer: Option<Arc<dyn ExpressionMeasurer>>,
    retry: RetryPolicy,
}

impl AnalysisService {
    pub fn new(
        repo: Arc<dyn EntryRepository>,
        analyzer: Arc<dyn MoodAnalyzer>,
        measurer: Option<Arc<dyn ExpressionMeasurer>>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repo,
            analyzer,
            measurer,
            retry,
        }
    }

    pub fn analyzer_backend(&self) -> &'static str {
        self.analyzer.backend()
    }

    pub fn can_measure_video(&self) -> bool {
        self.measurer.is_some()
    }

    /// Runs `analyze_entry` on a background task, logging repository failures.
    pub fn spawn(&self, owner_id: Uuid, entry_id: Uuid) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.analyze_entry(owner_id, entry_id).await {
                warn!(%entry_id, "analysis run aborted: {e:#}");
            }
        });
    }

    pub async fn analyze_entry(&self, owner_id: Uuid, entry_id: Uuid) -> Result<AnalysisOutcome> {
        let Some(entry) = self
            .repo
            .update(owner_id, entry_id, EntryPatch::loading())
            .await?
        else {
            debug!(%entry_id, "entry missing before analysis started");
            return Ok(AnalysisOutcome::Discarded);
        };

        let result = self.with_retries(&entry).await;

        let (patch, outcome) = match result {
            Ok(vector) => (
                EntryPatch::succeeded(vector),
                AnalysisOutcome::Analyzed(vector),
            ),
            Err(e) => {
                let message = e.to_string();
                (
                    EntryPatch::failed(message.clone()),
                    AnalysisOutcome::Failed(message),
                )
            }
        };

        match self.repo.update(owner_id, entry_id, patch).await? {
            Some(updated) => {
                info!(
                    %entry_id,
                    status = updated.analysis_status.as_str(),
                    backend = self.analyzer.backend(),
                    "entry analysis finished"
                );
                Ok(outcome)
            }
            None => {
                debug!(%entry_id, "entry deleted during analysis; result discarded");
                Ok(AnalysisOutcome::Discarded)
            }
        }
    }

    async fn with_retries(&self, entry: &JournalEntry) -> Result<EmotionVector, AnalysisError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.analyze_once(entry).await {
                Ok(vector) => return Ok(vector),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        entry_id = %entry.id,
                        attempt,
                        kind = %e.kind(),
                        "analysis attempt failed, retrying after {}ms",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(entry_id = %entry.id, attempt, kind = %e.kind(), "analysis failed: {e}");
                    return Err(e);
                }
            }
        }
    }

    async fn analyze_once(&self, entry: &JournalEntry) -> Result<EmotionVector, AnalysisError> {
        match &entry.kind {
            EntryKind::Text(text) => self.analyzer.analyze(&text.content).await,
            EntryKind::Video(video) => self.analyze_video(entry, video).await,
        }
    }

    async fn analyze_video(
        &self,
        entry: &JournalEntry,
        video: &VideoEntry,
    ) -> Result<EmotionVector, AnalysisError> {
        let report = match &video.emotion_report {
            Some(report) => report.clone(),
            None => {
                let measurer = self.measurer.as_ref().ok_or_else(|| {
                    AnalysisError::configuration("no expression measurement service configured")
                })?;
                let report = measurer.measure(&video.media_url).await?;
                // Keep the report: the filter pipeline compares video entries against it.
                if let Err(e) = self
                    .repo
                    .update(entry.owner_id, entry.id, EntryPatch::with_report(report.clone()))
                    .await
                {
                    warn!(entry_id = %entry.id, "failed to store emotion report: {e:#}");
                }
                report
            }
        };
        Ok(extract(&report).with_sentiment(VIDEO_SENTIMENT))
    }
}
