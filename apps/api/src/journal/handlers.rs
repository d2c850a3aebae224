use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::journal::filter::{EmotionRange, FilterSpecification, SortKey};
use crate::journal::models::{
    AnalysisStatus, EntryKind, EntryType, JournalEntry, NewEntry, TextEntry, VideoEntry,
};
use crate::journal::pipeline;
use crate::mood::{Axis, MultimodalEmotionReport};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// Query string for `GET /api/v1/entries`. Omitted bounds default to the full range.
#[derive(Debug, Default, Deserialize)]
pub struct ListEntriesQuery {
    pub user_id: Uuid,
    pub happiness_min: Option<f64>,
    pub happiness_max: Option<f64>,
    pub fear_min: Option<f64>,
    pub fear_max: Option<f64>,
    pub sadness_min: Option<f64>,
    pub sadness_max: Option<f64>,
    pub anger_min: Option<f64>,
    pub anger_max: Option<f64>,
    /// Comma-separated entry types, e.g. `text,video`.
    pub types: Option<String>,
    pub search: Option<String>,
    pub sort: Option<SortKey>,
}

impl ListEntriesQuery {
    fn range(min: Option<f64>, max: Option<f64>) -> EmotionRange {
        EmotionRange::new(
            min.unwrap_or(EmotionRange::FULL.min),
            max.unwrap_or(EmotionRange::FULL.max),
        )
    }

    pub fn to_spec(&self) -> Result<FilterSpecification, AppError> {
        let mut spec = FilterSpecification::default()
            .with_range(
                Axis::Happiness,
                Self::range(self.happiness_min, self.happiness_max),
            )
            .with_range(Axis::Fear, Self::range(self.fear_min, self.fear_max))
            .with_range(Axis::Sadness, Self::range(self.sadness_min, self.sadness_max))
            .with_range(Axis::Anger, Self::range(self.anger_min, self.anger_max))
            .with_search(self.search.clone().unwrap_or_default());

        if let Some(types) = &self.types {
            let parsed = types
                .split(',')
                .filter(|t| !t.trim().is_empty())
                .map(|t| {
                    EntryType::parse(t)
                        .ok_or_else(|| AppError::Validation(format!("unknown entry type '{t}'")))
                })
                .collect::<Result<Vec<_>, _>>()?;
            spec = spec.with_entry_types(parsed);
        }
        if let Some(sort) = self.sort {
            spec.sort = sort;
        }

        spec.validate().map_err(AppError::Validation)?;
        Ok(spec)
    }
}

#[derive(Serialize)]
pub struct ListEntriesResponse {
    pub entries: Vec<JournalEntry>,
    /// Entries the user owns before filtering.
    pub total: usize,
}

/// GET /api/v1/entries
pub async fn handle_list_entries(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListEntriesQuery>,
) -> Result<Json<ListEntriesResponse>, AppError> {
    let spec = params.to_spec()?;
    let entries = state.entries.list(params.user_id).await?;
    let filtered = pipeline::apply(&entries, &spec)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(ListEntriesResponse {
        entries: filtered,
        total: entries.len(),
    }))
}

/// GET /api/v1/entries/:id
pub async fn handle_get_entry(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<UserIdQuery>,
) -> Result<Json<JournalEntry>, AppError> {
    state
        .entries
        .get(params.user_id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Entry {id} not found")))
}

#[derive(Debug, Deserialize)]
pub struct CreateTextRequest {
    pub user_id: Uuid,
    pub content: String,
}

/// POST /api/v1/entries/text
pub async fn handle_create_text(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateTextRequest>,
) -> Result<(StatusCode, Json<JournalEntry>), AppError> {
    if req.content.trim().is_empty() {
        return Err(AppError::Validation("content must not be empty".to_string()));
    }
    let entry = state
        .entries
        .create(NewEntry {
            owner_id: req.user_id,
            kind: EntryKind::Text(TextEntry {
                content: req.content,
            }),
        })
        .await?;
    info!(entry_id = %entry.id, "text entry created");
    state.analysis.spawn(entry.owner_id, entry.id);
    Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Debug, Deserialize)]
pub struct CreateVideoRequest {
    pub user_id: Uuid,
    pub media_url: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    /// Report already produced by the client, if any.
    #[serde(default)]
    pub emotion_report: Option<MultimodalEmotionReport>,
}

/// POST /api/v1/entries/video
pub async fn handle_create_video(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateVideoRequest>,
) -> Result<(StatusCode, Json<JournalEntry>), AppError> {
    if req.media_url.trim().is_empty() {
        return Err(AppError::Validation("media_url must not be empty".to_string()));
    }
    if !req.duration_seconds.is_finite() || req.duration_seconds < 0.0 {
        return Err(AppError::Validation(
            "duration_seconds must be a non-negative number".to_string(),
        ));
    }
    let entry = state
        .entries
        .create(NewEntry {
            owner_id: req.user_id,
            kind: EntryKind::Video(VideoEntry {
                media_url: req.media_url,
                thumbnail_url: req.thumbnail_url,
                duration_seconds: req.duration_seconds,
                emotion_report: req.emotion_report,
            }),
        })
        .await?;
    info!(entry_id = %entry.id, "video entry created");
    state.analysis.spawn(entry.owner_id, entry.id);
    Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Debug, Deserialize)]
pub struct ReanalyzeRequest {
    pub user_id: Uuid,
}

/// POST /api/v1/entries/:id/analyze
/// Manual re-trigger, e.g. after a non-retryable failure has been fixed.
/// Refused while a run is already in flight for the entry.
pub async fn handle_reanalyze(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ReanalyzeRequest>,
) -> Result<StatusCode, AppError> {
    let entry = state
        .entries
        .get(req.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Entry {id} not found")))?;
    if entry.analysis_status == AnalysisStatus::Loading {
        return Err(AppError::Conflict(format!("Entry {id} is already being analyzed")));
    }
    state.analysis.spawn(req.user_id, id);
    Ok(StatusCode::ACCEPTED)
}

/// DELETE /api/v1/entries/:id
pub async fn handle_delete_entry(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    if state.entries.delete(params.user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Entry {id} not found")))
    }
}
