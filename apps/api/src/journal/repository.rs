//! Entry repository — owner-scoped CRUD over journal entries.
//!
//! Every method takes the calling user's id; an entry owned by someone else
//! behaves exactly like a missing one.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::journal::models::{
    AnalysisStatus, EntryKind, EntryPatch, JournalEntry, NewEntry, TextEntry, VideoEntry,
};

#[async_trait]
pub trait EntryRepository: Send + Sync {
    async fn list(&self, owner_id: Uuid) -> Result<Vec<JournalEntry>>;

    async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<JournalEntry>>;

    async fn create(&self, entry: NewEntry) -> Result<JournalEntry>;

    /// Returns `None` when the entry no longer exists for this owner.
    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: EntryPatch,
    ) -> Result<Option<JournalEntry>>;

    /// Returns whether an entry was deleted.
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool>;
}

/// Builds a fresh `Pending` entry.
pub fn new_journal_entry(entry: NewEntry, now: DateTime<Utc>) -> JournalEntry {
    JournalEntry {
        id: Uuid::new_v4(),
        owner_id: entry.owner_id,
        created_at: now,
        updated_at: now,
        analysis_status: AnalysisStatus::Pending,
        mood_metadata: None,
        analysis_error: None,
        kind: entry.kind,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ────────────────────────────────────────────────────────────────────────────

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS journal_entries (
    id               UUID PRIMARY KEY,
    user_id          UUID NOT NULL,
    entry_type       TEXT NOT NULL,
    content          TEXT,
    media_url        TEXT,
    thumbnail_url    TEXT,
    duration_seconds DOUBLE PRECISION,
    emotion_report   JSONB,
    analysis_status  TEXT NOT NULL,
    mood_metadata    JSONB,
    analysis_error   TEXT,
    created_at       TIMESTAMPTZ NOT NULL,
    updated_at       TIMESTAMPTZ NOT NULL
)"#;

const CREATE_INDEX_SQL: &str =
    "CREATE INDEX IF NOT EXISTS journal_entries_user_id_idx ON journal_entries (user_id)";

#[derive(Debug, Clone, FromRow)]
struct JournalEntryRow {
    id: Uuid,
    user_id: Uuid,
    entry_type: String,
    content: Option<String>,
    media_url: Option<String>,
    thumbnail_url: Option<String>,
    duration_seconds: Option<f64>,
    emotion_report: Option<serde_json::Value>,
    analysis_status: String,
    mood_metadata: Option<serde_json::Value>,
    analysis_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JournalEntryRow> for JournalEntry {
    type Error = anyhow::Error;

    fn try_from(row: JournalEntryRow) -> Result<Self> {
        let kind = match row.entry_type.as_str() {
            "text" => EntryKind::Text(TextEntry {
                content: row.content.unwrap_or_default(),
            }),
            "video" => EntryKind::Video(VideoEntry {
                media_url: row.media_url.unwrap_or_default(),
                thumbnail_url: row.thumbnail_url.unwrap_or_default(),
                duration_seconds: row.duration_seconds.unwrap_or_default(),
                emotion_report: row
                    .emotion_report
                    .map(serde_json::from_value)
                    .transpose()
                    .with_context(|| format!("invalid emotion_report on entry {}", row.id))?,
            }),
            other => anyhow::bail!("unknown entry_type '{other}' on entry {}", row.id),
        };
        let analysis_status = AnalysisStatus::parse(&row.analysis_status).with_context(|| {
            format!(
                "unknown analysis_status '{}' on entry {}",
                row.analysis_status, row.id
            )
        })?;
        let mood_metadata = row
            .mood_metadata
            .map(serde_json::from_value)
            .transpose()
            .with_context(|| format!("invalid mood_metadata on entry {}", row.id))?;

        Ok(JournalEntry {
            id: row.id,
            owner_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            analysis_status,
            mood_metadata,
            analysis_error: row.analysis_error,
            kind,
        })
    }
}

fn rows_to_entries(rows: Vec<JournalEntryRow>) -> Result<Vec<JournalEntry>> {
    rows.into_iter().map(JournalEntry::try_from).collect()
}

pub struct PgEntryRepository {
    pool: PgPool,
}

impl PgEntryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `journal_entries` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE_SQL).execute(&self.pool).await?;
        sqlx::query(CREATE_INDEX_SQL).execute(&self.pool).await?;
        debug!("journal_entries schema ensured");
        Ok(())
    }

    async fn insert(&self, entry: &JournalEntry) -> Result<()> {
        let (content, media_url, thumbnail_url, duration, report) = match &entry.kind {
            EntryKind::Text(t) => (Some(t.content.clone()), None, None, None, None),
            EntryKind::Video(v) => (
                None,
                Some(v.media_url.clone()),
                Some(v.thumbnail_url.clone()),
                Some(v.duration_seconds),
                v.emotion_report
                    .as_ref()
                    .map(serde_json::to_value)
                    .transpose()?,
            ),
        };
        let mood = entry
            .mood_metadata
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO journal_entries
                (id, user_id, entry_type, content, media_url, thumbnail_url, duration_seconds,
                 emotion_report, analysis_status, mood_metadata, analysis_error,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(entry.id)
        .bind(entry.owner_id)
        .bind(entry.entry_type().as_str())
        .bind(content)
        .bind(media_url)
        .bind(thumbnail_url)
        .bind(duration)
        .bind(report)
        .bind(entry.analysis_status.as_str())
        .bind(mood)
        .bind(&entry.analysis_error)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl EntryRepository for PgEntryRepository {
    async fn list(&self, owner_id: Uuid) -> Result<Vec<JournalEntry>> {
        let rows: Vec<JournalEntryRow> = sqlx::query_as(
            "SELECT * FROM journal_entries WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        rows_to_entries(rows)
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<JournalEntry>> {
        let row: Option<JournalEntryRow> =
            sqlx::query_as("SELECT * FROM journal_entries WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(JournalEntry::try_from).transpose()
    }

    async fn create(&self, entry: NewEntry) -> Result<JournalEntry> {
        let entry = new_journal_entry(entry, Utc::now());
        self.insert(&entry).await?;
        Ok(entry)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: EntryPatch,
    ) -> Result<Option<JournalEntry>> {
        let mut tx = self.pool.begin().await?;
        let row: Option<JournalEntryRow> = sqlx::query_as(
            "SELECT * FROM journal_entries WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut entry = JournalEntry::try_from(row)?;
        patch.apply(&mut entry, Utc::now());

        let mood = entry
            .mood_metadata
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let report = match &entry.kind {
            EntryKind::Video(v) => v
                .emotion_report
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
            EntryKind::Text(_) => None,
        };

        sqlx::query(
            r#"
            UPDATE journal_entries
            SET analysis_status = $1, mood_metadata = $2, analysis_error = $3,
                emotion_report = $4, updated_at = $5
            WHERE id = $6 AND user_id = $7
            "#,
        )
        .bind(entry.analysis_status.as_str())
        .bind(mood)
        .bind(&entry.analysis_error)
        .bind(report)
        .bind(entry.updated_at)
        .bind(id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Some(entry))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM journal_entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
