use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use plagifree_core::traits::*;
use plagifree_core::{HistoryRecord, PlagiError, RewriteMode, RewriteTone};
use serde::{Deserialize, Serialize};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Most records returned by the history listing.
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub id: String,
    pub original_text: String,
    pub rewritten_text: String,
    pub mode: RewriteMode,
    pub tone: RewriteTone,
    pub original_word_count: i64,
    pub rewritten_word_count: i64,
    pub uniqueness_score: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<HistoryRecord> for HistoryItem {
    fn from(r: HistoryRecord) -> Self {
        Self {
            id: r.id,
            original_text: r.original_text,
            rewritten_text: r.rewritten_text,
            mode: r.mode,
            tone: r.tone,
            original_word_count: r.original_word_count,
            rewritten_word_count: r.rewritten_word_count,
            uniqueness_score: r.uniqueness_score,
            timestamp: r.created_at,
        }
    }
}

pub async fn list_history<A, H, P>(
    State(state): State<AppState<A, H, P>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<HistoryItem>>, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    let records = state
        .history_store
        .list_history(&user.account_id, HISTORY_LIMIT)
        .await?;
    Ok(Json(records.into_iter().map(HistoryItem::from).collect()))
}

async fn owned_record<A, H, P>(
    state: &AppState<A, H, P>,
    account_id: &str,
    id: &str,
) -> Result<HistoryRecord, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    state
        .history_store
        .get_history(account_id, id)
        .await?
        .ok_or_else(|| PlagiError::NotFound("History item not found".to_string()).into())
}

pub async fn get_history_item<A, H, P>(
    State(state): State<AppState<A, H, P>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<HistoryItem>, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    let record = owned_record(&state, &user.account_id, &id).await?;
    Ok(Json(record.into()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Md,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

impl ExportFormat {
    fn parse(raw: Option<&str>) -> Result<Self, ApiError> {
        match raw.unwrap_or("txt") {
            "txt" => Ok(ExportFormat::Txt),
            "md" => Ok(ExportFormat::Md),
            other => Err(ApiError::invalid_request(format!(
                "Unsupported export format: {other}. Choose from: txt, md"
            ))),
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Txt => "text/plain; charset=utf-8",
            ExportFormat::Md => "text/markdown; charset=utf-8",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Md => "md",
        }
    }
}

/// Render a history record as a standalone document.
pub fn render_export(record: &HistoryRecord, format: ExportFormat) -> String {
    let timestamp = record.created_at.format("%Y-%m-%d %H:%M:%S UTC");
    match format {
        ExportFormat::Txt => format!(
            "PlagiFree AI Rewrite\n\
             Mode: {}\nTone: {}\nDate: {timestamp}\nUniqueness: {:.1}%\n\n\
             ORIGINAL TEXT ({} words)\n\n{}\n\n\
             REWRITTEN TEXT ({} words)\n\n{}\n",
            record.mode,
            record.tone,
            record.uniqueness_score,
            record.original_word_count,
            record.original_text,
            record.rewritten_word_count,
            record.rewritten_text,
        ),
        ExportFormat::Md => format!(
            "# PlagiFree AI Rewrite\n\n\
             - **Mode:** {}\n- **Tone:** {}\n- **Date:** {timestamp}\n- **Uniqueness:** {:.1}%\n\n\
             ## Original text ({} words)\n\n{}\n\n\
             ## Rewritten text ({} words)\n\n{}\n",
            record.mode,
            record.tone,
            record.uniqueness_score,
            record.original_word_count,
            record.original_text,
            record.rewritten_word_count,
            record.rewritten_text,
        ),
    }
}

pub async fn export_history_item<A, H, P>(
    State(state): State<AppState<A, H, P>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    let format = ExportFormat::parse(query.format.as_deref())?;
    let record = owned_record(&state, &user.account_id, &id).await?;

    let disposition = format!(
        "attachment; filename=\"plagifree-rewrite-{}.{}\"",
        record.id,
        format.extension()
    );
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        render_export(&record, format),
    )
        .into_response())
}
