use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use serde::Deserialize;
use std::collections::HashMap;

use crate::database::MongoDB;
use crate::models::file::File;
use crate::models::insight::{AIInsight, PopulatedInsight};
use crate::models::timeline::TimelineEntry;
use crate::models::vitals::Vitals;
use crate::utils::error::AppError;

/// Optional paging: without parameters the full feed is returned (the
/// historical contract); with them each source query is bounded before the
/// merge so the response stays proportional to `limit`.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct TimelineQuery {
    /// Max entries returned (also bounds each source query)
    pub limit: Option<i64>,
    /// Only entries strictly older than this RFC3339 timestamp
    pub before: Option<DateTime<Utc>>,
}

fn scoped_filter(
    user_id: &str,
    date_field: &str,
    before: Option<&DateTime<Utc>>,
) -> Result<Document, AppError> {
    let mut filter = doc! { "userId": user_id };
    if let Some(ts) = before {
        let bound = mongodb::bson::to_bson(ts)
            .map_err(|e| AppError::Database(format!("Invalid cursor: {}", e)))?;
        filter.insert(date_field, doc! { "$lt": bound });
    }
    Ok(filter)
}

/// Produces the unified activity feed: three independent per-user lookups,
/// each pre-sorted on its native timestamp, tagged and merged newest-first.
/// Any lookup failure aborts the whole aggregation.
pub async fn build_timeline(
    db: &MongoDB,
    user_id: &str,
    query: &TimelineQuery,
) -> Result<Vec<TimelineEntry>, AppError> {
    let limit = query.limit.filter(|l| *l > 0);
    let before = query.before.as_ref();

    let mut files_find = db
        .collection::<File>("files")
        .find(scoped_filter(user_id, "uploadDate", before)?)
        .sort(doc! { "uploadDate": -1 });
    if let Some(l) = limit {
        files_find = files_find.limit(l);
    }
    let files: Vec<File> = files_find.await?.try_collect().await?;

    let mut vitals_find = db
        .collection::<Vitals>("vitals")
        .find(scoped_filter(user_id, "date", before)?)
        .sort(doc! { "date": -1 });
    if let Some(l) = limit {
        vitals_find = vitals_find.limit(l);
    }
    let vitals: Vec<Vitals> = vitals_find.await?.try_collect().await?;

    let mut insights_find = db
        .collection::<AIInsight>("ai_insights")
        .find(scoped_filter(user_id, "createdAt", before)?)
        .sort(doc! { "createdAt": -1 });
    if let Some(l) = limit {
        insights_find = insights_find.limit(l);
    }
    let insights: Vec<AIInsight> = insights_find.await?.try_collect().await?;

    let populated = populate_insights(db, user_id, insights).await?;

    let mut entries = merge_entries(files, vitals, populated);
    if let Some(l) = limit {
        entries.truncate(l as usize);
    }
    Ok(entries)
}

/// Resolves insight file back-references in one batched query. A dangling
/// reference keeps its entry with `fileId: null` rather than failing.
async fn populate_insights(
    db: &MongoDB,
    user_id: &str,
    insights: Vec<AIInsight>,
) -> Result<Vec<PopulatedInsight>, AppError> {
    let file_ids: Vec<String> = insights.iter().filter_map(|i| i.file_id.clone()).collect();

    let mut by_id: HashMap<String, File> = HashMap::new();
    if !file_ids.is_empty() {
        let referenced: Vec<File> = db
            .collection::<File>("files")
            .find(doc! { "_id": { "$in": file_ids }, "userId": user_id })
            .await?
            .try_collect()
            .await?;
        by_id = referenced.into_iter().map(|f| (f.id.clone(), f)).collect();
    }

    Ok(insights
        .into_iter()
        .map(|insight| {
            let file = insight.file_id.as_ref().and_then(|id| by_id.get(id)).cloned();
            PopulatedInsight::new(insight, file)
        })
        .collect())
}

/// Tags and merges the three source lists, newest first. Equal timestamps
/// order deterministically by record id (descending) so repeated calls over
/// the same data always agree.
pub fn merge_entries(
    files: Vec<File>,
    vitals: Vec<Vitals>,
    insights: Vec<PopulatedInsight>,
) -> Vec<TimelineEntry> {
    let mut entries: Vec<TimelineEntry> = files
        .into_iter()
        .map(TimelineEntry::from_file)
        .chain(vitals.into_iter().map(TimelineEntry::from_vitals))
        .chain(insights.into_iter().map(TimelineEntry::from_insight))
        .collect();

    entries.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.record_id.cmp(&a.record_id))
    });
    entries
}
