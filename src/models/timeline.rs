use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::file::File;
use crate::models::insight::PopulatedInsight;
use crate::models::vitals::Vitals;

/// Discriminant tag on a timeline entry.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimelineEntryType {
    File,
    Vitals,
    Insight,
}

/// Payload union; serializes as the bare record, discrimination travels in
/// the sibling `type` field.
#[derive(Debug, Serialize, Clone)]
#[serde(untagged)]
pub enum TimelineData {
    File(File),
    Vitals(Vitals),
    Insight(PopulatedInsight),
}

/// One unified activity-feed entry: `{type, data, date}`, synthesized
/// per-request, never persisted.
#[derive(Debug, Serialize, Clone)]
pub struct TimelineEntry {
    #[serde(rename = "type")]
    pub entry_type: TimelineEntryType,
    pub data: TimelineData,
    pub date: DateTime<Utc>,
    /// Tie-break key for deterministic ordering on equal timestamps
    #[serde(skip_serializing)]
    pub record_id: String,
}

impl TimelineEntry {
    pub fn from_file(file: File) -> Self {
        TimelineEntry {
            entry_type: TimelineEntryType::File,
            date: file.upload_date,
            record_id: file.id.clone(),
            data: TimelineData::File(file),
        }
    }

    pub fn from_vitals(vitals: Vitals) -> Self {
        TimelineEntry {
            entry_type: TimelineEntryType::Vitals,
            date: vitals.date,
            record_id: vitals.id.clone(),
            data: TimelineData::Vitals(vitals),
        }
    }

    pub fn from_insight(insight: PopulatedInsight) -> Self {
        TimelineEntry {
            entry_type: TimelineEntryType::Insight,
            date: insight.created_at,
            record_id: insight.id.clone(),
            data: TimelineData::Insight(insight),
        }
    }
}
