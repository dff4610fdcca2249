use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BloodPressure {
    pub systolic: i32,
    pub diastolic: i32,
}

/// One user-entered vitals snapshot (`vitals` collection). All measurements
/// optional; immutable after creation.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<BloodPressure>,
    /// Fasting blood sugar, mg/dL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_sugar: Option<f64>,
    /// Kilograms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<i32>,
    /// Celsius
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddVitalsRequest {
    /// RFC3339; defaults to now
    pub date: Option<DateTime<Utc>>,
    pub blood_pressure: Option<BloodPressure>,
    pub blood_sugar: Option<f64>,
    pub weight: Option<f64>,
    pub heart_rate: Option<i32>,
    pub temperature: Option<f64>,
    pub notes: Option<String>,
}

/// Derived classification returned alongside a stored snapshot.
#[derive(Debug, Serialize, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VitalsStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    pub overall: String,
}
