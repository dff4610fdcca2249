use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of an uploaded medical document.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Report,
    Prescription,
    Image,
    Other,
}

impl Default for FileType {
    fn default() -> Self {
        FileType::Report
    }
}

impl FileType {
    /// Parses the multipart `fileType` form field; unknown values fall back
    /// to `report`, the historical default.
    pub fn parse(value: &str) -> Self {
        match value {
            "prescription" => FileType::Prescription,
            "image" => FileType::Image,
            "other" => FileType::Other,
            _ => FileType::Report,
        }
    }
}

/// Uploaded medical report document (`files` collection). Immutable after
/// creation; owned exclusively by one user.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    /// Stored name on disk (timestamp-prefixed)
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    /// Local path under the upload dir
    pub url: String,
    #[serde(default)]
    pub file_type: FileType,
    pub upload_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_parse_defaults_to_report() {
        assert_eq!(FileType::parse("prescription"), FileType::Prescription);
        assert_eq!(FileType::parse("image"), FileType::Image);
        assert_eq!(FileType::parse("other"), FileType::Other);
        assert_eq!(FileType::parse("bogus"), FileType::Report);
        assert_eq!(FileType::parse(""), FileType::Report);
    }

    #[test]
    fn test_file_serializes_camel_case() {
        let file = File {
            id: "64a1f0c2e4b0a1b2c3d4e5f6".to_string(),
            user_id: "64a1f0c2e4b0a1b2c3d4e5f7".to_string(),
            filename: "1722950000000-cbc.pdf".to_string(),
            original_name: "cbc.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size: 10240,
            url: "uploads/1722950000000-cbc.pdf".to_string(),
            file_type: FileType::Report,
            upload_date: Utc::now(),
        };
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["_id"], "64a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(json["originalName"], "cbc.pdf");
        assert_eq!(json["mimeType"], "application/pdf");
        assert_eq!(json["fileType"], "report");
        assert!(json.get("uploadDate").is_some());
    }
}
