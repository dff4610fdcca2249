use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account document (`users` collection).
///
/// `_id` is an ObjectId hex string so identifiers travel as plain hex in
/// every JSON payload.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub age: i32,
    /// bcrypt hash; stripped before anything user-facing via `UserInfo`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub is_email_verified: bool,
    // Password-reset bookkeeping; the reset flow itself is handled outside
    // this service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Sanitized user view returned by auth endpoints. Never carries the hash.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub age: i32,
    pub is_email_verified: bool,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        UserInfo {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            age: user.age,
            is_email_verified: user.is_email_verified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_info_never_serializes_password() {
        let user = User {
            id: "64a1f0c2e4b0a1b2c3d4e5f6".to_string(),
            username: "ayesha".to_string(),
            email: "ayesha@example.com".to_string(),
            age: 29,
            password: Some("$2b$10$hash".to_string()),
            is_email_verified: true,
            reset_token: None,
            reset_token_expiry: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(UserInfo::from(&user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["_id"], "64a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(json["isEmailVerified"], true);
    }
}
