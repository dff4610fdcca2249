use chrono::Utc;
use mongodb::bson::{doc, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::MongoDB;
use crate::models::user::User;
use crate::utils::error::AppError;

const CODE_TTL_SECS: i64 = 5 * 60;

/// Pending email-verification code (`verification_codes` collection).
/// Persisted with a TTL index so pending verifications survive restarts and
/// are shared across instances; one live code per email.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VerificationCode {
    pub email: String,
    pub code: String,
    pub created_at: BsonDateTime,
    pub expires_at: BsonDateTime,
}

/// Derives a 6-digit code from UUID randomness.
fn generate_code() -> String {
    let bytes = *Uuid::new_v4().as_bytes();
    let n = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    format!("{:06}", 100_000 + n % 900_000)
}

/// Issues a fresh code for an email, replacing any pending one. Actual
/// delivery happens outside this service; the code is logged for the
/// dispatcher to pick up.
pub async fn issue_code(db: &MongoDB, email: &str) -> Result<(), AppError> {
    if email.trim().is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }

    let users = db.collection::<User>("users");
    if users.find_one(doc! { "email": email }).await?.is_some() {
        return Err(AppError::Validation("User already exists!".to_string()));
    }

    let code = generate_code();
    let now = Utc::now();
    let record = VerificationCode {
        email: email.to_string(),
        code: code.clone(),
        created_at: BsonDateTime::from_millis(now.timestamp_millis()),
        expires_at: BsonDateTime::from_millis(
            (now + chrono::Duration::seconds(CODE_TTL_SECS)).timestamp_millis(),
        ),
    };

    let codes = db.collection::<VerificationCode>("verification_codes");
    codes.delete_many(doc! { "email": email }).await?;
    codes.insert_one(&record).await?;

    log::info!("📧 Verification code issued for {}: {}", email, code);
    Ok(())
}

/// Checks a record against user input; pure so the branching is testable
/// without a database.
fn check_code(record: &VerificationCode, input: &str, now_millis: i64) -> Result<(), AppError> {
    if now_millis > record.expires_at.timestamp_millis() {
        return Err(AppError::Validation("Code expired".to_string()));
    }
    if record.code != input.trim() {
        return Err(AppError::Validation("Invalid code".to_string()));
    }
    Ok(())
}

/// Verifies and consumes a pending code. Missing, expired and mismatched
/// codes each surface a distinct message.
pub async fn verify_code(db: &MongoDB, email: &str, input: &str) -> Result<(), AppError> {
    if email.trim().is_empty() || input.trim().is_empty() {
        return Err(AppError::Validation("Email and code required".to_string()));
    }

    let codes = db.collection::<VerificationCode>("verification_codes");
    let record = codes
        .find_one(doc! { "email": email })
        .await?
        .ok_or_else(|| AppError::Validation("No code sent".to_string()))?;

    check_code(&record, input, Utc::now().timestamp_millis())?;

    codes.delete_one(doc! { "email": email }).await?;
    log::info!("✅ Email verified: {}", email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, expires_in_millis: i64) -> VerificationCode {
        let now = Utc::now().timestamp_millis();
        VerificationCode {
            email: "a@b.com".to_string(),
            code: code.to_string(),
            created_at: BsonDateTime::from_millis(now),
            expires_at: BsonDateTime::from_millis(now + expires_in_millis),
        }
    }

    #[test]
    fn test_generated_code_is_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..1_000_000).contains(&n));
        }
    }

    #[test]
    fn test_check_code_accepts_match_with_whitespace() {
        let rec = record("123456", 60_000);
        assert!(check_code(&rec, " 123456 ", Utc::now().timestamp_millis()).is_ok());
    }

    #[test]
    fn test_check_code_rejects_expired() {
        let rec = record("123456", -1_000);
        let err = check_code(&rec, "123456", Utc::now().timestamp_millis()).unwrap_err();
        assert_eq!(err, AppError::Validation("Code expired".to_string()));
    }

    #[test]
    fn test_check_code_rejects_mismatch() {
        let rec = record("123456", 60_000);
        let err = check_code(&rec, "654321", Utc::now().timestamp_millis()).unwrap_err();
        assert_eq!(err, AppError::Validation("Invalid code".to_string()));
    }
}
