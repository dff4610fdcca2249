use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::MongoDB;
use crate::models::user::{User, UserInfo};
use crate::utils::error::AppError;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// user id (ObjectId hex)
    pub sub: String,
    pub username: String,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
    /// JWT ID
    pub jti: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub age: i32,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub error: bool,
    pub message: String,
    pub user: UserInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "default-secret-change-me".to_string())
}

// Generate JWT token (24h expiry)
pub fn generate_jwt(user: &User) -> Result<String, AppError> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::hours(24)).timestamp() as usize;

    let claims = Claims {
        sub: user.id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        iat,
        exp,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| AppError::Database(format!("Failed to generate token: {}", e)))
}

// Verify JWT signature + expiry
pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidToken)
}

/// Username: 3-30 chars, alphanumeric words separated by single spaces.
fn validate_username(username: &str) -> Result<(), AppError> {
    let trimmed = username.trim();
    if trimmed.len() < 3 || trimmed.len() > 30 {
        return Err(AppError::Validation(
            "Username must be between 3 and 30 characters".to_string(),
        ));
    }
    let valid = trimmed
        .split(' ')
        .all(|word| !word.is_empty() && word.chars().all(|c| c.is_ascii_alphanumeric()));
    if !valid {
        return Err(AppError::Validation(
            "Username may only contain letters, digits and single spaces".to_string(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

// User registration
pub async fn signup(db: &MongoDB, request: &SignupRequest) -> Result<AuthResponse, AppError> {
    validate_username(&request.username)?;
    validate_email(&request.email)?;
    validate_password(&request.password)?;
    if request.age < 1 {
        return Err(AppError::Validation("Age must be a positive number".to_string()));
    }

    let collection = db.collection::<User>("users");

    let existing = collection
        .find_one(doc! { "email": &request.email })
        .await?;
    if existing.is_some() {
        return Err(AppError::Validation(
            "User already exists with this email!".to_string(),
        ));
    }

    let hashed = hash(&request.password, DEFAULT_COST)
        .map_err(|e| AppError::Database(format!("Failed to hash password: {}", e)))?;

    let new_user = User {
        id: ObjectId::new().to_hex(),
        username: request.username.trim().to_string(),
        email: request.email.clone(),
        age: request.age,
        password: Some(hashed),
        // Verification happens before signup via /confirm-email, so accounts
        // are created verified.
        is_email_verified: true,
        reset_token: None,
        reset_token_expiry: None,
        created_at: Utc::now(),
    };

    collection.insert_one(&new_user).await?;

    log::info!("✅ User registered successfully: {}", new_user.email);

    Ok(AuthResponse {
        error: false,
        message: "User registered successfully!".to_string(),
        user: UserInfo::from(&new_user),
        token: None,
    })
}

// User login
pub async fn login(db: &MongoDB, request: &LoginRequest) -> Result<AuthResponse, AppError> {
    validate_email(&request.email)?;
    validate_password(&request.password)?;

    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "email": &request.email })
        .await?
        .ok_or_else(|| AppError::Validation("User not found!".to_string()))?;

    let stored = user
        .password
        .as_deref()
        .ok_or_else(|| AppError::Validation("Invalid credentials!".to_string()))?;

    let valid = verify(&request.password, stored)
        .map_err(|e| AppError::Database(format!("Password verification error: {}", e)))?;
    if !valid {
        return Err(AppError::Validation("Invalid credentials!".to_string()));
    }

    if !user.is_email_verified {
        return Err(AppError::Unauthenticated);
    }

    let token = generate_jwt(&user)?;

    Ok(AuthResponse {
        error: false,
        message: "Logged in successfully!".to_string(),
        user: UserInfo::from(&user),
        token: Some(token),
    })
}

/// Loads the user a verified token refers to. `UserNotFound` when the account
/// has disappeared since the token was minted.
pub async fn find_user_by_id(db: &MongoDB, user_id: &str) -> Result<User, AppError> {
    let collection = db.collection::<User>("users");
    collection
        .find_one(doc! { "_id": user_id })
        .await?
        .ok_or(AppError::UserNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: ObjectId::new().to_hex(),
            username: "test user".to_string(),
            email: "test@example.com".to_string(),
            age: 30,
            password: None,
            is_email_verified: true,
            reset_token: None,
            reset_token_expiry: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_round_trip() {
        let user = sample_user();
        let token = generate_jwt(&user).unwrap();
        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let user = sample_user();
        let iat = (Utc::now() - Duration::hours(48)).timestamp() as usize;
        let exp = (Utc::now() - Duration::hours(24)).timestamp() as usize;
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(get_jwt_secret().as_ref()),
        )
        .unwrap();

        assert_eq!(verify_token(&token).unwrap_err(), AppError::InvalidToken);
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        assert_eq!(verify_token("not.a.jwt").unwrap_err(), AppError::InvalidToken);
    }

    #[test]
    fn test_username_validation() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username("valid name").is_ok());
        assert!(validate_username("bad  doublespace").is_err());
        assert!(validate_username("punct!").is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("nodomain@").is_err());
        assert!(validate_email("noat.com").is_err());
        assert!(validate_email("@example.com").is_err());
    }
}
