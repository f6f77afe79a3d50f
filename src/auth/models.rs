use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::errors::AppError;

// ============================================================================
// User Models
// ============================================================================

/// Access level of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Unknown values fall back to the least privileged role
    pub fn from_db(value: &str) -> Self {
        match value {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// Registration settings shared with the auth handlers
#[derive(Debug, Clone, Default)]
pub struct AuthSettings {
    /// Account that is granted the admin role when it registers
    pub admin_email: Option<String>,
}

impl AuthSettings {
    pub fn role_for(&self, email: &str) -> Role {
        match &self.admin_email {
            Some(admin) if admin.eq_ignore_ascii_case(email) => Role::Admin,
            _ => Role::User,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Role {
        Role::from_db(&self.role)
    }

    /// Disabled accounts can neither log in nor refresh their session
    pub fn ensure_active(&self) -> Result<(), AppError> {
        if self.is_active {
            Ok(())
        } else {
            Err(AppError::Forbidden("Account is disabled".to_string()))
        }
    }
}

/// Validate password complexity: at least one uppercase, one lowercase, and one digit
pub(crate) fn validate_password_complexity(password: &str) -> Result<(), ValidationError> {
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_lowercase && has_uppercase && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("password_complexity"))
    }
}

/// Request body for user registration
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    /// Display name
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    #[schema(example = "jdoe")]
    pub username: String,
    /// User's email address
    #[validate(email)]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// Password (min 8 chars, must include uppercase, lowercase, and digit)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[validate(custom(
        function = "validate_password_complexity",
        message = "Password must contain at least one uppercase letter, one lowercase letter, and one number"
    ))]
    #[schema(example = "Password123")]
    pub password: String,
}

/// User information returned in responses
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponseDto {
    /// Unique user identifier
    pub id: Uuid,
    #[schema(example = "jdoe")]
    pub username: String,
    /// User's email address
    #[schema(example = "user@example.com")]
    pub email: String,
    pub role: Role,
    /// Disabled accounts cannot log in
    pub is_active: bool,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl UserResponseDto {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role(),
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// Request body for `PUT /profile`; every field is optional
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    #[schema(example = "jdoe")]
    pub username: Option<String>,
    /// Required when `new_password` is set
    pub current_password: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[validate(custom(
        function = "validate_password_complexity",
        message = "Password must contain at least one uppercase letter, one lowercase letter, and one number"
    ))]
    #[schema(example = "NewPassword123")]
    pub new_password: Option<String>,
}

/// Request body for user login
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginDto {
    /// User's email address
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User's password
    #[schema(example = "Password123")]
    pub password: String,
}

// ============================================================================
// Token Models
// ============================================================================

/// JWT access token claims - short-lived (15 minutes)
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Uuid,        // User ID
    pub email: String,    // User email
    pub username: String, // Display name
    pub role: Role,       // Access level
    pub iat: usize,       // Issued at
    pub exp: usize,       // Expiration
}

/// Refresh token stored in database
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Request body to refresh access token
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshTokenDto {
    /// The refresh token obtained from login
    #[schema(example = "a1b2c3d4e5f6...")]
    pub refresh_token: String,
}

/// Response containing both access and refresh tokens
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthTokenResponse {
    /// JWT access token (short-lived, 15 minutes)
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Refresh token for obtaining new access tokens
    #[schema(example = "a1b2c3d4e5f6...")]
    pub refresh_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: &'static str,
    /// Access token expiry time in seconds
    #[schema(example = 900)]
    pub expires_in: u64,
    /// User information
    pub user: UserResponseDto,
}

impl AuthTokenResponse {
    pub fn new(access_token: String, refresh_token: String, user: &User) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_in: 15 * 60, // 15 minutes
            user: UserResponseDto::from_user(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(username: &str, email: &str, password: &str) -> CreateUserDto {
        CreateUserDto {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(dto("jdoe", "jdoe@example.com", "Password123").validate().is_ok());
    }

    #[test]
    fn test_weak_password_rejected() {
        assert!(dto("jdoe", "jdoe@example.com", "password").validate().is_err());
    }

    #[test]
    fn test_empty_username_rejected() {
        assert!(dto("", "jdoe@example.com", "Password123").validate().is_err());
    }

    #[test]
    fn test_unknown_role_is_user() {
        assert_eq!(Role::from_db("superuser"), Role::User);
        assert_eq!(Role::from_db("admin"), Role::Admin);
    }

    #[test]
    fn test_admin_email_grants_admin_role() {
        let settings = AuthSettings {
            admin_email: Some("Owner@Example.com".to_string()),
        };

        assert_eq!(settings.role_for("owner@example.com"), Role::Admin);
        assert_eq!(settings.role_for("someone@example.com"), Role::User);
        assert_eq!(AuthSettings::default().role_for("owner@example.com"), Role::User);
    }

    #[test]
    fn test_role_db_names_round_trip() {
        for role in [Role::User, Role::Admin] {
            assert_eq!(Role::from_db(role.as_str()), role);
        }
    }

    #[test]
    fn test_disabled_account_is_forbidden() {
        let now = Utc::now();
        let mut user = User {
            id: Uuid::new_v4(),
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            password_hash: String::new(),
            role: "user".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert!(user.ensure_active().is_ok());

        user.is_active = false;
        assert!(matches!(user.ensure_active(), Err(AppError::Forbidden(_))));
        assert!(!UserResponseDto::from_user(&user).is_active);
    }

    #[test]
    fn test_profile_update_validation() {
        let rename: UpdateProfileDto =
            serde_json::from_str(r#"{"username":"renamed"}"#).expect("Should parse");
        assert!(rename.validate().is_ok());

        let weak: UpdateProfileDto = serde_json::from_str(
            r#"{"current_password":"Password123","new_password":"weak"}"#,
        )
        .expect("Should parse");
        assert!(weak.validate().is_err());

        let blank: UpdateProfileDto =
            serde_json::from_str(r#"{"username":""}"#).expect("Should parse");
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Role::Admin).expect("Should serialize"),
            "\"admin\""
        );
    }
}
