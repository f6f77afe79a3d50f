use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::auth::models::validate_password_complexity;
use crate::auth::Role;

/// Request body for `PUT /admin/users/{id}`; omitted fields stay unchanged
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdminUpdateUserDto {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    #[schema(example = "jdoe")]
    pub username: Option<String>,
    #[validate(email)]
    #[schema(example = "user@example.com")]
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Request body for `POST /admin/change-password`
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdminChangePasswordDto {
    pub user_id: Uuid,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[validate(custom(
        function = "validate_password_complexity",
        message = "Password must contain at least one uppercase letter, one lowercase letter, and one number"
    ))]
    #[schema(example = "Password123")]
    pub new_password: String,
}

/// Result of enabling or disabling an account
#[derive(Debug, Serialize, ToSchema)]
pub struct UserStatusResponse {
    #[schema(example = "User deactivated")]
    pub message: String,
    pub is_active: bool,
}

impl UserStatusResponse {
    pub fn new(is_active: bool) -> Self {
        let message = if is_active {
            "User activated"
        } else {
            "User deactivated"
        };
        Self {
            message: message.to_string(),
            is_active,
        }
    }
}

/// Path parameters for user ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct UserIdPath {
    /// User UUID
    pub id: Uuid,
}
