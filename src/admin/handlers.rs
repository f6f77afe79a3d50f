use actix_web::{delete, get, post, put, web, HttpResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::auth::models::UserResponseDto;
use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;

use super::models::{AdminChangePasswordDto, AdminUpdateUserDto, UserIdPath, UserStatusResponse};
use super::service::AdminService;

/// GET /admin/users - User directory
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "Admin",
    responses(
        (status = 200, description = "All users, without credentials", body = Vec<UserResponseDto>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/admin/users")]
pub async fn list_users(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let users = AdminService::list_users(pool.get_ref()).await?;
    let response: Vec<UserResponseDto> = users.iter().map(UserResponseDto::from_user).collect();

    Ok(HttpResponse::Ok().json(response))
}

/// PUT /admin/users/{id} - Change a user's username, email or role
#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    tag = "Admin",
    params(UserIdPath),
    request_body = AdminUpdateUserDto,
    responses(
        (status = 200, description = "Updated user", body = UserResponseDto),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not an administrator, or demoting oneself", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[put("/admin/users/{id}")]
pub async fn update_user(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<UserIdPath>,
    body: web::Json<AdminUpdateUserDto>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let user = AdminService::update_user(pool.get_ref(), auth.user_id, path.id, &body).await?;

    Ok(HttpResponse::Ok().json(UserResponseDto::from_user(&user)))
}

/// POST /admin/change-password - Set a new password for a user
#[utoipa::path(
    post,
    path = "/admin/change-password",
    tag = "Admin",
    request_body = AdminChangePasswordDto,
    responses(
        (status = 200, description = "Password changed and sessions revoked"),
        (status = 400, description = "Password too weak", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/admin/change-password")]
pub async fn change_password(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    body: web::Json<AdminChangePasswordDto>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    AdminService::change_password(pool.get_ref(), body.user_id, &body.new_password).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Password changed successfully"
    })))
}

/// POST /admin/toggle-user-status/{id} - Enable or disable an account
#[utoipa::path(
    post,
    path = "/admin/toggle-user-status/{id}",
    tag = "Admin",
    params(UserIdPath),
    responses(
        (status = 200, description = "New account status", body = UserStatusResponse),
        (status = 403, description = "Not an administrator, or own account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/admin/toggle-user-status/{id}")]
pub async fn toggle_user_status(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<UserIdPath>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let is_active = AdminService::toggle_status(pool.get_ref(), auth.user_id, path.id).await?;

    Ok(HttpResponse::Ok().json(UserStatusResponse::new(is_active)))
}

/// DELETE /admin/users/{id} - Delete a user and everything they own
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    tag = "Admin",
    params(UserIdPath),
    responses(
        (status = 204, description = "User, categories and transactions deleted"),
        (status = 403, description = "Not an administrator, or own account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[delete("/admin/users/{id}")]
pub async fn delete_user(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<UserIdPath>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    AdminService::delete_user(pool.get_ref(), auth.user_id, path.id).await?;

    Ok(HttpResponse::NoContent().finish())
}
