use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::admin::models::{AdminChangePasswordDto, AdminUpdateUserDto, UserStatusResponse};
use crate::auth::models::{
    AuthTokenResponse, CreateUserDto, LoginDto, RefreshTokenDto, Role, UpdateProfileDto,
    UserResponseDto,
};
use crate::category::models::{CategoryResponse, CreateCategoryDto, UpdateCategoryDto};
use crate::errors::ErrorResponse;
use crate::models::EntryType;
use crate::stats::models::{
    CategoryBreakdown, PlatformStatistics, RecentTransaction, Share, ShareSlice, UserStatistics,
};
use crate::transaction::models::{CreateTransactionDto, TransactionResponse, UpdateTransactionDto};

/// Security scheme modifier for Bearer token authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT access token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ledger Statistics API",
        version = "1.0.0",
        description = "Personal finance ledger with dashboard statistics and platform reporting",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development server"),
    ),
    tags(
        (name = "Auth", description = "Authentication and user management"),
        (name = "Categories", description = "Ledger categories; the type is fixed at creation"),
        (name = "Transactions", description = "Income, expense and saving entries"),
        (name = "Statistics", description = "Per-user dashboard statistics and chart shares"),
        (name = "Admin", description = "Administrator-only platform reporting and user management")
    ),
    paths(
        // Auth endpoints
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,
        crate::auth::handlers::update_profile,
        // Category endpoints
        crate::category::handlers::list_categories,
        crate::category::handlers::get_category,
        crate::category::handlers::create_category,
        crate::category::handlers::update_category,
        crate::category::handlers::delete_category,
        // Transaction endpoints
        crate::transaction::handlers::list_transactions,
        crate::transaction::handlers::get_transaction,
        crate::transaction::handlers::create_transaction,
        crate::transaction::handlers::update_transaction,
        crate::transaction::handlers::delete_transaction,
        // Statistics endpoints
        crate::stats::handlers::get_statistics,
        crate::stats::handlers::get_category_shares,
        // Admin endpoints
        crate::stats::handlers::get_platform_statistics,
        crate::admin::handlers::list_users,
        crate::admin::handlers::update_user,
        crate::admin::handlers::change_password,
        crate::admin::handlers::toggle_user_status,
        crate::admin::handlers::delete_user,
    ),
    components(
        schemas(
            ErrorResponse,
            EntryType,
            // Auth schemas
            Role,
            CreateUserDto,
            LoginDto,
            RefreshTokenDto,
            UserResponseDto,
            UpdateProfileDto,
            AuthTokenResponse,
            // Admin schemas
            AdminUpdateUserDto,
            AdminChangePasswordDto,
            UserStatusResponse,
            // Category schemas
            CategoryResponse,
            CreateCategoryDto,
            UpdateCategoryDto,
            // Transaction schemas
            TransactionResponse,
            CreateTransactionDto,
            UpdateTransactionDto,
            // Statistics schemas
            UserStatistics,
            RecentTransaction,
            CategoryBreakdown,
            PlatformStatistics,
            Share,
            ShareSlice,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;
