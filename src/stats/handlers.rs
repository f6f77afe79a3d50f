use actix_web::{get, web, HttpResponse};
use sqlx::PgPool;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;

use super::models::{PlatformStatistics, ShareQuery, ShareSlice, StatsSettings, UserStatistics};
use super::service::StatsService;

/// GET /statistics - Dashboard statistics for the authenticated user
#[utoipa::path(
    get,
    path = "/statistics",
    tag = "Statistics",
    responses(
        (status = 200, description = "Totals, balance, recent activity and per-category breakdown", body = UserStatistics),
        (status = 400, description = "Ledger contains invalid data", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/statistics")]
pub async fn get_statistics(
    pool: web::Data<PgPool>,
    settings: web::Data<StatsSettings>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let stats = StatsService::user_statistics(
        pool.get_ref(),
        auth.user_id,
        settings.recent_transactions_limit,
    )
    .await?;

    Ok(HttpResponse::Ok().json(stats))
}

/// GET /statistics/shares - Chart slices for one entry type
#[utoipa::path(
    get,
    path = "/statistics/shares",
    tag = "Statistics",
    params(ShareQuery),
    responses(
        (status = 200, description = "Slices ordered by total, largest first", body = Vec<ShareSlice>),
        (status = 400, description = "Invalid entry type", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/statistics/shares")]
pub async fn get_category_shares(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    query: web::Query<ShareQuery>,
) -> Result<HttpResponse, AppError> {
    let slices = StatsService::category_shares(pool.get_ref(), auth.user_id, query.entry_type)
        .await?;

    Ok(HttpResponse::Ok().json(slices))
}

/// GET /admin/stats - Platform-wide rollup, administrators only
#[utoipa::path(
    get,
    path = "/admin/stats",
    tag = "Admin",
    responses(
        (status = 200, description = "Platform statistics", body = PlatformStatistics),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/admin/stats")]
pub async fn get_platform_statistics(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let stats = StatsService::platform_statistics(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(stats))
}
