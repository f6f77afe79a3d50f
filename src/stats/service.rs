use std::collections::BTreeMap;

use futures::future::try_join_all;
use sqlx::{PgPool, Postgres};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::aggregator::Aggregator;
use super::models::{LedgerSnapshot, PlatformStatistics, ShareSlice, UserStatistics};
use super::platform::PlatformTotals;
use super::share::category_shares;
use super::validation::validate_snapshot;
use crate::category::models::Category;
use crate::errors::AppError;
use crate::models::EntryType;
use crate::transaction::models::Transaction;

/// Users per blocking task when folding the platform rollup
const PLATFORM_CHUNK_SIZE: usize = 256;

const CATEGORY_SELECT: &str = "SELECT id, owner_id, name, category_type, color_hex, created_at, updated_at \
     FROM categories";
const TRANSACTION_SELECT: &str = "SELECT id, owner_id, category_id, transaction_type, amount, \
     description, transaction_date, created_at, updated_at FROM transactions";

/// Reporting service: loads snapshots from the ledger and runs the engine on them.
/// Every call recomputes from current data.
pub struct StatsService;

impl StatsService {
    async fn begin_snapshot(pool: &PgPool) -> Result<sqlx::Transaction<'_, Postgres>, AppError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        // Both reads must observe the same committed state
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(tx)
    }

    /// Load one consistent snapshot of a user's ledger in insertion order.
    #[instrument(skip(pool), fields(%user_id))]
    pub async fn load_snapshot(pool: &PgPool, user_id: Uuid) -> Result<LedgerSnapshot, AppError> {
        let mut tx = Self::begin_snapshot(pool).await?;

        let categories = sqlx::query_as::<_, Category>(&format!(
            "{CATEGORY_SELECT} WHERE owner_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            "{TRANSACTION_SELECT} WHERE owner_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        debug!(
            categories = categories.len(),
            transactions = transactions.len(),
            "Loaded ledger snapshot"
        );
        Ok(LedgerSnapshot::new(user_id, categories, transactions))
    }

    /// Dashboard statistics for one user.
    #[instrument(skip(pool), fields(%user_id))]
    pub async fn user_statistics(
        pool: &PgPool,
        user_id: Uuid,
        recent_limit: usize,
    ) -> Result<UserStatistics, AppError> {
        let snapshot = Self::load_snapshot(pool, user_id).await?;
        validate_snapshot(&snapshot)?;

        Aggregator::new(recent_limit).compute(&snapshot.categories, &snapshot.transactions)
    }

    /// Chart slices for one entry type of a user's ledger.
    #[instrument(skip(pool), fields(%user_id, entry_type = entry_type.as_str()))]
    pub async fn category_shares(
        pool: &PgPool,
        user_id: Uuid,
        entry_type: EntryType,
    ) -> Result<Vec<ShareSlice>, AppError> {
        let snapshot = Self::load_snapshot(pool, user_id).await?;
        validate_snapshot(&snapshot)?;

        let stats = Aggregator::default().compute(&snapshot.categories, &snapshot.transactions)?;
        category_shares(&stats.by_category, entry_type)
    }

    /// Load every user's ledger, grouped per owner, plus the user count.
    async fn load_platform(pool: &PgPool) -> Result<(Vec<LedgerSnapshot>, u64), AppError> {
        let mut tx = Self::begin_snapshot(pool).await?;

        let user_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let categories = sqlx::query_as::<_, Category>(&format!(
            "{CATEGORY_SELECT} ORDER BY owner_id, created_at ASC, id ASC"
        ))
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            "{TRANSACTION_SELECT} ORDER BY owner_id, created_at ASC, id ASC"
        ))
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let mut ledgers: BTreeMap<Uuid, LedgerSnapshot> = BTreeMap::new();
        for category in categories {
            ledgers
                .entry(category.owner_id)
                .or_insert_with(|| LedgerSnapshot::new(category.owner_id, Vec::new(), Vec::new()))
                .categories
                .push(category);
        }
        for transaction in transactions {
            ledgers
                .entry(transaction.owner_id)
                .or_insert_with(|| {
                    LedgerSnapshot::new(transaction.owner_id, Vec::new(), Vec::new())
                })
                .transactions
                .push(transaction);
        }

        let user_count = u64::try_from(user_count)
            .map_err(|e| AppError::InternalError(format!("Invalid user count: {e}")))?;

        Ok((ledgers.into_values().collect(), user_count))
    }

    /// Platform rollup for administrators.
    ///
    /// Users are folded in independent chunks on the blocking pool and the
    /// partial totals merged afterwards; the merge is order-independent.
    #[instrument(skip(pool))]
    pub async fn platform_statistics(pool: &PgPool) -> Result<PlatformStatistics, AppError> {
        let (snapshots, user_count) = Self::load_platform(pool).await?;
        for snapshot in &snapshots {
            validate_snapshot(snapshot)?;
        }

        let ledger_count = snapshots.len();
        let mut chunks: Vec<Vec<LedgerSnapshot>> = Vec::new();
        let mut remaining = snapshots.into_iter().peekable();
        while remaining.peek().is_some() {
            chunks.push(remaining.by_ref().take(PLATFORM_CHUNK_SIZE).collect());
        }

        let tasks = chunks.into_iter().map(|chunk| {
            tokio::task::spawn_blocking(move || PlatformTotals::from_snapshots(&chunk))
        });

        let partials = try_join_all(tasks)
            .await
            .map_err(|e| AppError::InternalError(format!("Rollup task failed: {e}")))?;
        let totals = PlatformTotals::combine(
            partials
                .into_iter()
                .collect::<Result<Vec<PlatformTotals>, AppError>>()?,
        )?;

        info!(
            users = user_count,
            ledgers = ledger_count,
            transactions = totals.transactions,
            "Computed platform statistics"
        );
        Ok(totals.into_statistics(user_count))
    }
}
