use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::arith::{add, scaled_ratio};
use super::models::{CategoryBreakdown, Share, ShareSlice};
use crate::errors::{AggregationFault, AppError};
use crate::models::EntryType;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;
const FULL_CIRCLE: Decimal = Decimal::from_parts(360, 0, 0, false, 0);

fn to_f64(value: Decimal) -> f64 {
    // Every Decimal is representable (possibly rounded) as f64
    value.to_f64().unwrap_or_default()
}

/// Split a full circle between `values`, preserving their order.
///
/// Precondition: `values` is non-empty, has no negative entry and sums to a
/// positive total. Violations fail with [`AppError::AggregationError`]
/// instead of producing NaN; so does a total outside the decimal range.
///
/// Angles are derived from cumulative sums, so each `start_angle` equals the
/// previous `end_angle` exactly, the first starts at 0 and the last ends at 360.
pub fn derive_shares(values: &[Decimal]) -> Result<Vec<Share>, AppError> {
    if values.iter().any(|v| *v < Decimal::ZERO) {
        return Err(AppError::AggregationError(
            AggregationFault::NegativeShareValue,
        ));
    }

    let total = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| add(acc, *v))?;
    if total <= Decimal::ZERO {
        return Err(AppError::AggregationError(AggregationFault::EmptyOrZeroTotal));
    }

    let mut cumulative = Decimal::ZERO;
    let mut shares = Vec::with_capacity(values.len());
    for value in values {
        let start = scaled_ratio(cumulative, total, FULL_CIRCLE)?;
        cumulative = add(cumulative, *value)?;
        let end = scaled_ratio(cumulative, total, FULL_CIRCLE)?;

        shares.push(Share {
            percentage: to_f64(scaled_ratio(*value, total, HUNDRED)?),
            start_angle: to_f64(start),
            end_angle: to_f64(end),
        });
    }

    Ok(shares)
}

/// Chart slices for the categories of one entry type that have a positive total.
///
/// Slices are ordered by total descending; equal totals keep category id
/// order. Returns an empty list when no category qualifies.
pub fn category_shares(
    by_category: &BTreeMap<Uuid, CategoryBreakdown>,
    entry_type: EntryType,
) -> Result<Vec<ShareSlice>, AppError> {
    let mut entries: Vec<(&Uuid, &CategoryBreakdown)> = by_category
        .iter()
        .filter(|(_, b)| b.category_type == entry_type && b.total > Decimal::ZERO)
        .collect();

    if entries.is_empty() {
        return Ok(Vec::new());
    }

    entries.sort_by(|a, b| b.1.total.cmp(&a.1.total));

    let values: Vec<Decimal> = entries.iter().map(|(_, b)| b.total).collect();
    let shares = derive_shares(&values)?;

    Ok(entries
        .into_iter()
        .zip(shares)
        .map(|((id, breakdown), share)| ShareSlice {
            category_id: *id,
            name: breakdown.name.clone(),
            color: breakdown.color.clone(),
            value: breakdown.total,
            percentage: share.percentage,
            start_angle: share.start_angle,
            end_angle: share.end_angle,
        })
        .collect())
}
