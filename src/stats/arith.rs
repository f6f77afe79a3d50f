use rust_decimal::Decimal;

use crate::errors::{AggregationFault, AppError};

fn overflow() -> AppError {
    AppError::AggregationError(AggregationFault::Overflow)
}

pub(crate) fn add(a: Decimal, b: Decimal) -> Result<Decimal, AppError> {
    a.checked_add(b).ok_or_else(overflow)
}

pub(crate) fn sub(a: Decimal, b: Decimal) -> Result<Decimal, AppError> {
    a.checked_sub(b).ok_or_else(overflow)
}

/// `part / total * factor`; dividing first keeps the intermediate within `factor`
pub(crate) fn scaled_ratio(
    part: Decimal,
    total: Decimal,
    factor: Decimal,
) -> Result<Decimal, AppError> {
    part.checked_div(total)
        .and_then(|ratio| ratio.checked_mul(factor))
        .ok_or_else(overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_overflow_is_aggregation_error() {
        assert!(matches!(
            add(Decimal::MAX, Decimal::ONE),
            Err(AppError::AggregationError(AggregationFault::Overflow))
        ));
    }

    #[test]
    fn test_sub_overflow_is_aggregation_error() {
        assert!(sub(Decimal::MIN, Decimal::ONE).is_err());
        assert_eq!(
            sub(Decimal::TEN, Decimal::ONE).expect("Should subtract"),
            Decimal::from(9)
        );
    }

    #[test]
    fn test_scaled_ratio_of_huge_values() {
        let huge: Decimal = "300000000000000000000000000".parse().expect("decimal");
        assert_eq!(
            scaled_ratio(huge, huge, Decimal::ONE_HUNDRED).expect("Should scale"),
            Decimal::ONE_HUNDRED
        );
    }
}
