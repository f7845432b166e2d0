//! Utilization-based interest model for the validator pool.
//!
//! All rates are `Decimal` fixed-point values (18 fractional digits) and all
//! amounts are `Uint128`. Products are floored and every operation is
//! checked; an overflow is returned as an error, never wrapped.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{
    CheckedFromRatioError, CheckedMultiplyFractionError, Decimal, OverflowError, Uint128,
};
use thiserror::Error;

/// Slope of the borrowing rate against utilization (45%)
pub const MULTIPLIER: Decimal = Decimal::percent(45);
/// Borrowing rate at zero utilization (5%)
pub const BASE_RATE: Decimal = Decimal::percent(5);
/// Share of interest kept by the owner before validators are paid (10%)
pub const SPREAD: Decimal = Decimal::percent(10);

#[derive(Debug, Error, PartialEq)]
pub enum InterestError {
    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("{0}")]
    Ratio(#[from] CheckedFromRatioError),

    #[error("{0}")]
    MultiplyFraction(#[from] CheckedMultiplyFractionError),
}

/// Fee owed for one borrow, split between validators and the owner
#[cw_serde]
#[derive(Default)]
pub struct FeeSplit {
    /// Total fee charged to the exit
    pub borrower_fee: Uint128,
    /// Part of the fee distributed to validators by stake
    pub validators_fee: Uint128,
    /// Remainder kept by the owner treasury
    pub owner_fee: Uint128,
}

#[cw_serde]
pub struct InterestModel {
    pub multiplier: Decimal,
    pub base_rate: Decimal,
    pub spread: Decimal,
}

impl Default for InterestModel {
    fn default() -> Self {
        Self {
            multiplier: MULTIPLIER,
            base_rate: BASE_RATE,
            spread: SPREAD,
        }
    }
}

impl InterestModel {
    /// `total_borrowed / total_supply`, zero for an empty pool
    pub fn utilization(
        &self,
        total_supply: Uint128,
        total_borrowed: Uint128,
    ) -> Result<Decimal, InterestError> {
        if total_supply.is_zero() {
            return Ok(Decimal::zero());
        }
        Ok(Decimal::checked_from_ratio(total_borrowed, total_supply)?)
    }

    /// `MULTIPLIER * u + BASE_RATE`
    pub fn borrowing_rate(&self, utilization: Decimal) -> Result<Decimal, InterestError> {
        Ok(self
            .multiplier
            .checked_mul(utilization)?
            .checked_add(self.base_rate)?)
    }

    /// `borrowing_rate * u * (1 - SPREAD)`
    pub fn supply_rate(&self, utilization: Decimal) -> Result<Decimal, InterestError> {
        let kept = Decimal::one().checked_sub(self.spread)?;
        Ok(self
            .borrowing_rate(utilization)?
            .checked_mul(utilization)?
            .checked_mul(kept)?)
    }

    /// Split the fee charged on `amount` at the given utilization
    pub fn split_fee(
        &self,
        amount: Uint128,
        utilization: Decimal,
    ) -> Result<FeeSplit, InterestError> {
        let borrower_fee = amount.checked_mul_floor(self.borrowing_rate(utilization)?)?;
        let validators_fee = borrower_fee.checked_mul_floor(self.supply_rate(utilization)?)?;
        let owner_fee = borrower_fee.checked_sub(validators_fee)?;

        Ok(FeeSplit {
            borrower_fee,
            validators_fee,
            owner_fee,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization_of_empty_pool_is_zero() {
        let model = InterestModel::default();
        assert_eq!(
            model.utilization(Uint128::zero(), Uint128::zero()).unwrap(),
            Decimal::zero()
        );
    }

    #[test]
    fn test_utilization_is_borrowed_over_supply() {
        let model = InterestModel::default();
        let u = model
            .utilization(Uint128::new(1000), Uint128::new(250))
            .unwrap();
        assert_eq!(u, Decimal::percent(25));
    }

    #[test]
    fn test_rates_at_half_utilization() {
        let model = InterestModel::default();
        let u = Decimal::percent(50);

        // 0.45 * 0.5 + 0.05
        assert_eq!(model.borrowing_rate(u).unwrap(), Decimal::permille(275));
        // 0.275 * 0.5 * 0.9
        assert_eq!(
            model.supply_rate(u).unwrap(),
            Decimal::from_ratio(12375u128, 100000u128)
        );
    }

    #[test]
    fn test_split_fee_idle_pool_goes_to_owner() {
        let model = InterestModel::default();
        let split = model.split_fee(Uint128::new(300), Decimal::zero()).unwrap();

        assert_eq!(split.borrower_fee, Uint128::new(15));
        assert_eq!(split.validators_fee, Uint128::zero());
        assert_eq!(split.owner_fee, Uint128::new(15));
    }

    #[test]
    fn test_split_fee_floors_and_sums() {
        let model = InterestModel::default();
        let split = model
            .split_fee(Uint128::new(200), Decimal::percent(50))
            .unwrap();

        // floor(200 * 0.275) = 55, floor(55 * 0.12375) = 6
        assert_eq!(split.borrower_fee, Uint128::new(55));
        assert_eq!(split.validators_fee, Uint128::new(6));
        assert_eq!(split.owner_fee, Uint128::new(49));
        assert_eq!(split.validators_fee + split.owner_fee, split.borrower_fee);
    }

    #[test]
    fn test_split_fee_overflow_is_an_error() {
        let model = InterestModel {
            multiplier: Decimal::MAX,
            base_rate: Decimal::MAX,
            spread: SPREAD,
        };
        assert!(model.split_fee(Uint128::MAX, Decimal::one()).is_err());
    }
}
