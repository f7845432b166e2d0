use cosmwasm_std::{
    Addr, BankMsg, Coin, DepsMut, MessageInfo, Order, Response, StdResult, Storage, Uint128,
};

use crate::error::ContractError;
use crate::helpers::{ensure_owner, ensure_paid};
use crate::registry::load_active_validator;
use crate::state::{Lender, PoolTotals, Validator, CONFIG, POOL, VALIDATORS};

pub fn execute_supply_validator(
    deps: DepsMut,
    info: MessageInfo,
    validator: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let addr = deps.api.addr_validate(&validator)?;
    ensure_paid(&info, &config.pool_denom, amount)?;

    let pool = supply(deps.storage, &addr, amount)?;

    Ok(Response::new()
        .add_attribute("action", "supply_validator")
        .add_attribute("validator", addr)
        .add_attribute("sender", info.sender)
        .add_attribute("amount", amount)
        .add_attribute("total_supply", pool.total_supply))
}

pub fn execute_withdraw_for_validator(
    deps: DepsMut,
    info: MessageInfo,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if amount.is_zero() {
        return Err(ContractError::ZeroAmount {});
    }

    // Deactivated validators may still pull out their balance
    let mut validator = VALIDATORS
        .may_load(deps.storage, &info.sender)?
        .ok_or_else(|| ContractError::ValidatorNotFound {
            id: info.sender.to_string(),
        })?;

    let mut pool = POOL.load(deps.storage)?;
    let withdrawable = validator.supplied.min(pool.available_liquidity());
    if amount > withdrawable {
        return Err(ContractError::InsufficientLiquidity {
            requested: amount.to_string(),
            available: withdrawable.to_string(),
        });
    }

    validator.supplied = validator.supplied.checked_sub(amount)?;
    pool.total_supply = pool.total_supply.checked_sub(amount)?;
    VALIDATORS.save(deps.storage, &info.sender, &validator)?;
    save_pool(deps.storage, &pool)?;

    let send_msg = BankMsg::Send {
        to_address: info.sender.to_string(),
        amount: vec![Coin {
            denom: config.pool_denom,
            amount,
        }],
    };

    Ok(Response::new()
        .add_message(send_msg)
        .add_attribute("action", "withdraw_for_validator")
        .add_attribute("validator", info.sender)
        .add_attribute("amount", amount)
        .add_attribute("remaining", validator.supplied))
}

pub fn execute_withdraw_owner_fees(
    deps: DepsMut,
    info: MessageInfo,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;
    if amount.is_zero() {
        return Err(ContractError::ZeroAmount {});
    }

    let mut pool = POOL.load(deps.storage)?;
    let withdrawable = pool.owner_supply.min(pool.available_liquidity());
    if amount > withdrawable {
        return Err(ContractError::InsufficientLiquidity {
            requested: amount.to_string(),
            available: withdrawable.to_string(),
        });
    }

    pool.owner_supply = pool.owner_supply.checked_sub(amount)?;
    pool.total_supply = pool.total_supply.checked_sub(amount)?;
    save_pool(deps.storage, &pool)?;

    let send_msg = BankMsg::Send {
        to_address: config.owner.to_string(),
        amount: vec![Coin {
            denom: config.pool_denom,
            amount,
        }],
    };

    Ok(Response::new()
        .add_message(send_msg)
        .add_attribute("action", "withdraw_owner_fees")
        .add_attribute("amount", amount)
        .add_attribute("owner_supply", pool.owner_supply))
}

/// Credit `amount` to an active validator's balance and the pool supply
pub fn supply(
    storage: &mut dyn Storage,
    validator: &Addr,
    amount: Uint128,
) -> Result<PoolTotals, ContractError> {
    if amount.is_zero() {
        return Err(ContractError::ZeroAmount {});
    }

    let mut record = load_active_validator(storage, validator)?;
    let mut pool = POOL.load(storage)?;

    record.supplied = record.supplied.checked_add(amount)?;
    pool.total_supply = pool.total_supply.checked_add(amount)?;

    VALIDATORS.save(storage, validator, &record)?;
    save_pool(storage, &pool)?;
    Ok(pool)
}

/// `min(balance, available liquidity)`; unknown validators can withdraw nothing
pub fn withdrawable_amount(storage: &dyn Storage, validator: &Addr) -> StdResult<Uint128> {
    let pool = POOL.load(storage)?;
    let supplied = VALIDATORS
        .may_load(storage, validator)?
        .map(|v| v.supplied)
        .unwrap_or_default();
    Ok(supplied.min(pool.available_liquidity()))
}

/// Add `amount` to a lender's balance and to the pool supply.
/// The caller persists `pool`.
pub fn credit_lender(
    storage: &mut dyn Storage,
    pool: &mut PoolTotals,
    lender: &Lender,
    amount: Uint128,
) -> Result<(), ContractError> {
    if amount.is_zero() {
        return Ok(());
    }
    match lender {
        Lender::Validator { address } => {
            let mut record = load_lender(storage, address)?;
            record.supplied = record.supplied.checked_add(amount)?;
            VALIDATORS.save(storage, address, &record)?;
        }
        Lender::Owner => {
            pool.owner_supply = pool.owner_supply.checked_add(amount)?;
        }
    }
    pool.total_supply = pool.total_supply.checked_add(amount)?;
    Ok(())
}

/// Remove up to `amount` from a lender's balance and the pool supply.
///
/// The debit is clamped to the lender's balance; the amount actually taken
/// is returned. The caller persists `pool`.
pub fn debit_lender(
    storage: &mut dyn Storage,
    pool: &mut PoolTotals,
    lender: &Lender,
    amount: Uint128,
) -> Result<Uint128, ContractError> {
    let debited = match lender {
        Lender::Validator { address } => {
            let mut record = load_lender(storage, address)?;
            let debited = amount.min(record.supplied);
            record.supplied = record.supplied.checked_sub(debited)?;
            VALIDATORS.save(storage, address, &record)?;
            debited
        }
        Lender::Owner => {
            let debited = amount.min(pool.owner_supply);
            pool.owner_supply = pool.owner_supply.checked_sub(debited)?;
            debited
        }
    };
    pool.total_supply = pool.total_supply.checked_sub(debited)?;
    Ok(debited)
}

/// Charge `loss` to every remaining balance in proportion to its size.
///
/// Shares are floored; the rounding remainder is taken from the owner
/// treasury first, then from validators in address order. Returns the part
/// no balance could absorb, which is zero whenever `loss` does not exceed
/// the pool supply. The caller persists `pool`.
pub fn spread_loss(
    storage: &mut dyn Storage,
    pool: &mut PoolTotals,
    loss: Uint128,
) -> Result<Uint128, ContractError> {
    let base = pool.total_supply;
    if loss.is_zero() || base.is_zero() {
        return Ok(loss);
    }

    let validators = VALIDATORS
        .range(storage, None, None, Order::Ascending)
        .map(|item| {
            item.map(|(address, record)| (Lender::Validator { address }, record.supplied))
        });
    let lenders = std::iter::once(Ok((Lender::Owner, pool.owner_supply)))
        .chain(validators)
        .collect::<StdResult<Vec<(Lender, Uint128)>>>()?;

    let mut charged = Uint128::zero();
    for (lender, balance) in &lenders {
        let share = loss.min(base).checked_multiply_ratio(*balance, base)?;
        charged = charged.checked_add(debit_lender(storage, pool, lender, share)?)?;
    }

    let mut rest = loss.checked_sub(charged)?;
    for (lender, _) in &lenders {
        if rest.is_zero() {
            break;
        }
        rest = rest.checked_sub(debit_lender(storage, pool, lender, rest)?)?;
    }
    Ok(rest)
}

/// Persist pool totals, refusing any state where borrowed exceeds supply
pub fn save_pool(storage: &mut dyn Storage, pool: &PoolTotals) -> Result<(), ContractError> {
    if !pool.is_solvent() {
        return Err(ContractError::SolvencyViolation {
            borrowed: pool.total_borrowed.to_string(),
            supply: pool.total_supply.to_string(),
        });
    }
    POOL.save(storage, pool)?;
    Ok(())
}

fn load_lender(storage: &dyn Storage, address: &Addr) -> Result<Validator, ContractError> {
    VALIDATORS
        .may_load(storage, address)?
        .ok_or_else(|| ContractError::UnknownValidator {
            id: address.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::MockStorage;
    use cosmwasm_std::Binary;

    fn seed(storage: &mut dyn Storage, balances: &[(&str, u128)], owner: u128) -> PoolTotals {
        let mut pool = PoolTotals {
            owner_supply: Uint128::new(owner),
            total_supply: Uint128::new(owner),
            ..PoolTotals::default()
        };
        for (name, supplied) in balances {
            VALIDATORS
                .save(
                    storage,
                    &Addr::unchecked(*name),
                    &Validator {
                        active: true,
                        pubkey: Binary::default(),
                        supplied: Uint128::new(*supplied),
                        added_at: 0,
                    },
                )
                .unwrap();
            pool.total_supply += Uint128::new(*supplied);
        }
        pool
    }

    fn balance(storage: &dyn Storage, name: &str) -> Uint128 {
        VALIDATORS
            .load(storage, &Addr::unchecked(name))
            .unwrap()
            .supplied
    }

    #[test]
    fn test_spread_loss_is_proportional() {
        let mut storage = MockStorage::new();
        let mut pool = seed(&mut storage, &[("v1", 300), ("v2", 500)], 200);

        let uncovered = spread_loss(&mut storage, &mut pool, Uint128::new(100)).unwrap();

        assert_eq!(uncovered, Uint128::zero());
        assert_eq!(pool.owner_supply, Uint128::new(180));
        assert_eq!(balance(&storage, "v1"), Uint128::new(270));
        assert_eq!(balance(&storage, "v2"), Uint128::new(450));
        assert_eq!(pool.total_supply, Uint128::new(900));
    }

    #[test]
    fn test_spread_loss_charges_dust_to_owner_first() {
        let mut storage = MockStorage::new();
        let mut pool = seed(&mut storage, &[("v1", 1), ("v2", 1)], 1);

        // floor(2/3) is zero for everyone, the owner takes one, v1 the other
        let uncovered = spread_loss(&mut storage, &mut pool, Uint128::new(2)).unwrap();

        assert_eq!(uncovered, Uint128::zero());
        assert_eq!(pool.owner_supply, Uint128::zero());
        assert_eq!(balance(&storage, "v1"), Uint128::zero());
        assert_eq!(balance(&storage, "v2"), Uint128::new(1));
        assert_eq!(pool.total_supply, Uint128::new(1));
    }

    #[test]
    fn test_spread_loss_beyond_supply_is_uncovered() {
        let mut storage = MockStorage::new();
        let mut pool = seed(&mut storage, &[("v1", 40)], 10);

        let uncovered = spread_loss(&mut storage, &mut pool, Uint128::new(80)).unwrap();

        assert_eq!(uncovered, Uint128::new(30));
        assert_eq!(pool.total_supply, Uint128::zero());
        assert_eq!(balance(&storage, "v1"), Uint128::zero());
    }

    #[test]
    fn test_spread_loss_on_empty_pool() {
        let mut storage = MockStorage::new();
        let mut pool = PoolTotals::default();
        let uncovered = spread_loss(&mut storage, &mut pool, Uint128::new(5)).unwrap();
        assert_eq!(uncovered, Uint128::new(5));
    }
}
