use std::collections::BTreeMap;

use cosmwasm_std::{
    BankMsg, Coin, CosmosMsg, DepsMut, HexBinary, MessageInfo, Order, QuerierWrapper, Response,
    StdResult, Storage, Uint128,
};
use cw_storage_plus::PrefixBound;

use crate::collaborators::{query_token_denom, repay_msg, try_withdraw_msg};
use crate::error::ContractError;
use crate::helpers::{ensure_paid, ensure_same_len};
use crate::pool::{credit_lender, debit_lender, save_pool, spread_loss};
use crate::state::{
    Config, ExitOrder, ExitOrderStatus, PoolTotals, SettlementOutcome, BORROW_ORDERS, CONFIG,
    DEFERRED_ORDERS, EXIT_ORDERS, LAST_VERIFIED_BLOCK, POOL, VALIDATORS,
};

/// Repaid funds not yet claimed by a settled exit, by denom
type RepaidFunds = BTreeMap<String, Uint128>;

/// Outcome of charging a failed exit to its lenders
struct Charge {
    /// Loss taken from lenders other than the ones that lent
    spread: Uint128,
    /// Loss no balance in the pool could absorb
    uncovered: Uint128,
}

#[allow(clippy::too_many_arguments)]
pub fn execute_new_verified_block(
    deps: DepsMut,
    info: MessageInfo,
    block_number: u64,
    validators: Vec<String>,
    succeeded_hashes: Vec<HexBinary>,
    failed_hashes: Vec<HexBinary>,
    repaid_denoms: Vec<String>,
    repaid_amounts: Vec<Uint128>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.rollup {
        return Err(ContractError::Unauthorized {});
    }

    ensure_same_len("repaid_denoms", &repaid_denoms, "repaid_amounts", &repaid_amounts)?;
    let mut repaid = collect_repaid_funds(&info, &repaid_denoms, &repaid_amounts)?;

    for validator in &validators {
        let addr = deps.api.addr_validate(validator)?;
        if !VALIDATORS.has(deps.storage, &addr) {
            return Err(ContractError::UnknownValidator {
                id: validator.clone(),
            });
        }
    }

    let last_verified = LAST_VERIFIED_BLOCK.load(deps.storage)?;
    if block_number <= last_verified {
        return Err(ContractError::BlockAlreadyVerified {
            block_number,
            last_verified,
        });
    }

    let mut pool = POOL.load(deps.storage)?;
    let mut messages: Vec<CosmosMsg> = vec![];
    let mut repaid_count = 0u64;
    let mut punished_count = 0u64;
    let mut skipped_count = 0u64;
    let mut spread_loss_total = Uint128::zero();
    let mut uncovered_loss = Uint128::zero();

    for hash in &succeeded_hashes {
        match settle_succeeded(
            deps.storage,
            &deps.querier,
            &config,
            &mut pool,
            &mut repaid,
            block_number,
            hash.as_slice(),
        )? {
            Some(repay) => {
                messages.push(repay);
                repaid_count += 1;
            }
            None => skipped_count += 1,
        }
    }

    for hash in &failed_hashes {
        match settle_failed(deps.storage, &mut pool, block_number, hash.as_slice())? {
            Some(charge) => {
                spread_loss_total = spread_loss_total.checked_add(charge.spread)?;
                uncovered_loss = uncovered_loss.checked_add(charge.uncovered)?;
                punished_count += 1;
            }
            None => skipped_count += 1,
        }
    }

    save_pool(deps.storage, &pool)?;
    LAST_VERIFIED_BLOCK.save(deps.storage, &block_number)?;

    // Whatever is still deferred up to this block goes through the normal exit
    let deferred = DEFERRED_ORDERS
        .prefix_range(
            deps.storage,
            Some(PrefixBound::exclusive(last_verified)),
            Some(PrefixBound::inclusive(block_number)),
            Order::Ascending,
        )
        .map(|item| item.map(|(key, _)| key))
        .collect::<StdResult<Vec<(u64, Vec<u8>)>>>()?;
    for (order_block, hash) in &deferred {
        let order = EXIT_ORDERS.load(deps.storage, hash)?;
        messages.push(try_withdraw_msg(
            &config,
            order.block_number,
            order.withdraw_op_offset,
            hash,
        )?);
        DEFERRED_ORDERS.remove(deps.storage, (*order_block, hash.as_slice()));
    }

    // Repayments no settled exit claimed go back to the rollup
    let refund: Vec<Coin> = repaid
        .into_iter()
        .filter(|(_, amount)| !amount.is_zero())
        .map(|(denom, amount)| Coin { denom, amount })
        .collect();
    let refunded = if refund.is_empty() {
        "none".to_string()
    } else {
        refund
            .iter()
            .map(|coin| coin.to_string())
            .collect::<Vec<_>>()
            .join(",")
    };
    if !refund.is_empty() {
        messages.push(
            BankMsg::Send {
                to_address: info.sender.to_string(),
                amount: refund,
            }
            .into(),
        );
    }

    Ok(Response::new()
        .add_messages(messages)
        .add_attribute("action", "new_verified_block")
        .add_attribute("block_number", block_number.to_string())
        .add_attribute("validators", validators.len().to_string())
        .add_attribute("repaid", repaid_count.to_string())
        .add_attribute("punished", punished_count.to_string())
        .add_attribute("skipped", skipped_count.to_string())
        .add_attribute("retried", deferred.len().to_string())
        .add_attribute("refunded", refunded)
        .add_attribute("spread_loss", spread_loss_total)
        .add_attribute("uncovered_loss", uncovered_loss)
        .add_attribute("total_supply", pool.total_supply)
        .add_attribute("total_borrowed", pool.total_borrowed))
}

/// Check the attached funds are exactly the declared repayments
fn collect_repaid_funds(
    info: &MessageInfo,
    denoms: &[String],
    amounts: &[Uint128],
) -> Result<RepaidFunds, ContractError> {
    let mut declared = RepaidFunds::new();
    for (denom, amount) in denoms.iter().zip(amounts) {
        let entry = declared.entry(denom.clone()).or_default();
        *entry = entry.checked_add(*amount)?;
    }

    if let Some(coin) = info
        .funds
        .iter()
        .find(|coin| !declared.contains_key(&coin.denom))
    {
        return Err(ContractError::InvalidFunds {
            expected: format!("0{}", coin.denom),
            got: coin.to_string(),
        });
    }
    for (denom, amount) in &declared {
        ensure_paid(info, denom, *amount)?;
    }

    Ok(declared)
}

/// Take `amount` of `denom` out of the repaid funds
fn claim_repaid(
    repaid: &mut RepaidFunds,
    denom: &str,
    amount: Uint128,
) -> Result<(), ContractError> {
    let available = repaid.get(denom).copied().unwrap_or_default();
    let remaining = available
        .checked_sub(amount)
        .map_err(|_| ContractError::InsufficientFunds {
            required: format!("{}{}", amount, denom),
            provided: format!("{}{}", available, denom),
        })?;
    repaid.insert(denom.to_string(), remaining);
    Ok(())
}

/// Return the loan plus fees to every lender of a succeeded exit.
///
/// The repaid funds must hold the borrowed liquidity plus the borrower fee
/// in the pool denom, and the delivered tokens for the money market.
/// Returns the money-market repayment, or `None` if the hash has no
/// fulfilled, unsettled order in a block up to `block_number`.
fn settle_succeeded(
    storage: &mut dyn Storage,
    querier: &QuerierWrapper,
    config: &Config,
    pool: &mut PoolTotals,
    repaid: &mut RepaidFunds,
    block_number: u64,
    hash: &[u8],
) -> Result<Option<CosmosMsg>, ContractError> {
    let Some(mut order) = EXIT_ORDERS.may_load(storage, hash)? else {
        return Ok(None);
    };
    if !is_settleable(&order, block_number) {
        return Ok(None);
    }

    let owed = order.amount_borrowed.checked_add(order.borrower_fee)?;
    claim_repaid(repaid, &config.pool_denom, owed)?;
    let denom = query_token_denom(querier, config, order.token_id)?;
    claim_repaid(repaid, &denom, order.token_amount)?;

    let borrow_orders = BORROW_ORDERS.may_load(storage, hash)?.unwrap_or_default();
    for borrow in &borrow_orders {
        credit_lender(storage, pool, &borrow.lender, borrow.fee_amount)?;
        pool.total_borrowed = pool.total_borrowed.checked_sub(borrow.borrowed_amount)?;
    }

    order.settlement = Some(SettlementOutcome::Succeeded { block_number });
    EXIT_ORDERS.save(storage, hash, &order)?;
    BORROW_ORDERS.remove(storage, hash);

    let repay = repay_msg(
        config,
        hash,
        Coin {
            denom,
            amount: order.token_amount,
        },
    )?;
    Ok(Some(repay))
}

/// Charge the loan of a failed exit to its lenders.
///
/// Each lender loses at most its balance; whatever that leaves unpaid is
/// spread over every remaining balance, so supply always shrinks by the
/// full loan. `None` if the hash has no fulfilled, unsettled order in a
/// block up to `block_number`.
fn settle_failed(
    storage: &mut dyn Storage,
    pool: &mut PoolTotals,
    block_number: u64,
    hash: &[u8],
) -> Result<Option<Charge>, ContractError> {
    let Some(mut order) = EXIT_ORDERS.may_load(storage, hash)? else {
        return Ok(None);
    };
    if !is_settleable(&order, block_number) {
        return Ok(None);
    }

    let mut shortfall = Uint128::zero();
    let borrow_orders = BORROW_ORDERS.may_load(storage, hash)?.unwrap_or_default();
    for borrow in &borrow_orders {
        let debited = debit_lender(storage, pool, &borrow.lender, borrow.borrowed_amount)?;
        shortfall = shortfall.checked_add(borrow.borrowed_amount.checked_sub(debited)?)?;
        pool.total_borrowed = pool.total_borrowed.checked_sub(borrow.borrowed_amount)?;
    }
    let uncovered = spread_loss(storage, pool, shortfall)?;

    order.settlement = Some(SettlementOutcome::Failed { block_number });
    EXIT_ORDERS.save(storage, hash, &order)?;
    BORROW_ORDERS.remove(storage, hash);

    Ok(Some(Charge {
        spread: shortfall.checked_sub(uncovered)?,
        uncovered,
    }))
}

/// Fulfilled, not yet settled, and in a block this report covers
fn is_settleable(order: &ExitOrder, block_number: u64) -> bool {
    order.status == ExitOrderStatus::Fulfilled
        && order.settlement.is_none()
        && order.block_number <= block_number
}
