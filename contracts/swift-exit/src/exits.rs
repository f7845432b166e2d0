use std::collections::BTreeSet;

use cosmwasm_std::{
    Addr, Binary, CosmosMsg, Decimal, Deps, DepsMut, Env, Event, HexBinary, MessageInfo, Response,
    Storage, Uint128,
};
use swift_exit_types::{FeeSplit, InterestModel, SwiftExitRequest};

use crate::collaborators::{
    exchange_msg, order_exit_msg, query_amount_needed, try_withdraw_msg, AmountNeededResponse,
};
use crate::error::ContractError;
use crate::helpers::{ensure_owner, ensure_paid, ensure_same_len, validate_withdraw_hash};
use crate::pool::{save_pool, supply};
use crate::registry::get_pubkeys;
use crate::state::{
    BorrowOrder, Config, ExitOrder, ExitOrderStatus, Lender, PoolTotals, BORROW_ORDERS, CONFIG,
    DEFERRED_ORDERS, EXIT_ORDERS, LAST_VERIFIED_BLOCK, POOL, VALIDATORS, VALIDATOR_LIST,
};

pub const UPDATED_EXIT_ORDER_EVENT: &str = "updated_exit_order";

pub fn execute_add_swift_exit(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    request: SwiftExitRequest,
    signatures: Vec<Binary>,
    validators: Vec<String>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;
    validate_withdraw_hash(&request.withdraw_hash)?;
    if request.token_amount.is_zero() {
        return Err(ContractError::ZeroAmount {});
    }
    let recipient = deps.api.addr_validate(&request.recipient)?;

    verify_request_signatures(
        deps.as_ref(),
        &env,
        &config,
        &request,
        &signatures,
        &validators,
    )?;

    let hash = request.withdraw_hash.as_slice();
    if let Some(existing) = EXIT_ORDERS.may_load(deps.storage, hash)? {
        if existing.status != ExitOrderStatus::New {
            return Err(ContractError::DuplicateOrder {
                hash: request.withdraw_hash.to_hex(),
            });
        }
    }

    // Funds of a verified block are already withdrawable, the pool stays out
    let last_verified = LAST_VERIFIED_BLOCK.load(deps.storage)?;
    if request.block_number <= last_verified {
        let withdraw = try_withdraw_msg(
            &config,
            request.block_number,
            request.withdraw_op_offset,
            hash,
        )?;
        return Ok(Response::new()
            .add_message(withdraw)
            .add_attribute("action", "add_swift_exit")
            .add_attribute("withdraw_hash", request.withdraw_hash.to_hex())
            .add_attribute("block_number", request.block_number.to_string())
            .add_attribute("status", "already_verified"));
    }

    let needed = query_amount_needed(
        &deps.querier,
        &config,
        request.token_id,
        request.token_amount,
    )?;

    let mut order = ExitOrder {
        status: ExitOrderStatus::New,
        block_number: request.block_number,
        withdraw_op_offset: request.withdraw_op_offset,
        token_id: request.token_id,
        requested_amount: request.token_amount,
        token_amount: Uint128::zero(),
        recipient,
        amount_borrowed: Uint128::zero(),
        borrower_fee: Uint128::zero(),
        settlement: None,
        created_at: env.block.height,
    };

    let response = Response::new()
        .add_attribute("action", "add_swift_exit")
        .add_attribute("withdraw_hash", request.withdraw_hash.to_hex())
        .add_attribute("block_number", request.block_number.to_string());

    fund_or_defer(deps.storage, &config, hash, &mut order, &needed, response)
}

pub fn execute_supply_and_fulfill(
    deps: DepsMut,
    info: MessageInfo,
    block_number: u64,
    withdraw_hash: HexBinary,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    validate_withdraw_hash(&withdraw_hash)?;
    let hash = withdraw_hash.as_slice();

    let mut order = EXIT_ORDERS.may_load(deps.storage, hash)?.ok_or_else(|| {
        ContractError::ExitOrderNotFound {
            hash: withdraw_hash.to_hex(),
        }
    })?;

    if order.block_number != block_number {
        return Err(ContractError::BlockMismatch {
            expected: order.block_number,
            got: block_number,
        });
    }
    if order.status != ExitOrderStatus::Deferred {
        return Err(ContractError::NotDeferred {
            hash: withdraw_hash.to_hex(),
        });
    }
    if order.block_number <= LAST_VERIFIED_BLOCK.load(deps.storage)? {
        return Err(ContractError::AlreadyVerified { block_number });
    }

    ensure_paid(&info, &config.pool_denom, amount)?;
    supply(deps.storage, &info.sender, amount)?;

    let needed = query_amount_needed(
        &deps.querier,
        &config,
        order.token_id,
        order.requested_amount,
    )?;

    let response = Response::new()
        .add_attribute("action", "supply_and_fulfill_swift_exit")
        .add_attribute("withdraw_hash", withdraw_hash.to_hex())
        .add_attribute("supplier", info.sender)
        .add_attribute("amount", amount);

    fund_or_defer(deps.storage, &config, hash, &mut order, &needed, response)
}

/// Fulfil the order if the pool can cover it, otherwise park it as deferred
fn fund_or_defer(
    storage: &mut dyn Storage,
    config: &Config,
    hash: &[u8],
    order: &mut ExitOrder,
    needed: &AmountNeededResponse,
    response: Response,
) -> Result<Response, ContractError> {
    if needed.amount_to_borrow.is_zero() {
        return Err(ContractError::ZeroAmount {});
    }

    let pool = POOL.load(storage)?;
    if needed.amount_to_borrow <= pool.available_liquidity() {
        let messages = fulfill_immediately(storage, config, hash, order, needed)?;
        return Ok(response
            .add_messages(messages)
            .add_attribute("status", order.status.as_str())
            .add_attribute("amount_borrowed", order.amount_borrowed)
            .add_attribute("borrower_fee", order.borrower_fee));
    }

    if order.status != ExitOrderStatus::Deferred {
        transition(order, ExitOrderStatus::Deferred)?;
    }
    EXIT_ORDERS.save(storage, hash, order)?;
    DEFERRED_ORDERS.save(storage, (order.block_number, hash), &true)?;

    let still_needed = still_needed_amount(
        config.price_rising_coeff,
        needed.amount_to_borrow,
        pool.available_liquidity(),
    )?;

    Ok(response
        .add_event(updated_exit_order_event(order.block_number, hash, still_needed))
        .add_attribute("status", order.status.as_str())
        .add_attribute("still_needed", still_needed))
}

/// Lend `amount_to_borrow` out of the pool for this order.
///
/// Records the borrow orders, books the loan, and returns the exchange and
/// rollup messages that deliver the funds.
pub fn fulfill_immediately(
    storage: &mut dyn Storage,
    config: &Config,
    hash: &[u8],
    order: &mut ExitOrder,
    needed: &AmountNeededResponse,
) -> Result<Vec<CosmosMsg>, ContractError> {
    if BORROW_ORDERS.has(storage, hash) {
        return Err(ContractError::DuplicateOrder {
            hash: HexBinary::from(hash).to_hex(),
        });
    }

    let mut pool = POOL.load(storage)?;
    let amount_to_borrow = needed.amount_to_borrow;
    if amount_to_borrow > pool.available_liquidity() {
        return Err(ContractError::InsufficientLiquidity {
            requested: amount_to_borrow.to_string(),
            available: pool.available_liquidity().to_string(),
        });
    }

    transition(order, ExitOrderStatus::Fulfilled)?;

    let model = InterestModel::default();
    let utilization = model.utilization(pool.total_supply, pool.total_borrowed)?;
    let fees = model.split_fee(needed.amount_for_fees, utilization)?;

    let borrow_orders = distribute_borrow_orders(storage, &pool, amount_to_borrow, &fees)?;
    BORROW_ORDERS.save(storage, hash, &borrow_orders)?;

    pool.total_borrowed = pool.total_borrowed.checked_add(amount_to_borrow)?;
    save_pool(storage, &pool)?;

    // Exact-output exchange: the recipient gets the full requested amount
    order.token_amount = order.requested_amount;
    order.amount_borrowed = amount_to_borrow;
    order.borrower_fee = fees.borrower_fee;
    EXIT_ORDERS.save(storage, hash, order)?;
    DEFERRED_ORDERS.remove(storage, (order.block_number, hash));

    Ok(vec![
        exchange_msg(
            config,
            hash,
            order.token_id,
            order.token_amount,
            order.recipient.as_str(),
            amount_to_borrow,
        )?,
        order_exit_msg(
            config,
            order.block_number,
            order.withdraw_op_offset,
            hash,
            order.recipient.as_str(),
        )?,
    ])
}

/// Split a loan across active validators in proportion to their supply.
///
/// Shares are floored; the owner entry takes its own share, the shares of
/// deactivated balances and all rounding dust, plus the owner fee. The
/// entries always sum exactly to `amount` and `fees.borrower_fee`.
pub fn distribute_borrow_orders(
    storage: &dyn Storage,
    pool: &PoolTotals,
    amount: Uint128,
    fees: &FeeSplit,
) -> Result<Vec<BorrowOrder>, ContractError> {
    let list = VALIDATOR_LIST.load(storage)?;
    let mut orders = Vec::with_capacity(list.len() + 1);
    let mut borrowed_total = Uint128::zero();
    let mut fee_total = Uint128::zero();

    for address in list {
        let validator = VALIDATORS.load(storage, &address)?;
        if validator.supplied.is_zero() {
            continue;
        }

        let borrowed_amount = amount.checked_multiply_ratio(validator.supplied, pool.total_supply)?;
        let fee_amount = fees
            .validators_fee
            .checked_multiply_ratio(validator.supplied, pool.total_supply)?;
        if borrowed_amount.is_zero() && fee_amount.is_zero() {
            continue;
        }

        borrowed_total = borrowed_total.checked_add(borrowed_amount)?;
        fee_total = fee_total.checked_add(fee_amount)?;
        orders.push(BorrowOrder {
            borrowed_amount,
            fee_amount,
            lender: Lender::Validator { address },
        });
    }

    orders.push(BorrowOrder {
        borrowed_amount: amount.checked_sub(borrowed_total)?,
        fee_amount: fees
            .validators_fee
            .checked_sub(fee_total)?
            .checked_add(fees.owner_fee)?,
        lender: Lender::Owner,
    });

    Ok(orders)
}

/// Check one valid signature per listed validator over the request
fn verify_request_signatures(
    deps: Deps,
    env: &Env,
    config: &Config,
    request: &SwiftExitRequest,
    signatures: &[Binary],
    validators: &[String],
) -> Result<(), ContractError> {
    ensure_same_len("signatures", signatures, "validators", validators)?;

    let mut seen = BTreeSet::new();
    let signers = validators
        .iter()
        .map(|v| {
            let addr = deps.api.addr_validate(v)?;
            if !seen.insert(addr.clone()) {
                return Err(ContractError::DuplicateSigner { validator: v.clone() });
            }
            Ok(addr)
        })
        .collect::<Result<Vec<Addr>, ContractError>>()?;

    let provided = signers.len() as u32;
    if provided < config.min_signers {
        return Err(ContractError::InsufficientSigners {
            required: config.min_signers,
            provided,
        });
    }

    let pubkeys = get_pubkeys(deps.storage, &signers)?;
    let digest = request.signing_digest(env.contract.address.as_str());

    for ((signer, signature), pubkey) in signers.iter().zip(signatures).zip(&pubkeys) {
        let valid = deps
            .api
            .secp256k1_verify(&digest, signature, pubkey)
            .unwrap_or(false);
        if !valid {
            return Err(ContractError::BadSignature {
                validator: signer.to_string(),
            });
        }
    }

    Ok(())
}

/// Funding gap of a deferred order, padded by the price-rising margin
pub fn still_needed_amount(
    price_rising_coeff: Decimal,
    amount_to_borrow: Uint128,
    available: Uint128,
) -> Result<Uint128, ContractError> {
    Ok(amount_to_borrow
        .checked_mul_ceil(price_rising_coeff)?
        .saturating_sub(available))
}

fn transition(order: &mut ExitOrder, target: ExitOrderStatus) -> Result<(), ContractError> {
    if !order.status.can_transition_to(&target) {
        return Err(ContractError::InvalidStateTransition {
            from: order.status.as_str().to_string(),
            to: target.as_str().to_string(),
        });
    }
    order.status = target;
    Ok(())
}

fn updated_exit_order_event(block_number: u64, hash: &[u8], still_needed: Uint128) -> Event {
    Event::new(UPDATED_EXIT_ORDER_EVENT)
        .add_attribute("block_number", block_number.to_string())
        .add_attribute("withdraw_hash", HexBinary::from(hash).to_hex())
        .add_attribute("still_needed", still_needed)
}
