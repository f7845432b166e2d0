use cosmwasm_std::{Addr, Deps, HexBinary, Order, StdError, StdResult};
use cw_storage_plus::Bound;
use swift_exit_types::InterestModel;

use crate::helpers::{exit_order_to_response, validator_to_response};
use crate::msg::{
    BorrowOrdersResponse, ConfigResponse, DeferredOrdersResponse, ExitOrderResponse,
    PoolResponse, PubkeysResponse, ValidatorListResponse, ValidatorResponse, ValidatorsResponse,
    WithdrawableResponse,
};
use crate::pool::withdrawable_amount;
use crate::registry::get_pubkeys;
use crate::state::{
    BORROW_ORDERS, CONFIG, DEFERRED_ORDERS, EXIT_ORDERS, LAST_VERIFIED_BLOCK, POOL, VALIDATORS,
    VALIDATOR_LIST,
};

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 30;

pub fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        owner: config.owner.to_string(),
        rollup: config.rollup.to_string(),
        money_market: config.money_market.to_string(),
        token_registry: config.token_registry.to_string(),
        pool_denom: config.pool_denom,
        min_signers: config.min_signers,
        price_rising_coeff: config.price_rising_coeff,
        last_verified_block: LAST_VERIFIED_BLOCK.load(deps.storage)?,
    })
}

pub fn query_validator(deps: Deps, validator: String) -> StdResult<ValidatorResponse> {
    let addr = deps.api.addr_validate(&validator)?;
    let record = VALIDATORS.load(deps.storage, &addr)?;
    Ok(validator_to_response(addr, record))
}

pub fn query_validators(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<ValidatorsResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start_addr = start_after
        .map(|s| deps.api.addr_validate(&s))
        .transpose()?;
    let start = start_addr.as_ref().map(|addr| Bound::exclusive(addr));

    let validators = VALIDATORS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(addr, record)| validator_to_response(addr, record)))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(ValidatorsResponse { validators })
}

pub fn query_validator_list(deps: Deps) -> StdResult<ValidatorListResponse> {
    let list = VALIDATOR_LIST.load(deps.storage)?;
    Ok(ValidatorListResponse {
        count: list.len() as u64,
        validators: list.into_iter().map(|a| a.to_string()).collect(),
    })
}

pub fn query_pubkeys(deps: Deps, validators: Vec<String>) -> StdResult<PubkeysResponse> {
    let addrs = validators
        .iter()
        .map(|v| deps.api.addr_validate(v))
        .collect::<StdResult<Vec<Addr>>>()?;
    let pubkeys =
        get_pubkeys(deps.storage, &addrs).map_err(|e| StdError::generic_err(e.to_string()))?;
    Ok(PubkeysResponse { pubkeys })
}

pub fn query_pool(deps: Deps) -> StdResult<PoolResponse> {
    let pool = POOL.load(deps.storage)?;
    let model = InterestModel::default();
    let to_std = |e: swift_exit_types::InterestError| StdError::generic_err(e.to_string());

    let utilization = model
        .utilization(pool.total_supply, pool.total_borrowed)
        .map_err(to_std)?;

    Ok(PoolResponse {
        total_supply: pool.total_supply,
        total_borrowed: pool.total_borrowed,
        owner_supply: pool.owner_supply,
        available_liquidity: pool.available_liquidity(),
        utilization,
        borrowing_rate: model.borrowing_rate(utilization).map_err(to_std)?,
        supply_rate: model.supply_rate(utilization).map_err(to_std)?,
    })
}

pub fn query_withdrawable(deps: Deps, validator: String) -> StdResult<WithdrawableResponse> {
    let addr = deps.api.addr_validate(&validator)?;
    Ok(WithdrawableResponse {
        amount: withdrawable_amount(deps.storage, &addr)?,
        validator,
    })
}

pub fn query_exit_order(deps: Deps, withdraw_hash: HexBinary) -> StdResult<ExitOrderResponse> {
    let order = EXIT_ORDERS.load(deps.storage, withdraw_hash.as_slice())?;
    Ok(exit_order_to_response(withdraw_hash, order))
}

pub fn query_borrow_orders(deps: Deps, withdraw_hash: HexBinary) -> StdResult<BorrowOrdersResponse> {
    let orders = BORROW_ORDERS
        .may_load(deps.storage, withdraw_hash.as_slice())?
        .unwrap_or_default();
    Ok(BorrowOrdersResponse {
        withdraw_hash,
        orders,
    })
}

pub fn query_deferred_orders(deps: Deps, block_number: u64) -> StdResult<DeferredOrdersResponse> {
    let withdraw_hashes = DEFERRED_ORDERS
        .prefix(block_number)
        .keys(deps.storage, None, None, Order::Ascending)
        .map(|key| key.map(HexBinary::from))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(DeferredOrdersResponse {
        block_number,
        withdraw_hashes,
    })
}
