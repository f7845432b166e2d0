use cosmwasm_std::{
    entry_point, to_json_binary, Binary, Decimal, Deps, DepsMut, Env, MessageInfo, Response,
    StdResult,
};
use swift_exit_types::SwiftExitRequest;

use crate::error::ContractError;
use crate::exits::{execute_add_swift_exit, execute_supply_and_fulfill};
use crate::helpers::ensure_owner;
use crate::msg::{ExecuteMsg, InstantiateMsg, QueryMsg};
use crate::pool::{
    execute_supply_validator, execute_withdraw_for_validator, execute_withdraw_owner_fees,
};
use crate::queries::{
    query_borrow_orders, query_config, query_deferred_orders, query_exit_order, query_pool,
    query_pubkeys, query_validator, query_validator_list, query_validators, query_withdrawable,
};
use crate::registry::{execute_add_validator, execute_remove_validator};
use crate::settlement::execute_new_verified_block;
use crate::state::{Config, PoolTotals, CONFIG, LAST_VERIFIED_BLOCK, POOL, VALIDATOR_LIST};

#[entry_point]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    let config = Config {
        owner: deps.api.addr_validate(&msg.owner)?,
        rollup: deps.api.addr_validate(&msg.rollup)?,
        money_market: deps.api.addr_validate(&msg.money_market)?,
        token_registry: deps.api.addr_validate(&msg.token_registry)?,
        pool_denom: msg.pool_denom,
        min_signers: msg.min_signers,
        price_rising_coeff: msg.price_rising_coeff,
    };
    validate_config(&config)?;

    CONFIG.save(deps.storage, &config)?;
    VALIDATOR_LIST.save(deps.storage, &vec![])?;
    POOL.save(deps.storage, &PoolTotals::default())?;
    LAST_VERIFIED_BLOCK.save(deps.storage, &msg.last_verified_block)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("owner", config.owner)
        .add_attribute("pool_denom", config.pool_denom)
        .add_attribute("last_verified_block", msg.last_verified_block.to_string()))
}

#[entry_point]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::AddValidator { validator, pubkey } => {
            execute_add_validator(deps, env, info, validator, pubkey)
        }
        ExecuteMsg::RemoveValidator { validator } => {
            execute_remove_validator(deps, info, validator)
        }
        ExecuteMsg::SupplyValidator { validator, amount } => {
            execute_supply_validator(deps, info, validator, amount)
        }
        ExecuteMsg::WithdrawForValidator { amount } => {
            execute_withdraw_for_validator(deps, info, amount)
        }
        ExecuteMsg::WithdrawOwnerFees { amount } => execute_withdraw_owner_fees(deps, info, amount),
        ExecuteMsg::AddSwiftExit {
            block_number,
            withdraw_op_offset,
            withdraw_hash,
            token_id,
            token_amount,
            recipient,
            signatures,
            validators,
        } => {
            let request = SwiftExitRequest {
                block_number,
                withdraw_op_offset,
                withdraw_hash,
                token_id,
                token_amount,
                recipient,
            };
            execute_add_swift_exit(deps, env, info, request, signatures, validators)
        }
        ExecuteMsg::SupplyAndFulfillSwiftExitOrder {
            block_number,
            withdraw_hash,
            amount,
        } => execute_supply_and_fulfill(deps, info, block_number, withdraw_hash, amount),
        ExecuteMsg::NewVerifiedBlock {
            block_number,
            validators,
            succeeded_hashes,
            failed_hashes,
            repaid_denoms,
            repaid_amounts,
        } => execute_new_verified_block(
            deps,
            info,
            block_number,
            validators,
            succeeded_hashes,
            failed_hashes,
            repaid_denoms,
            repaid_amounts,
        ),
        ExecuteMsg::UpdateConfig {
            owner,
            rollup,
            money_market,
            token_registry,
            min_signers,
            price_rising_coeff,
        } => execute_update_config(
            deps,
            info,
            owner,
            rollup,
            money_market,
            token_registry,
            min_signers,
            price_rising_coeff,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn execute_update_config(
    deps: DepsMut,
    info: MessageInfo,
    owner: Option<String>,
    rollup: Option<String>,
    money_market: Option<String>,
    token_registry: Option<String>,
    min_signers: Option<u32>,
    price_rising_coeff: Option<Decimal>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;

    if let Some(owner) = owner {
        config.owner = deps.api.addr_validate(&owner)?;
    }
    if let Some(rollup) = rollup {
        config.rollup = deps.api.addr_validate(&rollup)?;
    }
    if let Some(money_market) = money_market {
        config.money_market = deps.api.addr_validate(&money_market)?;
    }
    if let Some(token_registry) = token_registry {
        config.token_registry = deps.api.addr_validate(&token_registry)?;
    }
    if let Some(min_signers) = min_signers {
        config.min_signers = min_signers;
    }
    if let Some(price_rising_coeff) = price_rising_coeff {
        config.price_rising_coeff = price_rising_coeff;
    }
    validate_config(&config)?;

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attribute("action", "update_config"))
}

fn validate_config(config: &Config) -> Result<(), ContractError> {
    if config.pool_denom.is_empty() {
        return Err(ContractError::InvalidConfig {
            reason: "pool_denom must not be empty".to_string(),
        });
    }
    if config.min_signers == 0 {
        return Err(ContractError::InvalidConfig {
            reason: "min_signers must be at least 1".to_string(),
        });
    }
    if config.price_rising_coeff <= Decimal::one() {
        return Err(ContractError::InvalidConfig {
            reason: "price_rising_coeff must be greater than 1".to_string(),
        });
    }
    Ok(())
}

#[entry_point]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::Validator { validator } => to_json_binary(&query_validator(deps, validator)?),
        QueryMsg::Validators { start_after, limit } => {
            to_json_binary(&query_validators(deps, start_after, limit)?)
        }
        QueryMsg::ValidatorList {} => to_json_binary(&query_validator_list(deps)?),
        QueryMsg::Pubkeys { validators } => to_json_binary(&query_pubkeys(deps, validators)?),
        QueryMsg::Pool {} => to_json_binary(&query_pool(deps)?),
        QueryMsg::WithdrawableAmount { validator } => {
            to_json_binary(&query_withdrawable(deps, validator)?)
        }
        QueryMsg::ExitOrder { withdraw_hash } => {
            to_json_binary(&query_exit_order(deps, withdraw_hash)?)
        }
        QueryMsg::BorrowOrders { withdraw_hash } => {
            to_json_binary(&query_borrow_orders(deps, withdraw_hash)?)
        }
        QueryMsg::DeferredOrders { block_number } => {
            to_json_binary(&query_deferred_orders(deps, block_number)?)
        }
    }
}
