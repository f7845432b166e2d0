//! Interfaces of the contracts the pool talks to.
//!
//! Execute messages are dispatched in the same transaction as the pool
//! update that triggers them, so a failing collaborator reverts the pool.

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{
    to_json_binary, Coin, CosmosMsg, HexBinary, QuerierWrapper, StdResult, Uint128, WasmMsg,
};

use crate::state::Config;

#[cw_serde]
pub enum RollupExecuteMsg {
    /// Withdraw through the regular path, the block is already verified
    TryWithdraw {
        block_number: u64,
        withdraw_op_offset: u64,
        withdraw_hash: HexBinary,
    },
    /// The pool fronted this withdrawal; route its funds to the pool
    OrderExit {
        block_number: u64,
        withdraw_op_offset: u64,
        withdraw_hash: HexBinary,
        recipient: String,
    },
}

#[cw_serde]
pub enum MoneyMarketExecuteMsg {
    /// Swap the attached pool liquidity for exactly `amount_out` of the
    /// token and deliver it to `recipient`
    Exchange {
        withdraw_hash: HexBinary,
        token_id: u32,
        amount_out: Uint128,
        recipient: String,
    },
    /// Close the position opened for `withdraw_hash` with the attached tokens
    Repay { withdraw_hash: HexBinary },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum MoneyMarketQueryMsg {
    #[returns(AmountNeededResponse)]
    AmountNeeded { token_id: u32, token_amount: Uint128 },
}

/// Pool-denom amounts needed to serve a withdrawal
#[cw_serde]
pub struct AmountNeededResponse {
    /// Base the exit fee is charged on
    pub amount_for_fees: Uint128,
    /// Liquidity that must be borrowed to buy the withdrawn tokens
    pub amount_to_borrow: Uint128,
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum TokenRegistryQueryMsg {
    #[returns(TokenDenomResponse)]
    TokenDenom { token_id: u32 },
}

#[cw_serde]
pub struct TokenDenomResponse {
    pub denom: String,
}

pub fn query_amount_needed(
    querier: &QuerierWrapper,
    config: &Config,
    token_id: u32,
    token_amount: Uint128,
) -> StdResult<AmountNeededResponse> {
    querier.query_wasm_smart(
        config.money_market.to_string(),
        &MoneyMarketQueryMsg::AmountNeeded {
            token_id,
            token_amount,
        },
    )
}

pub fn query_token_denom(
    querier: &QuerierWrapper,
    config: &Config,
    token_id: u32,
) -> StdResult<String> {
    let res: TokenDenomResponse = querier.query_wasm_smart(
        config.token_registry.to_string(),
        &TokenRegistryQueryMsg::TokenDenom { token_id },
    )?;
    Ok(res.denom)
}

pub fn try_withdraw_msg(
    config: &Config,
    block_number: u64,
    withdraw_op_offset: u64,
    withdraw_hash: &[u8],
) -> StdResult<CosmosMsg> {
    rollup_msg(
        config,
        &RollupExecuteMsg::TryWithdraw {
            block_number,
            withdraw_op_offset,
            withdraw_hash: HexBinary::from(withdraw_hash),
        },
    )
}

pub fn order_exit_msg(
    config: &Config,
    block_number: u64,
    withdraw_op_offset: u64,
    withdraw_hash: &[u8],
    recipient: &str,
) -> StdResult<CosmosMsg> {
    rollup_msg(
        config,
        &RollupExecuteMsg::OrderExit {
            block_number,
            withdraw_op_offset,
            withdraw_hash: HexBinary::from(withdraw_hash),
            recipient: recipient.to_string(),
        },
    )
}

pub fn exchange_msg(
    config: &Config,
    withdraw_hash: &[u8],
    token_id: u32,
    amount_out: Uint128,
    recipient: &str,
    borrowed: Uint128,
) -> StdResult<CosmosMsg> {
    Ok(WasmMsg::Execute {
        contract_addr: config.money_market.to_string(),
        msg: to_json_binary(&MoneyMarketExecuteMsg::Exchange {
            withdraw_hash: HexBinary::from(withdraw_hash),
            token_id,
            amount_out,
            recipient: recipient.to_string(),
        })?,
        funds: vec![Coin {
            denom: config.pool_denom.clone(),
            amount: borrowed,
        }],
    }
    .into())
}

pub fn repay_msg(config: &Config, withdraw_hash: &[u8], repayment: Coin) -> StdResult<CosmosMsg> {
    Ok(WasmMsg::Execute {
        contract_addr: config.money_market.to_string(),
        msg: to_json_binary(&MoneyMarketExecuteMsg::Repay {
            withdraw_hash: HexBinary::from(withdraw_hash),
        })?,
        funds: vec![repayment],
    }
    .into())
}

fn rollup_msg(config: &Config, msg: &RollupExecuteMsg) -> StdResult<CosmosMsg> {
    Ok(WasmMsg::Execute {
        contract_addr: config.rollup.to_string(),
        msg: to_json_binary(msg)?,
        funds: vec![],
    }
    .into())
}
