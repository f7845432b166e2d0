//! Shared fixtures for the pool integration tests.
//!
//! The money market quotes 1:1 (every token unit costs one pool-denom unit)
//! and the token registry maps every token id to `TOKEN_DENOM`. Calls made
//! through [`run`] move pool-denom funds in the mock bank, so the contract's
//! balance can be checked against its books.

#![allow(dead_code)]

use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{
    from_json, to_json_binary, Addr, BankMsg, Binary, Coin, ContractResult, CosmosMsg, Decimal,
    Env, HexBinary, MemoryStorage, MessageInfo, OwnedDeps, Response, SystemError, SystemResult,
    Uint128, WasmMsg, WasmQuery,
};

use swift_exit_contract::collaborators::{
    AmountNeededResponse, MoneyMarketExecuteMsg, MoneyMarketQueryMsg, RollupExecuteMsg,
    TokenDenomResponse, TokenRegistryQueryMsg,
};
use swift_exit_contract::contract::{execute, instantiate, query};
use swift_exit_contract::error::ContractError;
use swift_exit_contract::msg::{
    ExecuteMsg, ExitOrderResponse, InstantiateMsg, PoolResponse, QueryMsg, ValidatorsResponse,
};
use swift_exit_types::{derive_public_key, sign_request, SwiftExitRequest};

pub type TestDeps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;

pub const POOL_DENOM: &str = "uswift";
pub const TOKEN_DENOM: &str = "utoken";
pub const TOKEN_ID: u32 = 7;
pub const LAST_VERIFIED: u64 = 100;

pub struct TestAddrs {
    pub owner: Addr,
    pub rollup: Addr,
    pub money_market: Addr,
    pub token_registry: Addr,
    pub recipient: Addr,
    pub attacker: Addr,
}

/// A registered validator and the secret key it signs with
pub struct TestValidator {
    pub addr: Addr,
    pub secret: [u8; 32],
}

pub fn test_addrs(api: &MockApi) -> TestAddrs {
    TestAddrs {
        owner: api.addr_make("owner"),
        rollup: api.addr_make("rollup"),
        money_market: api.addr_make("money_market"),
        token_registry: api.addr_make("token_registry"),
        recipient: api.addr_make("recipient"),
        attacker: api.addr_make("attacker"),
    }
}

pub fn setup_contract() -> (TestDeps, Env, TestAddrs) {
    let mut deps = mock_dependencies();
    let env = mock_env();
    let addrs = test_addrs(&deps.api);

    let msg = InstantiateMsg {
        owner: addrs.owner.to_string(),
        rollup: addrs.rollup.to_string(),
        money_market: addrs.money_market.to_string(),
        token_registry: addrs.token_registry.to_string(),
        pool_denom: POOL_DENOM.to_string(),
        min_signers: 1,
        price_rising_coeff: Decimal::permille(1100),
        last_verified_block: LAST_VERIFIED,
    };
    instantiate(deps.as_mut(), env.clone(), message_info(&addrs.owner, &[]), msg).unwrap();

    mock_collaborators(&mut deps, &addrs);
    (deps, env, addrs)
}

fn mock_collaborators(deps: &mut TestDeps, addrs: &TestAddrs) {
    let money_market = addrs.money_market.to_string();
    let token_registry = addrs.token_registry.to_string();

    deps.querier.update_wasm(move |query| match query {
        WasmQuery::Smart { contract_addr, msg } if *contract_addr == money_market => {
            let query: MoneyMarketQueryMsg = from_json(msg).unwrap();
            let MoneyMarketQueryMsg::AmountNeeded { token_amount, .. } = query;
            let res = AmountNeededResponse {
                amount_for_fees: token_amount,
                amount_to_borrow: token_amount,
            };
            SystemResult::Ok(ContractResult::Ok(to_json_binary(&res).unwrap()))
        }
        WasmQuery::Smart { contract_addr, msg } if *contract_addr == token_registry => {
            let _: TokenRegistryQueryMsg = from_json(msg).unwrap();
            let res = TokenDenomResponse {
                denom: TOKEN_DENOM.to_string(),
            };
            SystemResult::Ok(ContractResult::Ok(to_json_binary(&res).unwrap()))
        }
        _ => SystemResult::Err(SystemError::UnsupportedRequest {
            kind: "unexpected wasm query".to_string(),
        }),
    });
}

/// Execute `msg` and apply its pool-denom transfers to the contract balance
pub fn run(
    deps: &mut TestDeps,
    env: &Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    let received = coin_amount(&info.funds);
    let res = execute(deps.as_mut(), env.clone(), info, msg)?;

    let held = pool_balance(deps) + received;
    let sent = res
        .messages
        .iter()
        .map(|sub| match &sub.msg {
            CosmosMsg::Bank(BankMsg::Send { amount, .. }) => coin_amount(amount),
            CosmosMsg::Wasm(WasmMsg::Execute { funds, .. }) => coin_amount(funds),
            _ => Uint128::zero(),
        })
        .sum::<Uint128>();
    let held = held
        .checked_sub(sent)
        .unwrap_or_else(|_| panic!("contract sends {sent}{POOL_DENOM} but holds {held}"));

    deps.querier.bank.update_balance(
        env.contract.address.as_str(),
        vec![Coin::new(held, POOL_DENOM)],
    );
    Ok(res)
}

fn coin_amount(coins: &[Coin]) -> Uint128 {
    coins
        .iter()
        .filter(|c| c.denom == POOL_DENOM)
        .map(|c| c.amount)
        .sum()
}

/// Pool-denom balance of the contract in the mock bank
pub fn pool_balance(deps: &TestDeps) -> Uint128 {
    deps.as_ref()
        .querier
        .query_balance(mock_env().contract.address, POOL_DENOM)
        .unwrap()
        .amount
}

/// Register a validator whose key is derived from `seed`
pub fn add_validator(
    deps: &mut TestDeps,
    env: &Env,
    addrs: &TestAddrs,
    name: &str,
    seed: u8,
) -> TestValidator {
    let validator = TestValidator {
        addr: deps.api.addr_make(name),
        secret: [seed; 32],
    };
    run(
        deps,
        env,
        message_info(&addrs.owner, &[]),
        ExecuteMsg::AddValidator {
            validator: validator.addr.to_string(),
            pubkey: derive_public_key(&validator.secret).unwrap(),
        },
    )
    .unwrap();
    validator
}

pub fn supply(deps: &mut TestDeps, env: &Env, validator: &Addr, amount: u128) {
    run(
        deps,
        env,
        message_info(validator, &[Coin::new(amount, POOL_DENOM)]),
        ExecuteMsg::SupplyValidator {
            validator: validator.to_string(),
            amount: Uint128::new(amount),
        },
    )
    .unwrap();
}

pub fn withdraw_hash(byte: u8) -> HexBinary {
    HexBinary::from(vec![byte; 32])
}

pub fn exit_request(
    addrs: &TestAddrs,
    block_number: u64,
    hash_byte: u8,
    amount: u128,
) -> SwiftExitRequest {
    SwiftExitRequest {
        block_number,
        withdraw_op_offset: hash_byte as u64,
        withdraw_hash: withdraw_hash(hash_byte),
        token_id: TOKEN_ID,
        token_amount: Uint128::new(amount),
        recipient: addrs.recipient.to_string(),
    }
}

/// Relay `request` signed by every validator in `signers`
pub fn add_signed_exit(
    deps: &mut TestDeps,
    env: &Env,
    addrs: &TestAddrs,
    request: SwiftExitRequest,
    signers: &[&TestValidator],
) -> Result<Response, ContractError> {
    let pool = env.contract.address.to_string();
    let signatures = signers
        .iter()
        .map(|v| sign_request(&request, &pool, &v.secret).unwrap())
        .collect();
    let validators = signers.iter().map(|v| v.addr.to_string()).collect();
    add_exit_with(deps, env, &addrs.owner, request, signatures, validators)
}

pub fn add_exit_with(
    deps: &mut TestDeps,
    env: &Env,
    sender: &Addr,
    request: SwiftExitRequest,
    signatures: Vec<Binary>,
    validators: Vec<String>,
) -> Result<Response, ContractError> {
    run(
        deps,
        env,
        message_info(sender, &[]),
        ExecuteMsg::AddSwiftExit {
            block_number: request.block_number,
            withdraw_op_offset: request.withdraw_op_offset,
            withdraw_hash: request.withdraw_hash,
            token_id: request.token_id,
            token_amount: request.token_amount,
            recipient: request.recipient,
            signatures,
            validators,
        },
    )
}

/// Repayment of settled exits: delivered tokens plus pool liquidity
pub fn repayment(tokens: u128, liquidity: u128) -> Vec<Coin> {
    vec![
        Coin::new(tokens, TOKEN_DENOM),
        Coin::new(liquidity, POOL_DENOM),
    ]
}

/// Report a verified block from the rollup, declaring and attaching `repaid`
#[allow(clippy::too_many_arguments)]
pub fn verify_block(
    deps: &mut TestDeps,
    env: &Env,
    addrs: &TestAddrs,
    block_number: u64,
    validators: &[&TestValidator],
    succeeded: Vec<HexBinary>,
    failed: Vec<HexBinary>,
    repaid: &[Coin],
) -> Result<Response, ContractError> {
    run(
        deps,
        env,
        message_info(&addrs.rollup, repaid),
        ExecuteMsg::NewVerifiedBlock {
            block_number,
            validators: validators.iter().map(|v| v.addr.to_string()).collect(),
            succeeded_hashes: succeeded,
            failed_hashes: failed,
            repaid_denoms: repaid.iter().map(|c| c.denom.clone()).collect(),
            repaid_amounts: repaid.iter().map(|c| c.amount).collect(),
        },
    )
}

pub fn query_pool(deps: &TestDeps) -> PoolResponse {
    from_json(query(deps.as_ref(), mock_env(), QueryMsg::Pool {}).unwrap()).unwrap()
}

pub fn query_supplied(deps: &TestDeps, validator: &Addr) -> Uint128 {
    let res: swift_exit_contract::msg::ValidatorResponse = from_json(
        query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::Validator {
                validator: validator.to_string(),
            },
        )
        .unwrap(),
    )
    .unwrap();
    res.supplied
}

pub fn query_exit_order(deps: &TestDeps, hash_byte: u8) -> ExitOrderResponse {
    from_json(
        query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::ExitOrder {
                withdraw_hash: withdraw_hash(hash_byte),
            },
        )
        .unwrap(),
    )
    .unwrap()
}

/// Validator balances plus the owner treasury must add up to the supply,
/// the pool may never lend more than it holds, and the liquidity it reports
/// must be exactly the pool-denom funds it holds
pub fn assert_pool_consistent(deps: &TestDeps) {
    let pool = query_pool(deps);
    let validators: ValidatorsResponse = from_json(
        query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::Validators {
                start_after: None,
                limit: Some(30),
            },
        )
        .unwrap(),
    )
    .unwrap();

    let validator_total: Uint128 = validators.validators.iter().map(|v| v.supplied).sum();
    assert_eq!(validator_total + pool.owner_supply, pool.total_supply);
    assert!(pool.total_borrowed <= pool.total_supply);
    assert_eq!(
        pool_balance(deps),
        pool.available_liquidity,
        "pool books differ from the funds it holds"
    );
}

pub fn attr<'a>(res: &'a Response, key: &str) -> &'a str {
    res.attributes
        .iter()
        .find(|a| a.key == key)
        .map(|a| a.value.as_str())
        .unwrap_or_else(|| panic!("missing attribute {key}"))
}

pub fn rollup_msgs(res: &Response, addrs: &TestAddrs) -> Vec<RollupExecuteMsg> {
    wasm_msgs(res)
        .into_iter()
        .filter(|(contract, _, _)| *contract == addrs.rollup.to_string())
        .map(|(_, msg, _)| from_json(msg).unwrap())
        .collect()
}

pub fn money_market_msgs(
    res: &Response,
    addrs: &TestAddrs,
) -> Vec<(MoneyMarketExecuteMsg, Vec<Coin>)> {
    wasm_msgs(res)
        .into_iter()
        .filter(|(contract, _, _)| *contract == addrs.money_market.to_string())
        .map(|(_, msg, funds)| (from_json(msg).unwrap(), funds))
        .collect()
}

fn wasm_msgs(res: &Response) -> Vec<(String, Binary, Vec<Coin>)> {
    res.messages
        .iter()
        .filter_map(|sub| match &sub.msg {
            CosmosMsg::Wasm(WasmMsg::Execute {
                contract_addr,
                msg,
                funds,
            }) => Some((contract_addr.clone(), msg.clone(), funds.clone())),
            _ => None,
        })
        .collect()
}
