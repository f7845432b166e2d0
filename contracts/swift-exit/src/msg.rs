use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Binary, Decimal, HexBinary, Uint128};

use crate::state::{BorrowOrder, SettlementOutcome};

#[cw_serde]
pub struct InstantiateMsg {
    pub owner: String,
    pub rollup: String,
    pub money_market: String,
    pub token_registry: String,
    pub pool_denom: String,
    pub min_signers: u32,
    pub price_rising_coeff: Decimal,
    /// Last rollup block already verified when the pool starts
    pub last_verified_block: u64,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Register a validator (owner only)
    AddValidator { validator: String, pubkey: Binary },

    /// Deactivate a validator (owner only)
    RemoveValidator { validator: String },

    /// Supply liquidity on behalf of an active validator.
    /// `amount` of the pool denom must be attached.
    SupplyValidator { validator: String, amount: Uint128 },

    /// Withdraw part of the sender's supplied balance
    WithdrawForValidator { amount: Uint128 },

    /// Withdraw accrued treasury fees (owner only)
    WithdrawOwnerFees { amount: Uint128 },

    /// Relay a validator-attested swift-exit request (owner only)
    AddSwiftExit {
        block_number: u64,
        withdraw_op_offset: u64,
        withdraw_hash: HexBinary,
        token_id: u32,
        token_amount: Uint128,
        recipient: String,
        /// One signature per entry of `validators`, same order
        signatures: Vec<Binary>,
        validators: Vec<String>,
    },

    /// Supply liquidity and retry a deferred order.
    /// Sender must be an active validator; `amount` must be attached.
    SupplyAndFulfillSwiftExitOrder {
        block_number: u64,
        withdraw_hash: HexBinary,
        amount: Uint128,
    },

    /// Settle a verified rollup block (rollup only).
    ///
    /// Exactly the declared repaid funds must be attached. Each succeeded
    /// exit claims its borrowed liquidity plus borrower fee in the pool denom
    /// and its delivered tokens; whatever is left is sent back.
    NewVerifiedBlock {
        block_number: u64,
        validators: Vec<String>,
        succeeded_hashes: Vec<HexBinary>,
        failed_hashes: Vec<HexBinary>,
        repaid_denoms: Vec<String>,
        repaid_amounts: Vec<Uint128>,
    },

    /// Update config (owner only)
    UpdateConfig {
        owner: Option<String>,
        rollup: Option<String>,
        money_market: Option<String>,
        token_registry: Option<String>,
        min_signers: Option<u32>,
        price_rising_coeff: Option<Decimal>,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ConfigResponse)]
    Config {},

    #[returns(ValidatorResponse)]
    Validator { validator: String },

    #[returns(ValidatorsResponse)]
    Validators {
        start_after: Option<String>,
        limit: Option<u32>,
    },

    /// Active validators in distribution order
    #[returns(ValidatorListResponse)]
    ValidatorList {},

    /// Public keys of the given active validators, in the given order
    #[returns(PubkeysResponse)]
    Pubkeys { validators: Vec<String> },

    #[returns(PoolResponse)]
    Pool {},

    #[returns(WithdrawableResponse)]
    WithdrawableAmount { validator: String },

    #[returns(ExitOrderResponse)]
    ExitOrder { withdraw_hash: HexBinary },

    #[returns(BorrowOrdersResponse)]
    BorrowOrders { withdraw_hash: HexBinary },

    /// Orders of `block_number` still waiting for liquidity
    #[returns(DeferredOrdersResponse)]
    DeferredOrders { block_number: u64 },
}

#[cw_serde]
pub struct ConfigResponse {
    pub owner: String,
    pub rollup: String,
    pub money_market: String,
    pub token_registry: String,
    pub pool_denom: String,
    pub min_signers: u32,
    pub price_rising_coeff: Decimal,
    pub last_verified_block: u64,
}

#[cw_serde]
pub struct ValidatorResponse {
    pub address: String,
    pub active: bool,
    pub pubkey: Binary,
    pub supplied: Uint128,
    pub added_at: u64,
}

#[cw_serde]
pub struct ValidatorsResponse {
    pub validators: Vec<ValidatorResponse>,
}

#[cw_serde]
pub struct ValidatorListResponse {
    pub validators: Vec<String>,
    pub count: u64,
}

#[cw_serde]
pub struct PubkeysResponse {
    pub pubkeys: Vec<Binary>,
}

#[cw_serde]
pub struct PoolResponse {
    pub total_supply: Uint128,
    pub total_borrowed: Uint128,
    pub owner_supply: Uint128,
    pub available_liquidity: Uint128,
    pub utilization: Decimal,
    pub borrowing_rate: Decimal,
    pub supply_rate: Decimal,
}

#[cw_serde]
pub struct WithdrawableResponse {
    pub validator: String,
    pub amount: Uint128,
}

#[cw_serde]
pub struct ExitOrderResponse {
    pub withdraw_hash: HexBinary,
    pub status: String,
    pub block_number: u64,
    pub withdraw_op_offset: u64,
    pub token_id: u32,
    pub requested_amount: Uint128,
    pub token_amount: Uint128,
    pub recipient: String,
    pub amount_borrowed: Uint128,
    pub borrower_fee: Uint128,
    pub settlement: Option<SettlementOutcome>,
    pub created_at: u64,
}

#[cw_serde]
pub struct BorrowOrdersResponse {
    pub withdraw_hash: HexBinary,
    pub orders: Vec<BorrowOrder>,
}

#[cw_serde]
pub struct DeferredOrdersResponse {
    pub block_number: u64,
    pub withdraw_hashes: Vec<HexBinary>,
}
