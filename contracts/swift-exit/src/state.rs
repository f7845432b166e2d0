use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Binary, Decimal, Uint128};
use cw_storage_plus::{Item, Map};

#[cw_serde]
pub struct Config {
    /// Owner: manages validators, relays swift exits, holds the treasury
    pub owner: Addr,
    /// Rollup contract: reports verified blocks, executes withdrawals
    pub rollup: Addr,
    /// Money market: prices, exchanges and repays borrowed liquidity
    pub money_market: Addr,
    /// Token registry: resolves rollup token ids to bank denoms
    pub token_registry: Addr,
    /// Denom validators supply and the pool lends
    pub pool_denom: String,
    /// Minimum number of validator signatures on a swift-exit request
    pub min_signers: u32,
    /// Safety margin applied to the funding gap of a deferred order (> 1)
    pub price_rising_coeff: Decimal,
}

#[cw_serde]
pub struct Validator {
    /// False once removed by the owner; the balance record is kept
    pub active: bool,
    /// SEC1-encoded secp256k1 key used to attest swift exits
    pub pubkey: Binary,
    /// Amount this validator has supplied to the pool, fees included
    pub supplied: Uint128,
    pub added_at: u64,
}

#[cw_serde]
#[derive(Default)]
pub struct PoolTotals {
    /// Sum of every validator balance plus the owner treasury
    pub total_supply: Uint128,
    /// Amount currently lent out to fulfilled, unsettled exits
    pub total_borrowed: Uint128,
    /// Owner treasury share of `total_supply`
    pub owner_supply: Uint128,
}

impl PoolTotals {
    pub fn available_liquidity(&self) -> Uint128 {
        self.total_supply.saturating_sub(self.total_borrowed)
    }

    pub fn is_solvent(&self) -> bool {
        self.total_borrowed <= self.total_supply
    }
}

/// Lifecycle of a swift exit.
///
/// `New` is the transient state of a freshly recorded request; it moves to
/// `Deferred` when the pool lacks liquidity, or straight to `Fulfilled`.
/// `Fulfilled` is terminal.
#[cw_serde]
pub enum ExitOrderStatus {
    New,
    Deferred,
    Fulfilled,
}

impl ExitOrderStatus {
    pub fn can_transition_to(&self, target: &ExitOrderStatus) -> bool {
        matches!(
            (self, target),
            (ExitOrderStatus::New, ExitOrderStatus::Deferred)
                | (ExitOrderStatus::New, ExitOrderStatus::Fulfilled)
                | (ExitOrderStatus::Deferred, ExitOrderStatus::Fulfilled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExitOrderStatus::New => "new",
            ExitOrderStatus::Deferred => "deferred",
            ExitOrderStatus::Fulfilled => "fulfilled",
        }
    }
}

#[cw_serde]
pub enum SettlementOutcome {
    Succeeded { block_number: u64 },
    Failed { block_number: u64 },
}

#[cw_serde]
pub struct ExitOrder {
    pub status: ExitOrderStatus,
    pub block_number: u64,
    pub withdraw_op_offset: u64,
    pub token_id: u32,
    /// Amount the user asked to withdraw
    pub requested_amount: Uint128,
    /// Amount delivered to the recipient, zero until fulfilled
    pub token_amount: Uint128,
    pub recipient: Addr,
    /// Pool liquidity lent to fund the exit
    pub amount_borrowed: Uint128,
    /// Fee owed back to the pool on success
    pub borrower_fee: Uint128,
    /// Set once the block has been verified and borrow orders consumed
    pub settlement: Option<SettlementOutcome>,
    pub created_at: u64,
}

#[cw_serde]
pub enum Lender {
    Validator { address: Addr },
    Owner,
}

#[cw_serde]
pub struct BorrowOrder {
    pub borrowed_amount: Uint128,
    pub fee_amount: Uint128,
    pub lender: Lender,
}

pub const CONFIG: Item<Config> = Item::new("config");
pub const VALIDATORS: Map<&Addr, Validator> = Map::new("validators");
/// Active validators in insertion order
pub const VALIDATOR_LIST: Item<Vec<Addr>> = Item::new("validator_list");
pub const POOL: Item<PoolTotals> = Item::new("pool");
pub const LAST_VERIFIED_BLOCK: Item<u64> = Item::new("last_verified_block");
pub const EXIT_ORDERS: Map<&[u8], ExitOrder> = Map::new("exit_orders");
/// Borrow orders of fulfilled, unsettled exits
pub const BORROW_ORDERS: Map<&[u8], Vec<BorrowOrder>> = Map::new("borrow_orders");
/// (block number, withdraw hash) of orders waiting for liquidity
pub const DEFERRED_ORDERS: Map<(u64, &[u8]), bool> = Map::new("deferred_orders");
