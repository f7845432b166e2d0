use cosmwasm_std::{Addr, HexBinary, MessageInfo, Uint128};

use crate::error::ContractError;
use crate::msg::{ExitOrderResponse, ValidatorResponse};
use crate::state::{Config, ExitOrder, Validator};

pub fn ensure_owner(config: &Config, info: &MessageInfo) -> Result<(), ContractError> {
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized {});
    }
    Ok(())
}

/// Sum of the attached funds in `denom`
fn paid_amount(info: &MessageInfo, denom: &str) -> Uint128 {
    info.funds
        .iter()
        .filter(|c| c.denom == denom)
        .map(|c| c.amount)
        .sum()
}

/// Require exactly `amount` of `denom` to be attached
pub fn ensure_paid(info: &MessageInfo, denom: &str, amount: Uint128) -> Result<(), ContractError> {
    let paid = paid_amount(info, denom);
    if paid != amount {
        return Err(ContractError::InvalidFunds {
            expected: format!("{}{}", amount, denom),
            got: format!("{}{}", paid, denom),
        });
    }
    Ok(())
}

pub fn validate_withdraw_hash(hash: &HexBinary) -> Result<(), ContractError> {
    swift_exit_types::validate_withdraw_hash(hash.as_slice())
        .map_err(|e| ContractError::InvalidWithdrawHash { len: e.len })
}

pub fn ensure_same_len<A, B>(
    left: &str,
    left_items: &[A],
    right: &str,
    right_items: &[B],
) -> Result<(), ContractError> {
    if left_items.len() != right_items.len() {
        return Err(ContractError::LengthMismatch {
            left: left.to_string(),
            left_len: left_items.len(),
            right: right.to_string(),
            right_len: right_items.len(),
        });
    }
    Ok(())
}

/// Convert Validator to response format
pub fn validator_to_response(address: Addr, validator: Validator) -> ValidatorResponse {
    ValidatorResponse {
        address: address.to_string(),
        active: validator.active,
        pubkey: validator.pubkey,
        supplied: validator.supplied,
        added_at: validator.added_at,
    }
}

/// Convert ExitOrder to response format
pub fn exit_order_to_response(withdraw_hash: HexBinary, order: ExitOrder) -> ExitOrderResponse {
    ExitOrderResponse {
        withdraw_hash,
        status: order.status.as_str().to_string(),
        block_number: order.block_number,
        withdraw_op_offset: order.withdraw_op_offset,
        token_id: order.token_id,
        requested_amount: order.requested_amount,
        token_amount: order.token_amount,
        recipient: order.recipient.to_string(),
        amount_borrowed: order.amount_borrowed,
        borrower_fee: order.borrower_fee,
        settlement: order.settlement,
        created_at: order.created_at,
    }
}
