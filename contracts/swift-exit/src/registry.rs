use cosmwasm_std::{Addr, Binary, DepsMut, Env, MessageInfo, Response, Storage};
use swift_exit_types::validate_public_key;

use crate::error::ContractError;
use crate::helpers::ensure_owner;
use crate::state::{Validator, CONFIG, VALIDATORS, VALIDATOR_LIST};

pub fn execute_add_validator(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    validator: String,
    pubkey: Binary,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;

    let addr = deps.api.addr_validate(&validator)?;
    validate_public_key(&pubkey).map_err(|e| ContractError::InvalidPublicKey {
        reason: e.to_string(),
    })?;

    // A returning validator keeps whatever balance it left behind
    let previous = VALIDATORS.may_load(deps.storage, &addr)?;
    if let Some(existing) = &previous {
        if existing.active {
            return Err(ContractError::ValidatorAlreadyExists { id: validator });
        }
    }

    let record = Validator {
        active: true,
        pubkey,
        supplied: previous.map(|v| v.supplied).unwrap_or_default(),
        added_at: env.block.height,
    };
    VALIDATORS.save(deps.storage, &addr, &record)?;

    let mut list = VALIDATOR_LIST.load(deps.storage)?;
    list.push(addr.clone());
    VALIDATOR_LIST.save(deps.storage, &list)?;

    Ok(Response::new()
        .add_attribute("action", "add_validator")
        .add_attribute("validator", addr)
        .add_attribute("supplied", record.supplied)
        .add_attribute("validator_count", list.len().to_string()))
}

pub fn execute_remove_validator(
    deps: DepsMut,
    info: MessageInfo,
    validator: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;

    let addr = deps.api.addr_validate(&validator)?;
    let mut record = load_active_validator(deps.storage, &addr)?;

    record.active = false;
    VALIDATORS.save(deps.storage, &addr, &record)?;

    let mut list = VALIDATOR_LIST.load(deps.storage)?;
    remove_preserving_order(&mut list, &addr);
    VALIDATOR_LIST.save(deps.storage, &list)?;

    Ok(Response::new()
        .add_attribute("action", "remove_validator")
        .add_attribute("validator", addr)
        .add_attribute("retained_balance", record.supplied)
        .add_attribute("validator_count", list.len().to_string()))
}

/// Public keys of `validators`, in the given order
pub fn get_pubkeys(storage: &dyn Storage, validators: &[Addr]) -> Result<Vec<Binary>, ContractError> {
    validators
        .iter()
        .map(|addr| match VALIDATORS.may_load(storage, addr)? {
            Some(v) if v.active => Ok(v.pubkey),
            _ => Err(ContractError::UnknownValidator {
                id: addr.to_string(),
            }),
        })
        .collect()
}

pub fn load_active_validator(storage: &dyn Storage, addr: &Addr) -> Result<Validator, ContractError> {
    match VALIDATORS.may_load(storage, addr)? {
        Some(v) if v.active => Ok(v),
        _ => Err(ContractError::ValidatorNotFound {
            id: addr.to_string(),
        }),
    }
}

/// Drop `addr` from `list`, shifting later entries down one slot.
/// Returns false if it was not present.
pub fn remove_preserving_order(list: &mut Vec<Addr>, addr: &Addr) -> bool {
    match list.iter().position(|a| a == addr) {
        Some(index) => {
            list.remove(index);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addrs(names: &[&str]) -> Vec<Addr> {
        names.iter().map(|n| Addr::unchecked(*n)).collect()
    }

    #[test]
    fn test_remove_middle_keeps_order() {
        let mut list = addrs(&["a", "b", "c"]);
        assert!(remove_preserving_order(&mut list, &Addr::unchecked("b")));
        assert_eq!(list, addrs(&["a", "c"]));
    }

    #[test]
    fn test_remove_last_clears_tail() {
        let mut list = addrs(&["a", "b", "c"]);
        assert!(remove_preserving_order(&mut list, &Addr::unchecked("c")));
        assert_eq!(list, addrs(&["a", "b"]));

        assert!(remove_preserving_order(&mut list, &Addr::unchecked("a")));
        assert!(remove_preserving_order(&mut list, &Addr::unchecked("b")));
        assert!(list.is_empty());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut list = addrs(&["a", "b"]);
        assert!(!remove_preserving_order(&mut list, &Addr::unchecked("z")));
        assert_eq!(list.len(), 2);
    }
}
