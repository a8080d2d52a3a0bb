use cosmwasm_std::{Addr, Deps, DepsMut, Env, MessageInfo, Response, StdResult, Storage, Uint128};

use crate::access::ensure_admin;
use crate::asset::query_cw20_balance;
use crate::error::ContractError;
use crate::lifecycle::ensure_active;
use crate::msg::{AvailabilityResponse, LockedResponse};
use crate::state::{CONFIG, LOCKED, TOTAL_LOCKED};

pub fn total_locked(storage: &dyn Storage) -> StdResult<Uint128> {
    Ok(TOTAL_LOCKED.may_load(storage)?.unwrap_or_default())
}

pub fn locked_of(storage: &dyn Storage, beneficiary: &Addr) -> StdResult<Uint128> {
    Ok(LOCKED.may_load(storage, beneficiary)?.unwrap_or_default())
}

/// Sale token balance held by the presale, read from the token contract.
pub fn sale_token_balance(deps: Deps, env: &Env) -> StdResult<Uint128> {
    let config = CONFIG.load(deps.storage)?;
    query_cw20_balance(deps, &config.sale_token, &env.contract.address)
}

/// Balance minus everything reserved. A balance below the reserved total means
/// tokens left out-of-band and is reported rather than wrapped.
pub fn available_for_sale(deps: Deps, env: &Env) -> Result<Uint128, ContractError> {
    let balance = sale_token_balance(deps, env)?;
    let total_locked = total_locked(deps.storage)?;
    balance
        .checked_sub(total_locked)
        .map_err(|_| ContractError::LedgerInvariantViolated {
            balance,
            total_locked,
        })
}

/// Reserves `amount` for `beneficiary`. Caller checks availability.
fn add_locked(storage: &mut dyn Storage, beneficiary: &Addr, amount: Uint128) -> Result<Uint128, ContractError> {
    let locked = locked_of(storage, beneficiary)?.checked_add(amount)?;
    LOCKED.save(storage, beneficiary, &locked)?;
    let total = total_locked(storage)?.checked_add(amount)?;
    TOTAL_LOCKED.save(storage, &total)?;
    Ok(locked)
}

/// Releases `amount` of `beneficiary`'s reservation, failing if it holds less.
pub fn consume_locked(
    storage: &mut dyn Storage,
    beneficiary: &Addr,
    amount: Uint128,
) -> Result<Uint128, ContractError> {
    let locked = locked_of(storage, beneficiary)?;
    if amount > locked {
        return Err(ContractError::InsufficientLocked {
            locked,
            requested: amount,
        });
    }
    let remaining = locked - amount;
    LOCKED.save(storage, beneficiary, &remaining)?;
    let total = total_locked(storage)?.checked_sub(amount)?;
    TOTAL_LOCKED.save(storage, &total)?;
    Ok(remaining)
}

pub fn lock(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    beneficiary: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    ensure_admin(deps.storage, &info.sender)?;
    ensure_active(deps.storage, &env)?;
    let beneficiary = deps.api.addr_validate(&beneficiary)?;

    let available = available_for_sale(deps.as_ref(), &env)?;
    if amount > available {
        return Err(ContractError::InsufficientAvailability {
            available,
            requested: amount,
        });
    }

    let locked = add_locked(deps.storage, &beneficiary, amount)?;

    deps.api.debug(&format!(
        "PRESALE: lock beneficiary={} amount={} locked={}",
        beneficiary, amount, locked
    ));

    Ok(Response::new()
        .add_attribute("method", "lock")
        .add_attribute("beneficiary", beneficiary)
        .add_attribute("amount", amount)
        .add_attribute("locked", locked))
}

pub fn unlock(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    beneficiary: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    ensure_admin(deps.storage, &info.sender)?;
    ensure_active(deps.storage, &env)?;
    let beneficiary = deps.api.addr_validate(&beneficiary)?;

    let locked = consume_locked(deps.storage, &beneficiary, amount)?;

    deps.api.debug(&format!(
        "PRESALE: unlock beneficiary={} amount={} locked={}",
        beneficiary, amount, locked
    ));

    Ok(Response::new()
        .add_attribute("method", "unlock")
        .add_attribute("beneficiary", beneficiary)
        .add_attribute("amount", amount)
        .add_attribute("locked", locked))
}

pub fn query_available_for_sale(deps: Deps, env: Env) -> Result<AvailabilityResponse, ContractError> {
    let balance = sale_token_balance(deps, &env)?;
    let total_locked = total_locked(deps.storage)?;
    let available = available_for_sale(deps, &env)?;
    Ok(AvailabilityResponse {
        balance,
        total_locked,
        available,
    })
}

pub fn query_locked(deps: Deps, beneficiary: String) -> StdResult<LockedResponse> {
    let beneficiary = deps.api.addr_validate(&beneficiary)?;
    let locked = locked_of(deps.storage, &beneficiary)?;
    Ok(LockedResponse { beneficiary, locked })
}
