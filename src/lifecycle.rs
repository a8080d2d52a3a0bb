use cosmwasm_std::{Deps, DepsMut, Env, Event, MessageInfo, Response, StdResult, Storage, Timestamp, Uint128};

use crate::access::ensure_admin;
use crate::asset::{cw20_transfer_msg, native_send_msg, query_native_balance};
use crate::error::ContractError;
use crate::events;
use crate::inventory::sale_token_balance;
use crate::msg::StatusResponse;
use crate::state::{CONFIG, WINDOW};

pub fn ensure_active(storage: &dyn Storage, env: &Env) -> Result<(), ContractError> {
    if !WINDOW.load(storage)?.is_active(env.block.time) {
        return Err(ContractError::PresaleNotActive {});
    }
    Ok(())
}

/// Pulls the effective end back to `now`. The end never moves later.
pub fn terminate(storage: &mut dyn Storage, now: Timestamp, reason: &str) -> StdResult<Event> {
    let mut window = WINDOW.load(storage)?;
    window.actual_end_time = window.actual_end_time.min(now);
    WINDOW.save(storage, &window)?;
    Ok(events::presale_terminated(window.actual_end_time, reason))
}

pub fn terminate_early(deps: DepsMut, env: Env, info: MessageInfo) -> Result<Response, ContractError> {
    ensure_admin(deps.storage, &info.sender)?;

    let event = terminate(deps.storage, env.block.time, "admin")?;
    deps.api.debug("PRESALE: terminated early by admin");

    Ok(Response::new()
        .add_event(event)
        .add_attribute("method", "terminate_early")
        .add_attribute("admin", info.sender))
}

/// Sends `amount` of collected native coin to the proceeds receiver.
pub fn withdraw_native(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.proceeds_receiver && info.sender != config.admin {
        return Err(ContractError::CallerNotAdmin {});
    }

    let balance = query_native_balance(deps.as_ref(), &env.contract.address, &config.native_denom)?;
    if amount.is_zero() || amount > balance {
        return Err(ContractError::InsufficientBalance {
            available: balance,
            needed: amount,
        });
    }

    deps.api.debug(&format!(
        "PRESALE: withdraw_native amount={} to={}",
        amount, config.proceeds_receiver
    ));

    Ok(Response::new()
        .add_message(native_send_msg(&config.native_denom, &config.proceeds_receiver, amount))
        .add_attribute("method", "withdraw_native")
        .add_attribute("amount", amount)
        .add_attribute("recipient", config.proceeds_receiver))
}

/// Returns the whole sale token balance, reserved amounts included, to the
/// issuer and ends the presale.
pub fn sweep_remaining_sale_tokens(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    ensure_admin(deps.storage, &info.sender)?;
    let config = CONFIG.load(deps.storage)?;

    let balance = sale_token_balance(deps.as_ref(), &env)?;
    let event = terminate(deps.storage, env.block.time, "swept")?;

    let mut response = Response::new()
        .add_event(event)
        .add_attribute("method", "sweep_remaining_sale_tokens")
        .add_attribute("amount", balance)
        .add_attribute("recipient", config.sale_token_issuer.as_str());
    if !balance.is_zero() {
        response = response.add_message(cw20_transfer_msg(
            &config.sale_token,
            &config.sale_token_issuer,
            balance,
        )?);
    }

    deps.api.debug(&format!(
        "PRESALE: swept {} sale tokens to {}",
        balance, config.sale_token_issuer
    ));

    Ok(response)
}

pub fn query_status(deps: Deps, env: Env) -> StdResult<StatusResponse> {
    let window = WINDOW.load(deps.storage)?;
    Ok(StatusResponse {
        is_active: window.is_active(env.block.time),
        start_time: window.start_time,
        configured_end_time: window.configured_end_time,
        actual_end_time: window.actual_end_time,
        now: env.block.time,
    })
}

pub fn query_native_balance_of_presale(deps: Deps, env: Env) -> Result<Uint128, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    query_native_balance(deps, &env.contract.address, &config.native_denom)
}
