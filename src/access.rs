use cosmwasm_std::{Addr, Deps, DepsMut, Empty, MessageInfo, Response, StdResult, Storage};

use crate::error::ContractError;
use crate::events;
use crate::state::{AUTHORIZED_USERS, CONFIG};

pub fn is_admin(storage: &dyn Storage, account: &Addr) -> StdResult<bool> {
    Ok(CONFIG.load(storage)?.admin == *account)
}

pub fn ensure_admin(storage: &dyn Storage, sender: &Addr) -> Result<(), ContractError> {
    if !is_admin(storage, sender)? {
        return Err(ContractError::CallerNotAdmin {});
    }
    Ok(())
}

pub fn is_authorized(storage: &dyn Storage, account: &Addr) -> bool {
    AUTHORIZED_USERS.has(storage, account)
}

pub fn ensure_authorized(storage: &dyn Storage, caller: &Addr) -> Result<(), ContractError> {
    if !is_authorized(storage, caller) {
        return Err(ContractError::CallerNotAuthorized {
            caller: caller.to_string(),
        });
    }
    Ok(())
}

/// Adds every account to the participant set. Accounts already present are
/// skipped without error and without an event.
pub fn authorize_users(
    deps: DepsMut,
    info: MessageInfo,
    accounts: Vec<String>,
) -> Result<Response, ContractError> {
    ensure_admin(deps.storage, &info.sender)?;

    let mut response = Response::new().add_attribute("method", "authorize_users");
    let mut added = 0u32;
    for account in accounts {
        let account = deps.api.addr_validate(&account)?;
        if is_authorized(deps.storage, &account) {
            continue;
        }
        AUTHORIZED_USERS.save(deps.storage, &account, &Empty {})?;
        response = response.add_event(events::authorized_user_added(&account));
        added += 1;
    }

    deps.api
        .debug(&format!("PRESALE: authorize_users added={}", added));

    Ok(response.add_attribute("added", added.to_string()))
}

pub fn query_is_authorized(deps: Deps, account: String) -> StdResult<bool> {
    let account = deps.api.addr_validate(&account)?;
    Ok(is_authorized(deps.storage, &account))
}

pub fn query_is_admin(deps: Deps, account: String) -> StdResult<bool> {
    let account = deps.api.addr_validate(&account)?;
    is_admin(deps.storage, &account)
}
