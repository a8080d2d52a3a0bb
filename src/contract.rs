use cosmwasm_std::{
    entry_point, to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Reply, Response,
    StdError, Uint128,
};
use cw2::{get_contract_version, set_contract_version};

use crate::access::{authorize_users, query_is_admin, query_is_authorized};
use crate::error::ContractError;
use crate::exchange::{exchange, exchange_native, handle_reply, query_quote, settle_reserved_transfer};
use crate::inventory::{lock, query_available_for_sale, query_locked, total_locked, unlock};
use crate::lifecycle::{
    query_native_balance_of_presale, query_status, sweep_remaining_sale_tokens, terminate_early,
    withdraw_native,
};
use crate::msg::{ConfigResponse, ExecuteMsg, InstantiateMsg, QueryMsg};
use crate::pricing::{
    authorize_asset, insert_asset, query_authorized_assets, query_price, set_price,
    DEFAULT_WRAPPED_NATIVE_USD_PRICE, STABLECOIN_USD_PRICE,
};
use crate::state::{Config, PresaleWindow, ASSET_ORDER, CONFIG, TOTAL_LOCKED, WINDOW};

const CONTRACT_NAME: &str = "token-presale";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    if msg.start_time >= msg.end_time {
        return Err(ContractError::InvalidConfiguration {
            reason: format!(
                "start time {} must be before end time {}",
                msg.start_time, msg.end_time
            ),
        });
    }
    if msg.sale_token_usd_price.is_zero() {
        return Err(ContractError::InvalidConfiguration {
            reason: "sale token USD price must be greater than zero".to_string(),
        });
    }
    if msg.native_denom.is_empty() {
        return Err(ContractError::InvalidConfiguration {
            reason: "native denom must be set".to_string(),
        });
    }

    let admin = match msg.admin {
        Some(ref addr) if !addr.is_empty() => deps.api.addr_validate(addr)?,
        _ => info.sender,
    };

    let config = Config {
        admin: admin.clone(),
        sale_token: deps.api.addr_validate(&msg.sale_token)?,
        sale_token_issuer: deps.api.addr_validate(&msg.sale_token_issuer)?,
        proceeds_receiver: deps.api.addr_validate(&msg.proceeds_receiver)?,
        sale_token_usd_price: msg.sale_token_usd_price,
        native_denom: msg.native_denom,
        wrapped_native: deps.api.addr_validate(&msg.wrapped_native.address)?,
    };
    CONFIG.save(deps.storage, &config)?;

    WINDOW.save(
        deps.storage,
        &PresaleWindow {
            start_time: msg.start_time,
            configured_end_time: msg.end_time,
            actual_end_time: msg.end_time,
        },
    )?;
    TOTAL_LOCKED.save(deps.storage, &Uint128::zero())?;
    ASSET_ORDER.save(deps.storage, &vec![])?;

    let wrapped_native_usd_price = msg
        .wrapped_native_usd_price
        .unwrap_or(Uint128::new(DEFAULT_WRAPPED_NATIVE_USD_PRICE));
    let wrapped_native = insert_asset(
        deps.storage,
        &config.wrapped_native,
        msg.wrapped_native.decimals,
        wrapped_native_usd_price,
        false,
    )?;

    for stablecoin in msg.stablecoins.iter() {
        let address = deps.api.addr_validate(&stablecoin.address)?;
        insert_asset(
            deps.storage,
            &address,
            stablecoin.decimals,
            Uint128::new(STABLECOIN_USD_PRICE),
            true,
        )?;
    }

    deps.api.debug(&format!(
        "PRESALE: instantiated admin={} sale_token={} wrapped_native_rate={} stablecoins={}",
        admin,
        config.sale_token,
        wrapped_native.rate,
        msg.stablecoins.len()
    ));

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("admin", admin)
        .add_attribute("sale_token", config.sale_token)
        .add_attribute("start_time", msg.start_time.seconds().to_string())
        .add_attribute("end_time", msg.end_time.seconds().to_string()))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::AuthorizeUser { account } => authorize_users(deps, info, vec![account]),
        ExecuteMsg::AuthorizeUsers { accounts } => authorize_users(deps, info, accounts),
        ExecuteMsg::AuthorizeAsset {
            asset,
            decimals,
            usd_price,
        } => authorize_asset(deps, info, asset, decimals, usd_price),
        ExecuteMsg::SetPrice { asset, usd_price } => set_price(deps, info, asset, usd_price),
        ExecuteMsg::Exchange { asset, amount } => exchange(deps, env, info, asset, amount),
        ExecuteMsg::ExchangeNative {} => exchange_native(deps, env, info),
        ExecuteMsg::Lock {
            beneficiary,
            amount,
        } => lock(deps, env, info, beneficiary, amount),
        ExecuteMsg::Unlock {
            beneficiary,
            amount,
        } => unlock(deps, env, info, beneficiary, amount),
        ExecuteMsg::SettleReservedTransfer {
            beneficiary,
            payment,
            amount,
        } => settle_reserved_transfer(deps, env, info, beneficiary, payment, amount),
        ExecuteMsg::TerminateEarly {} => terminate_early(deps, env, info),
        ExecuteMsg::WithdrawNative { amount } => withdraw_native(deps, env, info, amount),
        ExecuteMsg::SweepRemainingSaleTokens {} => sweep_remaining_sale_tokens(deps, env, info),
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn reply(deps: DepsMut, env: Env, msg: Reply) -> Result<Response, ContractError> {
    handle_reply(deps, env, msg)
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> Result<Binary, ContractError> {
    let binary = match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?)?,
        QueryMsg::Status {} => to_json_binary(&query_status(deps, env)?)?,
        QueryMsg::IsAdmin { address } => to_json_binary(&query_is_admin(deps, address)?)?,
        QueryMsg::IsAuthorized { address } => {
            to_json_binary(&query_is_authorized(deps, address)?)?
        }
        QueryMsg::Price { asset } => to_json_binary(&query_price(deps, asset)?)?,
        QueryMsg::AuthorizedAssets {} => to_json_binary(&query_authorized_assets(deps)?)?,
        QueryMsg::Quote { asset, amount } => {
            to_json_binary(&query_quote(deps, env, asset, amount)?)?
        }
        QueryMsg::AvailableForSale {} => to_json_binary(&query_available_for_sale(deps, env)?)?,
        QueryMsg::Locked { beneficiary } => to_json_binary(&query_locked(deps, beneficiary)?)?,
        QueryMsg::TotalLocked {} => to_json_binary(&total_locked(deps.storage)?)?,
        QueryMsg::NativeBalance {} => {
            to_json_binary(&query_native_balance_of_presale(deps, env)?)?
        }
    };
    Ok(binary)
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: Binary) -> Result<Response, ContractError> {
    let old = get_contract_version(deps.storage)?;
    if old.contract != CONTRACT_NAME {
        return Err(ContractError::Std(StdError::msg(format!(
            "wrong contract: expected {} got {}",
            CONTRACT_NAME, old.contract
        ))));
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", old.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}

fn query_config(deps: Deps) -> Result<ConfigResponse, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        admin: config.admin,
        sale_token: config.sale_token,
        sale_token_issuer: config.sale_token_issuer,
        proceeds_receiver: config.proceeds_receiver,
        sale_token_usd_price: config.sale_token_usd_price,
        native_denom: config.native_denom,
        wrapped_native: config.wrapped_native,
    })
}
