//! Fungible asset plumbing: the payment asset identifier and the subset of the
//! CW20 interface the presale talks to (`transfer`, `transfer_from`, `balance`,
//! `allowance`).
//!
//! CW20 contracts report success by not failing; there is no boolean result to
//! inspect, so a transfer message that executes without error has succeeded.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{
    to_json_binary, Addr, BankMsg, Coin, CosmosMsg, Deps, StdResult, Timestamp, Uint128, WasmMsg,
};

use crate::error::ContractError;

/// Payment asset accepted by the presale.
#[cw_serde]
pub enum AssetInfo {
    /// The chain's native coin, priced through the wrapped-native token.
    Native {},
    /// A CW20 token contract.
    Cw20 { address: String },
}

impl std::fmt::Display for AssetInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetInfo::Native {} => write!(f, "native"),
            AssetInfo::Cw20 { address } => write!(f, "cw20:{}", address),
        }
    }
}

#[cw_serde]
pub enum Cw20ExecuteMsg {
    Transfer {
        recipient: String,
        amount: Uint128,
    },
    TransferFrom {
        owner: String,
        recipient: String,
        amount: Uint128,
    },
}

#[cw_serde]
pub enum Cw20QueryMsg {
    Balance { address: String },
    Allowance { owner: String, spender: String },
}

#[cw_serde]
pub struct BalanceResponse {
    pub balance: Uint128,
}

#[cw_serde]
pub enum Expiration {
    AtHeight(u64),
    AtTime(Timestamp),
    Never {},
}

#[cw_serde]
pub struct AllowanceResponse {
    pub allowance: Uint128,
    pub expires: Expiration,
}

/// Push `amount` of a CW20 token held by the presale to `recipient`.
pub fn cw20_transfer_msg(token: &Addr, recipient: &Addr, amount: Uint128) -> StdResult<CosmosMsg> {
    Ok(WasmMsg::Execute {
        contract_addr: token.to_string(),
        msg: to_json_binary(&Cw20ExecuteMsg::Transfer {
            recipient: recipient.to_string(),
            amount,
        })?,
        funds: vec![],
    }
    .into())
}

/// Pull `amount` of a CW20 token from `owner` using a previously granted allowance.
pub fn cw20_transfer_from_msg(
    token: &Addr,
    owner: &Addr,
    recipient: &Addr,
    amount: Uint128,
) -> StdResult<CosmosMsg> {
    Ok(WasmMsg::Execute {
        contract_addr: token.to_string(),
        msg: to_json_binary(&Cw20ExecuteMsg::TransferFrom {
            owner: owner.to_string(),
            recipient: recipient.to_string(),
            amount,
        })?,
        funds: vec![],
    }
    .into())
}

pub fn native_send_msg(denom: &str, recipient: &Addr, amount: Uint128) -> CosmosMsg {
    BankMsg::Send {
        to_address: recipient.to_string(),
        amount: vec![Coin {
            denom: denom.to_string(),
            amount: amount.into(),
        }],
    }
    .into()
}

pub fn query_cw20_balance(deps: Deps, token: &Addr, account: &Addr) -> StdResult<Uint128> {
    let response: BalanceResponse = deps.querier.query_wasm_smart(
        token.to_string(),
        &Cw20QueryMsg::Balance {
            address: account.to_string(),
        },
    )?;
    Ok(response.balance)
}

pub fn query_cw20_allowance(
    deps: Deps,
    token: &Addr,
    owner: &Addr,
    spender: &Addr,
) -> StdResult<Uint128> {
    let response: AllowanceResponse = deps.querier.query_wasm_smart(
        token.to_string(),
        &Cw20QueryMsg::Allowance {
            owner: owner.to_string(),
            spender: spender.to_string(),
        },
    )?;
    Ok(response.allowance)
}

/// Native balance held by `account`, narrowed to `Uint128`.
pub fn query_native_balance(deps: Deps, account: &Addr, denom: &str) -> Result<Uint128, ContractError> {
    let balance = deps.querier.query_balance(account.to_string(), denom)?;
    let amount: Uint128 = balance.amount.try_into()?;
    Ok(amount)
}
