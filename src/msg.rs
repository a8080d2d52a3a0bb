use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Timestamp, Uint128};

use crate::asset::AssetInfo;
use crate::state::PaymentDescriptor;

#[cw_serde]
pub struct PaymentAssetInit {
    /// CW20 contract address
    pub address: String,
    pub decimals: u8,
}

#[cw_serde]
pub struct InstantiateMsg {
    /// Admin address. Defaults to the instantiating account.
    pub admin: Option<String>,
    /// CW20 token sold by the presale (18 decimals)
    pub sale_token: String,
    /// Account that receives swept sale tokens
    pub sale_token_issuer: String,
    /// Account that receives payment proceeds
    pub proceeds_receiver: String,
    /// Sale token price in USD with 4-digit precision (500 = $0.05)
    pub sale_token_usd_price: Uint128,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// Native coin denomination accepted by `exchange_native`
    pub native_denom: String,
    /// Wrapped form of the native coin; its price also prices the native coin
    pub wrapped_native: PaymentAssetInit,
    /// Optional wrapped-native USD price with 4-digit precision. Defaults to $2450.
    pub wrapped_native_usd_price: Option<Uint128>,
    /// USD-pegged assets, priced at $1 and locked
    pub stablecoins: Vec<PaymentAssetInit>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Admin: allow an account to exchange
    AuthorizeUser { account: String },
    /// Admin: allow several accounts to exchange
    AuthorizeUsers { accounts: Vec<String> },
    /// Admin: accept a new CW20 payment asset
    AuthorizeAsset {
        asset: String,
        decimals: u8,
        usd_price: Uint128,
    },
    /// Admin: update the USD price of a payment asset
    SetPrice { asset: String, usd_price: Uint128 },
    /// Exchange a CW20 payment asset previously approved for the presale
    Exchange { asset: String, amount: Uint128 },
    /// Exchange the native coin attached to the message
    ExchangeNative {},
    /// Admin: reserve sale tokens for a beneficiary
    Lock { beneficiary: String, amount: Uint128 },
    /// Admin: release part of a beneficiary's reservation
    Unlock { beneficiary: String, amount: Uint128 },
    /// Admin: deliver reserved sale tokens for a payment made elsewhere
    SettleReservedTransfer {
        beneficiary: String,
        payment: PaymentDescriptor,
        amount: Uint128,
    },
    /// Admin: end the presale now
    TerminateEarly {},
    /// Admin or proceeds receiver: send collected native coin to the proceeds receiver
    WithdrawNative { amount: Uint128 },
    /// Admin: return all sale tokens to the issuer and end the presale
    SweepRemainingSaleTokens {},
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ConfigResponse)]
    Config {},
    /// Presale window and whether it is open now
    #[returns(StatusResponse)]
    Status {},
    #[returns(bool)]
    IsAdmin { address: String },
    #[returns(bool)]
    IsAuthorized { address: String },
    /// Rate of an authorized payment asset
    #[returns(AssetPriceResponse)]
    Price { asset: AssetInfo },
    /// All authorized CW20 payment assets in the order they were added
    #[returns(AuthorizedAssetsResponse)]
    AuthorizedAssets {},
    /// Sale tokens `amount` of `asset` buys now, clamped to availability
    #[returns(QuoteResponse)]
    Quote { asset: AssetInfo, amount: Uint128 },
    #[returns(AvailabilityResponse)]
    AvailableForSale {},
    #[returns(LockedResponse)]
    Locked { beneficiary: String },
    #[returns(Uint128)]
    TotalLocked {},
    /// Native coin held by the presale
    #[returns(Uint128)]
    NativeBalance {},
}

#[cw_serde]
pub struct ConfigResponse {
    pub admin: Addr,
    pub sale_token: Addr,
    pub sale_token_issuer: Addr,
    pub proceeds_receiver: Addr,
    pub sale_token_usd_price: Uint128,
    pub native_denom: String,
    pub wrapped_native: Addr,
}

#[cw_serde]
pub struct StatusResponse {
    pub is_active: bool,
    pub start_time: Timestamp,
    pub configured_end_time: Timestamp,
    pub actual_end_time: Timestamp,
    pub now: Timestamp,
}

#[cw_serde]
pub struct AssetPriceResponse {
    pub asset: AssetInfo,
    pub rate: Uint128,
    pub decimals: u8,
    pub price_locked: bool,
}

#[cw_serde]
pub struct AuthorizedAssetsResponse {
    pub assets: Vec<AssetPriceResponse>,
}

#[cw_serde]
pub struct QuoteResponse {
    /// Payment that would actually be taken
    pub amount_in: Uint128,
    /// Sale tokens that would be delivered
    pub amount_out: Uint128,
}

#[cw_serde]
pub struct AvailabilityResponse {
    pub balance: Uint128,
    pub total_locked: Uint128,
    pub available: Uint128,
}

#[cw_serde]
pub struct LockedResponse {
    pub beneficiary: Addr,
    pub locked: Uint128,
}
