use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Empty, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};

#[cw_serde]
pub struct Config {
    /// Single admin, fixed at instantiation
    pub admin: Addr,
    /// CW20 token being sold (18 decimals)
    pub sale_token: Addr,
    /// Origin of the sale token; receives swept leftovers
    pub sale_token_issuer: Addr,
    /// Receives payment proceeds
    pub proceeds_receiver: Addr,
    /// Sale token price in USD with 4-digit precision (500 = $0.05)
    pub sale_token_usd_price: Uint128,
    /// Native coin denomination
    pub native_denom: String,
    /// CW20 whose price entry also prices the native coin
    pub wrapped_native: Addr,
}

#[cw_serde]
pub struct PresaleWindow {
    pub start_time: Timestamp,
    /// Configured end, never changes after instantiation
    pub configured_end_time: Timestamp,
    /// Effective end, moved earlier by termination
    pub actual_end_time: Timestamp,
}

impl PresaleWindow {
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.start_time <= now && now < self.actual_end_time
    }
}

#[cw_serde]
pub struct AssetPrice {
    /// Sale token units per asset unit, scaled by `PRECISION`
    pub rate: Uint128,
    pub decimals: u8,
    /// USD-pegged reference asset whose rate cannot be changed
    pub price_locked: bool,
}

/// Off-chain payment a reserved transfer settles, kept for audit.
#[cw_serde]
pub struct PaymentDescriptor {
    /// Network the payment was made on (e.g. "ton")
    pub network: String,
    /// Transaction hash or other reference on that network
    pub reference: String,
    /// Amount paid, in the paying asset's own units
    pub amount: Uint128,
}

/// Carried through a trade's transfer sub-messages so a failure can be reported.
#[cw_serde]
pub struct TradeReceipt {
    pub recipient: Addr,
    pub asset: String,
    pub amount_in: Uint128,
    pub amount_out: Uint128,
}

/// Carried through the settlement transfer sub-message.
#[cw_serde]
pub struct SettlementReceipt {
    pub beneficiary: Addr,
    pub amount: Uint128,
    pub payment: PaymentDescriptor,
}

/// Carried through the native refund sub-message.
#[cw_serde]
pub struct RefundReceipt {
    pub recipient: Addr,
    pub amount: Uint128,
}

pub const CONFIG: Item<Config> = Item::new("config");

pub const WINDOW: Item<PresaleWindow> = Item::new("window");

/// Participants allowed to exchange
pub const AUTHORIZED_USERS: Map<&Addr, Empty> = Map::new("authorized_users");

/// Price entry per authorized CW20 payment asset
pub const PRICES: Map<&Addr, AssetPrice> = Map::new("prices");

/// Authorized payment assets in insertion order
pub const ASSET_ORDER: Item<Vec<Addr>> = Item::new("asset_order");

/// Sum of all entries in `LOCKED`
pub const TOTAL_LOCKED: Item<Uint128> = Item::new("total_locked");

/// Sale token units reserved per beneficiary
pub const LOCKED: Map<&Addr, Uint128> = Map::new("locked");
