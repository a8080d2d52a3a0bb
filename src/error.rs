use cosmwasm_std::{ConversionOverflowError, DivideByZeroError, OverflowError, StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("{0}")]
    DivideByZero(#[from] DivideByZeroError),

    #[error("{0}")]
    ConversionOverflow(#[from] ConversionOverflowError),

    #[error("Caller is not the admin")]
    CallerNotAdmin {},

    #[error("Caller not authorized: {caller}")]
    CallerNotAuthorized { caller: String },

    #[error("Asset not authorized: {asset}")]
    AssetNotAuthorized { asset: String },

    #[error("Asset already authorized: {asset}")]
    AssetAlreadyAuthorized { asset: String },

    #[error("Presale is not active")]
    PresaleNotActive {},

    #[error("No quantity available for this exchange")]
    NoQuantity {},

    #[error("Insufficient availability. Available: {available}, Requested: {requested}")]
    InsufficientAvailability { available: Uint128, requested: Uint128 },

    #[error("Insufficient locked amount. Locked: {locked}, Requested: {requested}")]
    InsufficientLocked { locked: Uint128, requested: Uint128 },

    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Insufficient allowance. Allowance: {allowance}, Required: {required}")]
    InsufficientAllowance { allowance: Uint128, required: Uint128 },

    #[error("Transfer of {amount} {asset} for {recipient} failed (sale amount {sale_amount}): {reason}")]
    TransferFailed {
        recipient: String,
        asset: String,
        amount: Uint128,
        sale_amount: Uint128,
        reason: String,
    },

    #[error("Refund of {amount} to {recipient} failed: {reason}")]
    RefundFailed {
        recipient: String,
        amount: Uint128,
        reason: String,
    },

    #[error("Settlement of {amount} for {beneficiary} failed (payment {payment_amount} on {payment_network}, reference {payment_reference}): {reason}")]
    SettlementFailed {
        beneficiary: String,
        payment_network: String,
        payment_reference: String,
        payment_amount: Uint128,
        amount: Uint128,
        reason: String,
    },

    #[error("Price of USD-pegged asset {asset} is locked")]
    StablecoinPriceLocked { asset: String },

    #[error("Insufficient contract balance: {available}, needed: {needed}")]
    InsufficientBalance { available: Uint128, needed: Uint128 },

    #[error("Unsupported decimals: {decimals}. Must be at most 18")]
    UnsupportedDecimals { decimals: u8 },

    #[error("Invalid price for asset: {asset}")]
    InvalidPrice { asset: String },

    #[error("Invalid funds: {reason}")]
    InvalidFunds { reason: String },

    #[error("Sale token balance {balance} is below total locked {total_locked}")]
    LedgerInvariantViolated { balance: Uint128, total_locked: Uint128 },

    #[error("Unknown reply id: {id}")]
    UnknownReplyId { id: u64 },
}
