pub mod access;
pub mod asset;
pub mod contract;
pub mod error;
pub mod events;
pub mod exchange;
pub mod inventory;
pub mod lifecycle;
pub mod msg;
pub mod pricing;
pub mod state;

pub use crate::error::ContractError;
