//! Notification events. Observability only, nothing reads them back.

use cosmwasm_std::{Addr, Event, Timestamp, Uint128};

use crate::state::PaymentDescriptor;

pub fn trade_executed(to: &Addr, asset: &str, amount_in: Uint128, amount_out: Uint128) -> Event {
    Event::new("trade_executed")
        .add_attribute("to", to.as_str())
        .add_attribute("asset", asset)
        .add_attribute("amount_in", amount_in)
        .add_attribute("amount_out", amount_out)
}

pub fn settlement_executed(beneficiary: &Addr, amount: Uint128, payment: &PaymentDescriptor) -> Event {
    Event::new("settlement_executed")
        .add_attribute("beneficiary", beneficiary.as_str())
        .add_attribute("amount", amount)
        .add_attribute("payment_network", payment.network.as_str())
        .add_attribute("payment_reference", payment.reference.as_str())
        .add_attribute("payment_amount", payment.amount)
}

pub fn authorized_user_added(account: &Addr) -> Event {
    Event::new("authorized_user_added").add_attribute("account", account.as_str())
}

pub fn presale_terminated(at: Timestamp, reason: &str) -> Event {
    Event::new("presale_terminated")
        .add_attribute("at", at.seconds().to_string())
        .add_attribute("reason", reason)
}
