//! Exchange of payment assets for the sale token, and settlement of reserved
//! allocations.
//!
//! A request stages its ledger writes and transfer messages together. Transfers
//! that can fail are dispatched as sub-messages whose error reply aborts the whole
//! request, so a failed sale token push also undoes the payment pull and any
//! termination that request recorded.

use cosmwasm_std::{
    from_json, to_json_binary, Coin, Deps, DepsMut, Env, MessageInfo, Reply, Response, SubMsg,
    SubMsgResult, Uint128, Uint256,
};

use crate::access::{ensure_admin, ensure_authorized};
use crate::asset::{
    cw20_transfer_from_msg, cw20_transfer_msg, native_send_msg, query_cw20_allowance, AssetInfo,
};
use crate::error::ContractError;
use crate::events;
use crate::inventory::{available_for_sale, consume_locked};
use crate::lifecycle::{ensure_active, terminate};
use crate::msg::QuoteResponse;
use crate::pricing::{convert_from_sale_token, load_price, price_of, sale_value};
use crate::state::{
    AssetPrice, PaymentDescriptor, RefundReceipt, SettlementReceipt, TradeReceipt, CONFIG,
};

pub const TRADE_TRANSFER_REPLY_ID: u64 = 1;
pub const REFUND_REPLY_ID: u64 = 2;
pub const SETTLEMENT_REPLY_ID: u64 = 3;

/// Outcome of pricing a request against current availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    /// Payment asset actually taken
    pub amount_in: Uint128,
    /// Sale token delivered
    pub amount_out: Uint128,
}

/// A clamped fill takes only the payment that corresponds to `available`, never
/// the full request. The sale value is compared before it is narrowed.
fn clamp_to_available(
    price: &AssetPrice,
    requested: Uint128,
    available: Uint128,
) -> Result<Fill, ContractError> {
    let value = sale_value(price, requested)?;
    if value > Uint256::from(available) {
        return Ok(Fill {
            amount_in: convert_from_sale_token(price, available)?,
            amount_out: available,
        });
    }
    Ok(Fill {
        amount_in: requested,
        amount_out: Uint128::try_from(value)?,
    })
}

/// Prices `requested` and clamps the result to `available`.
pub fn compute_fill(
    price: &AssetPrice,
    requested: Uint128,
    available: Uint128,
) -> Result<Fill, ContractError> {
    if requested.is_zero() || available.is_zero() {
        return Err(ContractError::NoQuantity {});
    }

    let fill = clamp_to_available(price, requested, available)?;
    if fill.amount_in.is_zero() || fill.amount_out.is_zero() {
        return Err(ContractError::NoQuantity {});
    }
    Ok(fill)
}

pub fn query_quote(
    deps: Deps,
    env: Env,
    asset: AssetInfo,
    amount: Uint128,
) -> Result<QuoteResponse, ContractError> {
    let price = load_price(deps, &asset)?;
    let available = available_for_sale(deps, &env)?;

    let fill = clamp_to_available(&price, amount, available)?;
    Ok(QuoteResponse {
        amount_in: fill.amount_in,
        amount_out: fill.amount_out,
    })
}

/// Exchanges `amount` of an authorized CW20 the caller has approved for the presale.
pub fn exchange(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    asset: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    ensure_active(deps.storage, &env)?;
    let token = deps.api.addr_validate(&asset)?;
    let price = price_of(deps.storage, &token)?;
    ensure_authorized(deps.storage, &info.sender)?;

    let available = available_for_sale(deps.as_ref(), &env)?;
    if amount.is_zero() || available.is_zero() {
        return Err(ContractError::NoQuantity {});
    }

    let allowance = query_cw20_allowance(deps.as_ref(), &token, &info.sender, &env.contract.address)?;
    if allowance < amount {
        return Err(ContractError::InsufficientAllowance {
            allowance,
            required: amount,
        });
    }

    let fill = compute_fill(&price, amount, available)?;
    let config = CONFIG.load(deps.storage)?;

    deps.api.debug(&format!(
        "PRESALE: exchange caller={} asset={} requested={} amount_in={} amount_out={} available={}",
        info.sender, token, amount, fill.amount_in, fill.amount_out, available
    ));

    let receipt = to_json_binary(&TradeReceipt {
        recipient: info.sender.clone(),
        asset: token.to_string(),
        amount_in: fill.amount_in,
        amount_out: fill.amount_out,
    })?;
    let pull = SubMsg::reply_on_error(
        cw20_transfer_from_msg(&token, &info.sender, &env.contract.address, fill.amount_in)?,
        TRADE_TRANSFER_REPLY_ID,
    )
    .with_payload(receipt.clone());
    let push = SubMsg::reply_on_error(
        cw20_transfer_msg(&config.sale_token, &info.sender, fill.amount_out)?,
        TRADE_TRANSFER_REPLY_ID,
    )
    .with_payload(receipt);
    let forward = cw20_transfer_msg(&token, &config.proceeds_receiver, fill.amount_in)?;

    let mut response = Response::new()
        .add_submessage(pull)
        .add_submessage(push)
        .add_message(forward)
        .add_event(events::trade_executed(
            &info.sender,
            token.as_str(),
            fill.amount_in,
            fill.amount_out,
        ));
    if fill.amount_out == available {
        response = response.add_event(terminate(deps.storage, env.block.time, "sold_out")?);
        deps.api.debug("PRESALE: sold out, presale terminated");
    }

    Ok(response
        .add_attribute("method", "exchange")
        .add_attribute("buyer", info.sender)
        .add_attribute("asset", token)
        .add_attribute("amount_in", fill.amount_in)
        .add_attribute("amount_out", fill.amount_out))
}

/// Single coin of the native denom attached to the call. Other denoms are refused.
fn native_payment(funds: &[Coin], denom: &str) -> Result<Uint128, ContractError> {
    match funds {
        [] => Ok(Uint128::zero()),
        [coin] if coin.denom == denom => Ok(Uint128::try_from(coin.amount)?),
        _ => Err(ContractError::InvalidFunds {
            reason: format!("expected only {}", denom),
        }),
    }
}

/// Exchanges the native coin attached to the call. Whatever exceeds the clamped
/// fill goes straight back to the caller; a failed refund aborts the request.
pub fn exchange_native(deps: DepsMut, env: Env, info: MessageInfo) -> Result<Response, ContractError> {
    ensure_active(deps.storage, &env)?;
    let price = load_price(deps.as_ref(), &AssetInfo::Native {})?;
    ensure_authorized(deps.storage, &info.sender)?;

    let config = CONFIG.load(deps.storage)?;
    let value = native_payment(&info.funds, &config.native_denom)?;
    let available = available_for_sale(deps.as_ref(), &env)?;
    let fill = compute_fill(&price, value, available)?;
    let refund = value.checked_sub(fill.amount_in)?;

    deps.api.debug(&format!(
        "PRESALE: exchange_native caller={} value={} amount_in={} amount_out={} refund={}",
        info.sender, value, fill.amount_in, fill.amount_out, refund
    ));

    let receipt = to_json_binary(&TradeReceipt {
        recipient: info.sender.clone(),
        asset: config.native_denom.clone(),
        amount_in: fill.amount_in,
        amount_out: fill.amount_out,
    })?;
    let push = SubMsg::reply_on_error(
        cw20_transfer_msg(&config.sale_token, &info.sender, fill.amount_out)?,
        TRADE_TRANSFER_REPLY_ID,
    )
    .with_payload(receipt);

    let mut response = Response::new().add_submessage(push);
    if !refund.is_zero() {
        let refund_receipt = to_json_binary(&RefundReceipt {
            recipient: info.sender.clone(),
            amount: refund,
        })?;
        response = response.add_submessage(
            SubMsg::reply_on_error(
                native_send_msg(&config.native_denom, &info.sender, refund),
                REFUND_REPLY_ID,
            )
            .with_payload(refund_receipt),
        );
    }
    response = response.add_event(events::trade_executed(
        &info.sender,
        &config.native_denom,
        fill.amount_in,
        fill.amount_out,
    ));
    if fill.amount_out == available {
        response = response.add_event(terminate(deps.storage, env.block.time, "sold_out")?);
        deps.api.debug("PRESALE: sold out, presale terminated");
    }

    Ok(response
        .add_attribute("method", "exchange_native")
        .add_attribute("buyer", info.sender)
        .add_attribute("amount_in", fill.amount_in)
        .add_attribute("amount_out", fill.amount_out)
        .add_attribute("refund", refund))
}

/// Delivers `amount` of `beneficiary`'s reserved allocation for a payment made
/// off-chain. The reservation is released before the transfer; if the transfer
/// fails the request aborts and the reservation is back in place.
pub fn settle_reserved_transfer(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    beneficiary: String,
    payment: PaymentDescriptor,
    amount: Uint128,
) -> Result<Response, ContractError> {
    ensure_admin(deps.storage, &info.sender)?;
    ensure_active(deps.storage, &env)?;
    let beneficiary = deps.api.addr_validate(&beneficiary)?;
    let config = CONFIG.load(deps.storage)?;

    let remaining = consume_locked(deps.storage, &beneficiary, amount)?;

    deps.api.debug(&format!(
        "PRESALE: settle beneficiary={} amount={} reference={} remaining_locked={}",
        beneficiary, amount, payment.reference, remaining
    ));

    let receipt = to_json_binary(&SettlementReceipt {
        beneficiary: beneficiary.clone(),
        amount,
        payment: payment.clone(),
    })?;
    let transfer = SubMsg::reply_always(
        cw20_transfer_msg(&config.sale_token, &beneficiary, amount)?,
        SETTLEMENT_REPLY_ID,
    )
    .with_payload(receipt);

    Ok(Response::new()
        .add_submessage(transfer)
        .add_attribute("method", "settle_reserved_transfer")
        .add_attribute("beneficiary", beneficiary)
        .add_attribute("amount", amount)
        .add_attribute("payment_reference", payment.reference)
        .add_attribute("remaining_locked", remaining))
}

pub fn handle_reply(deps: DepsMut, _env: Env, msg: Reply) -> Result<Response, ContractError> {
    match msg.id {
        TRADE_TRANSFER_REPLY_ID => {
            let receipt: TradeReceipt = from_json(&msg.payload)?;
            match msg.result {
                SubMsgResult::Ok(_) => Ok(Response::new()),
                SubMsgResult::Err(reason) => {
                    deps.api.debug(&format!(
                        "PRESALE: trade transfer failed recipient={} asset={} reason={}",
                        receipt.recipient, receipt.asset, reason
                    ));
                    Err(ContractError::TransferFailed {
                        recipient: receipt.recipient.to_string(),
                        asset: receipt.asset,
                        amount: receipt.amount_in,
                        sale_amount: receipt.amount_out,
                        reason,
                    })
                }
            }
        }
        REFUND_REPLY_ID => {
            let receipt: RefundReceipt = from_json(&msg.payload)?;
            match msg.result {
                SubMsgResult::Ok(_) => Ok(Response::new()),
                SubMsgResult::Err(reason) => {
                    deps.api.debug(&format!(
                        "PRESALE: refund failed recipient={} amount={} reason={}",
                        receipt.recipient, receipt.amount, reason
                    ));
                    Err(ContractError::RefundFailed {
                        recipient: receipt.recipient.to_string(),
                        amount: receipt.amount,
                        reason,
                    })
                }
            }
        }
        SETTLEMENT_REPLY_ID => {
            let receipt: SettlementReceipt = from_json(&msg.payload)?;
            match msg.result {
                SubMsgResult::Ok(_) => Ok(Response::new().add_event(events::settlement_executed(
                    &receipt.beneficiary,
                    receipt.amount,
                    &receipt.payment,
                ))),
                SubMsgResult::Err(reason) => {
                    deps.api.debug(&format!(
                        "PRESALE: settlement failed beneficiary={} network={} reference={} reason={}",
                        receipt.beneficiary, receipt.payment.network, receipt.payment.reference, reason
                    ));
                    Err(ContractError::SettlementFailed {
                        beneficiary: receipt.beneficiary.to_string(),
                        payment_network: receipt.payment.network,
                        payment_reference: receipt.payment.reference,
                        payment_amount: receipt.payment.amount,
                        amount: receipt.amount,
                        reason,
                    })
                }
            }
        }
        id => Err(ContractError::UnknownReplyId { id }),
    }
}
