//! Price table and fixed-point conversion between payment assets and the sale token.
//!
//! Rates are stored as "sale token per 1 unit of asset" scaled by [`PRECISION`].
//! All divisions truncate toward zero, so remainders always stay with the presale.

use cosmwasm_std::{Addr, Api, Deps, DepsMut, MessageInfo, Response, StdResult, Storage, Uint128, Uint256};

use crate::access::ensure_admin;
use crate::asset::AssetInfo;
use crate::error::ContractError;
use crate::msg::{AssetPriceResponse, AuthorizedAssetsResponse};
use crate::state::{AssetPrice, ASSET_ORDER, CONFIG, PRICES};

/// Fixed-point scale of rates and USD prices (4 digits)
pub const PRECISION: u128 = 10_000;

/// Decimals of the sale token; payment assets may not exceed it
pub const SALE_TOKEN_DECIMALS: u8 = 18;

/// Wrapped-native reference price used when none is configured ($2450)
pub const DEFAULT_WRAPPED_NATIVE_USD_PRICE: u128 = 2450 * PRECISION;

/// USD price of the pegged reference assets ($1)
pub const STABLECOIN_USD_PRICE: u128 = PRECISION;

/// `usd_price * PRECISION / sale_token_usd_price`
pub fn compute_rate(usd_price: Uint128, sale_token_usd_price: Uint128) -> Result<Uint128, ContractError> {
    let rate = usd_price
        .checked_mul(Uint128::new(PRECISION))?
        .checked_div(sale_token_usd_price)?;
    Ok(rate)
}

fn decimals_scale(decimals: u8) -> Result<Uint256, ContractError> {
    if decimals > SALE_TOKEN_DECIMALS {
        return Err(ContractError::UnsupportedDecimals { decimals });
    }
    Ok(Uint256::from(10u128.pow(u32::from(SALE_TOKEN_DECIMALS - decimals))))
}

/// `amount * rate * 10^(18 - decimals) / PRECISION`, unbounded by the sale token
/// supply. Compare against availability before narrowing.
pub fn sale_value(price: &AssetPrice, amount: Uint128) -> Result<Uint256, ContractError> {
    let sale_amount = Uint256::from(amount)
        .checked_mul(Uint256::from(price.rate))?
        .checked_mul(decimals_scale(price.decimals)?)?
        .checked_div(Uint256::from(PRECISION))?;
    Ok(sale_amount)
}

pub fn convert_to_sale_token(price: &AssetPrice, amount: Uint128) -> Result<Uint128, ContractError> {
    Ok(Uint128::try_from(sale_value(price, amount)?)?)
}

/// `sale_amount * PRECISION / rate / 10^(18 - decimals)`. Multiply and divide by
/// the rate before scaling down for decimals.
pub fn convert_from_sale_token(price: &AssetPrice, sale_amount: Uint128) -> Result<Uint128, ContractError> {
    let amount = Uint256::from(sale_amount)
        .checked_mul(Uint256::from(PRECISION))?
        .checked_div(Uint256::from(price.rate))?
        .checked_div(decimals_scale(price.decimals)?)?;
    Ok(Uint128::try_from(amount)?)
}

/// Resolves a payment asset to the validated CW20 address its price is stored under.
pub fn price_key(api: &dyn Api, storage: &dyn Storage, asset: &AssetInfo) -> StdResult<Addr> {
    match asset {
        AssetInfo::Native {} => Ok(CONFIG.load(storage)?.wrapped_native),
        AssetInfo::Cw20 { address } => api.addr_validate(address),
    }
}

pub fn price_of(storage: &dyn Storage, key: &Addr) -> Result<AssetPrice, ContractError> {
    PRICES
        .may_load(storage, key)?
        .ok_or_else(|| ContractError::AssetNotAuthorized {
            asset: key.to_string(),
        })
}

pub fn load_price(deps: Deps, asset: &AssetInfo) -> Result<AssetPrice, ContractError> {
    let key = price_key(deps.api, deps.storage, asset)?;
    price_of(deps.storage, &key)
}

/// Stores a fresh price entry and appends the asset to the ordered list.
pub fn insert_asset(
    storage: &mut dyn Storage,
    asset: &Addr,
    decimals: u8,
    usd_price: Uint128,
    price_locked: bool,
) -> Result<AssetPrice, ContractError> {
    if PRICES.has(storage, asset) {
        return Err(ContractError::AssetAlreadyAuthorized {
            asset: asset.to_string(),
        });
    }
    if decimals > SALE_TOKEN_DECIMALS {
        return Err(ContractError::UnsupportedDecimals { decimals });
    }

    let config = CONFIG.load(storage)?;
    let rate = compute_rate(usd_price, config.sale_token_usd_price)?;
    if rate.is_zero() {
        return Err(ContractError::InvalidPrice {
            asset: asset.to_string(),
        });
    }

    let price = AssetPrice {
        rate,
        decimals,
        price_locked,
    };
    PRICES.save(storage, asset, &price)?;

    let mut order = ASSET_ORDER.may_load(storage)?.unwrap_or_default();
    order.push(asset.clone());
    ASSET_ORDER.save(storage, &order)?;

    Ok(price)
}

pub fn authorize_asset(
    deps: DepsMut,
    info: MessageInfo,
    asset: String,
    decimals: u8,
    usd_price: Uint128,
) -> Result<Response, ContractError> {
    ensure_admin(deps.storage, &info.sender)?;

    let asset = deps.api.addr_validate(&asset)?;
    let price = insert_asset(deps.storage, &asset, decimals, usd_price, false)?;

    deps.api.debug(&format!(
        "PRESALE: authorized asset={} decimals={} rate={}",
        asset, decimals, price.rate
    ));

    Ok(Response::new()
        .add_attribute("method", "authorize_asset")
        .add_attribute("asset", asset)
        .add_attribute("decimals", decimals.to_string())
        .add_attribute("rate", price.rate))
}

/// Pegged assets are rejected before the caller is looked at.
pub fn set_price(
    deps: DepsMut,
    info: MessageInfo,
    asset: String,
    usd_price: Uint128,
) -> Result<Response, ContractError> {
    let asset = deps.api.addr_validate(&asset)?;
    let mut price = price_of(deps.storage, &asset)?;
    if price.price_locked {
        return Err(ContractError::StablecoinPriceLocked {
            asset: asset.to_string(),
        });
    }

    ensure_admin(deps.storage, &info.sender)?;

    let config = CONFIG.load(deps.storage)?;
    let rate = compute_rate(usd_price, config.sale_token_usd_price)?;
    if rate.is_zero() {
        return Err(ContractError::InvalidPrice {
            asset: asset.to_string(),
        });
    }
    price.rate = rate;
    PRICES.save(deps.storage, &asset, &price)?;

    Ok(Response::new()
        .add_attribute("method", "set_price")
        .add_attribute("asset", asset)
        .add_attribute("rate", rate))
}

pub fn query_price(deps: Deps, asset: AssetInfo) -> Result<AssetPriceResponse, ContractError> {
    let price = load_price(deps, &asset)?;
    Ok(AssetPriceResponse {
        asset,
        rate: price.rate,
        decimals: price.decimals,
        price_locked: price.price_locked,
    })
}

pub fn query_authorized_assets(deps: Deps) -> StdResult<AuthorizedAssetsResponse> {
    let order = ASSET_ORDER.may_load(deps.storage)?.unwrap_or_default();
    let assets = order
        .into_iter()
        .map(|address| {
            let price = PRICES.load(deps.storage, &address)?;
            Ok(AssetPriceResponse {
                asset: AssetInfo::Cw20 {
                    address: address.to_string(),
                },
                rate: price.rate,
                decimals: price.decimals,
                price_locked: price.price_locked,
            })
        })
        .collect::<StdResult<Vec<_>>>()?;
    Ok(AuthorizedAssetsResponse { assets })
}
