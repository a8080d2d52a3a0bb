use cosmwasm_schema::cw_serde;
use cosmwasm_std::testing::MockApi;
use cosmwasm_std::{
    to_json_binary, Addr, Binary, Coin, Deps, DepsMut, Env, MessageInfo, Response, StdError,
    StdResult, Uint128,
};
use cw_multi_test::{App, AppResponse, ContractWrapper, Executor};
use cw_storage_plus::{Item, Map};

use token_presale::asset::{
    AllowanceResponse, AssetInfo, BalanceResponse, Cw20QueryMsg, Expiration,
};
use token_presale::contract;
use token_presale::msg::{
    AvailabilityResponse, ExecuteMsg, InstantiateMsg, LockedResponse, PaymentAssetInit, QueryMsg,
    QuoteResponse, StatusResponse,
};
use token_presale::state::PaymentDescriptor;

const NATIVE: &str = "anative";
/// One whole token with 18 decimals
const WHOLE: u128 = 1_000_000_000_000_000_000;
/// One USDT with 6 decimals
const USDT: u128 = 1_000_000;

/// Minimal CW20 used as sale token and payment asset. A frozen token fails
/// every transfer.
mod mock_cw20 {
    use super::*;

    #[cw_serde]
    pub struct InstantiateMsg {
        pub balances: Vec<(String, Uint128)>,
    }

    #[cw_serde]
    pub enum ExecuteMsg {
        Transfer {
            recipient: String,
            amount: Uint128,
        },
        TransferFrom {
            owner: String,
            recipient: String,
            amount: Uint128,
        },
        IncreaseAllowance {
            spender: String,
            amount: Uint128,
        },
        Freeze {},
    }

    const BALANCES: Map<&Addr, Uint128> = Map::new("balances");
    const ALLOWANCES: Map<(&Addr, &Addr), Uint128> = Map::new("allowances");
    const FROZEN: Item<bool> = Item::new("frozen");

    pub fn instantiate(
        deps: DepsMut,
        _env: Env,
        _info: MessageInfo,
        msg: InstantiateMsg,
    ) -> StdResult<Response> {
        for (address, amount) in msg.balances {
            let address = deps.api.addr_validate(&address)?;
            BALANCES.save(deps.storage, &address, &amount)?;
        }
        FROZEN.save(deps.storage, &false)?;
        Ok(Response::new())
    }

    fn move_tokens(deps: DepsMut, from: &Addr, to: &Addr, amount: Uint128) -> StdResult<()> {
        if FROZEN.load(deps.storage)? {
            return Err(StdError::msg("token is frozen"));
        }
        let from_balance = BALANCES.may_load(deps.storage, from)?.unwrap_or_default();
        let from_balance = from_balance
            .checked_sub(amount)
            .map_err(|_| StdError::msg("insufficient balance"))?;
        BALANCES.save(deps.storage, from, &from_balance)?;
        let to_balance = BALANCES.may_load(deps.storage, to)?.unwrap_or_default();
        BALANCES.save(deps.storage, to, &(to_balance + amount))?;
        Ok(())
    }

    pub fn execute(
        deps: DepsMut,
        _env: Env,
        info: MessageInfo,
        msg: ExecuteMsg,
    ) -> StdResult<Response> {
        match msg {
            ExecuteMsg::Transfer { recipient, amount } => {
                let recipient = deps.api.addr_validate(&recipient)?;
                move_tokens(deps, &info.sender, &recipient, amount)?;
            }
            ExecuteMsg::TransferFrom {
                owner,
                recipient,
                amount,
            } => {
                let owner = deps.api.addr_validate(&owner)?;
                let recipient = deps.api.addr_validate(&recipient)?;
                let allowance = ALLOWANCES
                    .may_load(deps.storage, (&owner, &info.sender))?
                    .unwrap_or_default();
                let allowance = allowance
                    .checked_sub(amount)
                    .map_err(|_| StdError::msg("insufficient allowance"))?;
                ALLOWANCES.save(deps.storage, (&owner, &info.sender), &allowance)?;
                move_tokens(deps, &owner, &recipient, amount)?;
            }
            ExecuteMsg::IncreaseAllowance { spender, amount } => {
                let spender = deps.api.addr_validate(&spender)?;
                let allowance = ALLOWANCES
                    .may_load(deps.storage, (&info.sender, &spender))?
                    .unwrap_or_default();
                ALLOWANCES.save(deps.storage, (&info.sender, &spender), &(allowance + amount))?;
            }
            ExecuteMsg::Freeze {} => FROZEN.save(deps.storage, &true)?,
        }
        Ok(Response::new())
    }

    pub fn query(deps: Deps, _env: Env, msg: Cw20QueryMsg) -> StdResult<Binary> {
        match msg {
            Cw20QueryMsg::Balance { address } => {
                let address = deps.api.addr_validate(&address)?;
                let balance = BALANCES.may_load(deps.storage, &address)?.unwrap_or_default();
                to_json_binary(&BalanceResponse { balance })
            }
            Cw20QueryMsg::Allowance { owner, spender } => {
                let owner = deps.api.addr_validate(&owner)?;
                let spender = deps.api.addr_validate(&spender)?;
                let allowance = ALLOWANCES
                    .may_load(deps.storage, (&owner, &spender))?
                    .unwrap_or_default();
                to_json_binary(&AllowanceResponse {
                    allowance,
                    expires: Expiration::Never {},
                })
            }
        }
    }
}

/// Contract errors reach the caller as text, so match on the error message.
macro_rules! assert_contract_err {
    ($result:expr, $needle:expr) => {{
        let err = $result.unwrap_err().to_string();
        assert!(err.contains($needle), "expected {:?} in error: {}", $needle, err);
    }};
}

struct Suite {
    app: App,
    presale: Addr,
    sale_token: Addr,
    usdt: Addr,
    admin: Addr,
    buyer: Addr,
    issuer: Addr,
    treasury: Addr,
}

fn addr(name: &str) -> Addr {
    MockApi::default().addr_make(name)
}

impl Suite {
    /// Presale open for 30 days holding `inventory` sale tokens. The buyer is
    /// authorized and holds 1,000,000 USDT plus 100 native coins.
    fn new(inventory: u128) -> Self {
        let admin = addr("admin");
        let buyer = addr("buyer");
        let issuer = addr("issuer");
        let treasury = addr("treasury");

        let mut app = App::new(|router, _api, storage| {
            router
                .bank
                .init_balance(storage, &addr("buyer"), vec![Coin::new(100 * WHOLE, NATIVE)])
                .unwrap();
        });

        let cw20_code = app.store_code(Box::new(ContractWrapper::new(
            mock_cw20::execute,
            mock_cw20::instantiate,
            mock_cw20::query,
        )));
        let presale_code = app.store_code(Box::new(
            ContractWrapper::new(contract::execute, contract::instantiate, contract::query)
                .with_reply(contract::reply),
        ));

        let sale_token = app
            .instantiate_contract(
                cw20_code,
                issuer.clone(),
                &mock_cw20::InstantiateMsg {
                    balances: vec![(issuer.to_string(), Uint128::new(10_000_000 * WHOLE))],
                },
                &[],
                "sale-token",
                None,
            )
            .unwrap();
        let usdt = app
            .instantiate_contract(
                cw20_code,
                buyer.clone(),
                &mock_cw20::InstantiateMsg {
                    balances: vec![(buyer.to_string(), Uint128::new(1_000_000 * USDT))],
                },
                &[],
                "usdt",
                None,
            )
            .unwrap();

        let now = app.block_info().time;
        let presale = app
            .instantiate_contract(
                presale_code,
                admin.clone(),
                &InstantiateMsg {
                    admin: None,
                    sale_token: sale_token.to_string(),
                    sale_token_issuer: issuer.to_string(),
                    proceeds_receiver: treasury.to_string(),
                    sale_token_usd_price: Uint128::new(500),
                    start_time: now,
                    end_time: now.plus_days(30),
                    native_denom: NATIVE.to_string(),
                    wrapped_native: PaymentAssetInit {
                        address: addr("weth").to_string(),
                        decimals: 18,
                    },
                    wrapped_native_usd_price: None,
                    stablecoins: vec![
                        PaymentAssetInit {
                            address: usdt.to_string(),
                            decimals: 6,
                        },
                        PaymentAssetInit {
                            address: addr("usdc").to_string(),
                            decimals: 6,
                        },
                        PaymentAssetInit {
                            address: addr("dai").to_string(),
                            decimals: 18,
                        },
                    ],
                },
                &[],
                "presale",
                None,
            )
            .unwrap();

        app.execute_contract(
            issuer.clone(),
            sale_token.clone(),
            &mock_cw20::ExecuteMsg::Transfer {
                recipient: presale.to_string(),
                amount: Uint128::new(inventory),
            },
            &[],
        )
        .unwrap();
        app.execute_contract(
            admin.clone(),
            presale.clone(),
            &ExecuteMsg::AuthorizeUser {
                account: buyer.to_string(),
            },
            &[],
        )
        .unwrap();

        Suite {
            app,
            presale,
            sale_token,
            usdt,
            admin,
            buyer,
            issuer,
            treasury,
        }
    }

    fn approve_usdt(&mut self, amount: u128) {
        self.app
            .execute_contract(
                self.buyer.clone(),
                self.usdt.clone(),
                &mock_cw20::ExecuteMsg::IncreaseAllowance {
                    spender: self.presale.to_string(),
                    amount: Uint128::new(amount),
                },
                &[],
            )
            .unwrap();
    }

    fn exchange_usdt(&mut self, amount: u128) -> StdResult<AppResponse> {
        self.app.execute_contract(
            self.buyer.clone(),
            self.presale.clone(),
            &ExecuteMsg::Exchange {
                asset: self.usdt.to_string(),
                amount: Uint128::new(amount),
            },
            &[],
        )
    }

    fn admin_execute(&mut self, msg: &ExecuteMsg) -> StdResult<AppResponse> {
        self.app
            .execute_contract(self.admin.clone(), self.presale.clone(), msg, &[])
    }

    fn freeze(&mut self, token: &Addr) {
        self.app
            .execute_contract(
                self.admin.clone(),
                token.clone(),
                &mock_cw20::ExecuteMsg::Freeze {},
                &[],
            )
            .unwrap();
    }

    fn cw20_balance(&self, token: &Addr, account: &Addr) -> u128 {
        let response: BalanceResponse = self
            .app
            .wrap()
            .query_wasm_smart(
                token,
                &Cw20QueryMsg::Balance {
                    address: account.to_string(),
                },
            )
            .unwrap();
        response.balance.u128()
    }

    fn native_balance(&self, account: &Addr) -> String {
        self.app
            .wrap()
            .query_balance(account, NATIVE)
            .unwrap()
            .amount
            .to_string()
    }

    fn available(&self) -> AvailabilityResponse {
        self.app
            .wrap()
            .query_wasm_smart(&self.presale, &QueryMsg::AvailableForSale {})
            .unwrap()
    }

    fn status(&self) -> StatusResponse {
        self.app
            .wrap()
            .query_wasm_smart(&self.presale, &QueryMsg::Status {})
            .unwrap()
    }

    fn locked(&self, beneficiary: &Addr) -> Uint128 {
        let response: LockedResponse = self
            .app
            .wrap()
            .query_wasm_smart(
                &self.presale,
                &QueryMsg::Locked {
                    beneficiary: beneficiary.to_string(),
                },
            )
            .unwrap();
        response.locked
    }
}

#[test]
fn stablecoin_exchange_delivers_and_forwards() {
    let mut suite = Suite::new(1_000_000 * WHOLE);
    suite.approve_usdt(100 * USDT);

    let res = suite.exchange_usdt(100 * USDT).unwrap();
    assert!(res.events.iter().any(|e| e.ty == "wasm-trade_executed"));

    // $100 at $0.05 = 2,000 sale tokens
    assert_eq!(suite.cw20_balance(&suite.sale_token, &suite.buyer), 2_000 * WHOLE);
    assert_eq!(suite.cw20_balance(&suite.usdt, &suite.treasury), 100 * USDT);
    assert_eq!(suite.cw20_balance(&suite.usdt, &suite.presale), 0);

    // credited + remaining == available before
    let available = suite.available();
    assert_eq!(available.available.u128() + 2_000 * WHOLE, 1_000_000 * WHOLE);
    assert!(suite.status().is_active);
}

#[test]
fn exchange_checks_caller_asset_and_allowance() {
    let mut suite = Suite::new(1_000_000 * WHOLE);

    let stranger = addr("stranger");
    let usdt = suite.usdt.to_string();
    let presale = suite.presale.clone();
    assert_contract_err!(
        suite.app.execute_contract(
            stranger,
            presale.clone(),
            &ExecuteMsg::Exchange {
                asset: usdt,
                amount: Uint128::new(USDT),
            },
            &[],
        ),
        "Caller not authorized"
    );

    let buyer = suite.buyer.clone();
    assert_contract_err!(
        suite.app.execute_contract(
            buyer,
            presale,
            &ExecuteMsg::Exchange {
                asset: addr("shitcoin").to_string(),
                amount: Uint128::new(USDT),
            },
            &[],
        ),
        "Asset not authorized"
    );

    assert_contract_err!(suite.exchange_usdt(0), "No quantity available");

    suite.approve_usdt(USDT);
    assert_contract_err!(
        suite.exchange_usdt(2 * USDT),
        "Insufficient allowance"
    );
}

#[test]
fn oversized_exchange_is_clamped_and_ends_presale() {
    let inventory = 1_000_000 * WHOLE;
    let mut suite = Suite::new(inventory);
    suite.approve_usdt(60_000 * USDT);

    let quote: QuoteResponse = suite
        .app
        .wrap()
        .query_wasm_smart(
            &suite.presale,
            &QueryMsg::Quote {
                asset: AssetInfo::Cw20 {
                    address: suite.usdt.to_string(),
                },
                amount: Uint128::new(60_000 * USDT),
            },
        )
        .unwrap();
    assert_eq!(quote.amount_out.u128(), inventory);
    assert_eq!(quote.amount_in.u128(), 50_000 * USDT);

    let res = suite.exchange_usdt(60_000 * USDT).unwrap();
    assert!(res.events.iter().any(|e| e.ty == "wasm-presale_terminated"));

    assert_eq!(suite.cw20_balance(&suite.sale_token, &suite.buyer), inventory);
    // only the payment matching the available inventory was pulled
    assert_eq!(suite.cw20_balance(&suite.usdt, &suite.treasury), 50_000 * USDT);
    assert_eq!(
        suite.cw20_balance(&suite.usdt, &suite.buyer),
        (1_000_000 - 50_000) * USDT
    );

    assert!(suite.available().available.is_zero());
    let status = suite.status();
    assert!(!status.is_active);
    assert!(status.actual_end_time < status.configured_end_time);

    assert_contract_err!(suite.exchange_usdt(USDT), "Presale is not active");
}

#[test]
fn native_exchange_refunds_excess_and_withdraws() {
    let inventory = 1_000_000 * WHOLE;
    let mut suite = Suite::new(inventory);

    // 25 coins would buy 1,225,000 sale tokens at 49,000 each
    let buyer = suite.buyer.clone();
    let presale = suite.presale.clone();
    suite
        .app
        .execute_contract(
            buyer,
            presale,
            &ExecuteMsg::ExchangeNative {},
            &[Coin::new(25 * WHOLE, NATIVE)],
        )
        .unwrap();

    let taken: u128 = 20_408_163_265_306_122_448;
    assert_eq!(suite.cw20_balance(&suite.sale_token, &suite.buyer), inventory);
    assert_eq!(suite.native_balance(&suite.presale), taken.to_string());
    assert_eq!(
        suite.native_balance(&suite.buyer),
        (100 * WHOLE - taken).to_string()
    );
    assert!(!suite.status().is_active);

    let treasury = suite.treasury.clone();
    let presale = suite.presale.clone();
    assert_contract_err!(
        suite.app.execute_contract(
            treasury.clone(),
            presale.clone(),
            &ExecuteMsg::WithdrawNative {
                amount: Uint128::new(taken + 1),
            },
            &[],
        ),
        "Insufficient contract balance"
    );
    assert_contract_err!(
        suite.app.execute_contract(
            addr("stranger"),
            presale.clone(),
            &ExecuteMsg::WithdrawNative {
                amount: Uint128::new(1),
            },
            &[],
        ),
        "Caller is not the admin"
    );
    suite
        .app
        .execute_contract(
            treasury,
            presale,
            &ExecuteMsg::WithdrawNative {
                amount: Uint128::new(taken),
            },
            &[],
        )
        .unwrap();
    assert_eq!(suite.native_balance(&suite.treasury), taken.to_string());
    assert_eq!(suite.native_balance(&suite.presale), "0");
}

#[test]
fn failed_sale_token_push_rolls_back_payment() {
    let mut suite = Suite::new(1_000_000 * WHOLE);
    suite.approve_usdt(100 * USDT);
    let sale_token = suite.sale_token.clone();
    suite.freeze(&sale_token);

    assert_contract_err!(
        suite.exchange_usdt(100 * USDT),
        "failed (sale amount"
    );

    assert_eq!(suite.cw20_balance(&suite.usdt, &suite.buyer), 1_000_000 * USDT);
    assert_eq!(suite.cw20_balance(&suite.usdt, &suite.treasury), 0);
    // allowance untouched, so the same request can be resubmitted
    let allowance: AllowanceResponse = suite
        .app
        .wrap()
        .query_wasm_smart(
            &suite.usdt,
            &Cw20QueryMsg::Allowance {
                owner: suite.buyer.to_string(),
                spender: suite.presale.to_string(),
            },
        )
        .unwrap();
    assert_eq!(allowance.allowance.u128(), 100 * USDT);
}

#[test]
fn failed_payment_pull_reports_transfer_failure() {
    let mut suite = Suite::new(1_000_000 * WHOLE);
    suite.approve_usdt(100 * USDT);
    let usdt = suite.usdt.clone();
    suite.freeze(&usdt);

    assert_contract_err!(
        suite.exchange_usdt(100 * USDT),
        "failed (sale amount"
    );
    assert_eq!(suite.cw20_balance(&suite.sale_token, &suite.buyer), 0);
    assert_eq!(suite.available().available.u128(), 1_000_000 * WHOLE);
}

#[test]
fn presale_window_gates_exchanges() {
    let mut suite = Suite::new(1_000_000 * WHOLE);
    suite.approve_usdt(100 * USDT);

    suite
        .app
        .update_block(|block| block.time = block.time.plus_days(30));
    assert!(!suite.status().is_active);
    assert_contract_err!(suite.exchange_usdt(USDT), "Presale is not active");
}

#[test]
fn reserved_allocation_settles_to_beneficiary() {
    let mut suite = Suite::new(1_000_000 * WHOLE);
    let beneficiary = addr("ton_buyer");

    suite
        .admin_execute(&ExecuteMsg::Lock {
            beneficiary: beneficiary.to_string(),
            amount: Uint128::new(10_000 * WHOLE),
        })
        .unwrap();
    assert_eq!(suite.available().available.u128(), 990_000 * WHOLE);

    let payment = PaymentDescriptor {
        network: "ton".to_string(),
        reference: "ton-tx-1".to_string(),
        amount: Uint128::new(500_000_000_000),
    };
    assert_contract_err!(
        suite.admin_execute(&ExecuteMsg::SettleReservedTransfer {
            beneficiary: beneficiary.to_string(),
            payment: payment.clone(),
            amount: Uint128::new(10_001 * WHOLE),
        }),
        "Insufficient locked amount"
    );

    let res = suite
        .admin_execute(&ExecuteMsg::SettleReservedTransfer {
            beneficiary: beneficiary.to_string(),
            payment,
            amount: Uint128::new(4_000 * WHOLE),
        })
        .unwrap();
    assert!(res.events.iter().any(|e| e.ty == "wasm-settlement_executed"));

    assert_eq!(suite.cw20_balance(&suite.sale_token, &beneficiary), 4_000 * WHOLE);
    assert_eq!(suite.locked(&beneficiary).u128(), 6_000 * WHOLE);
    let available = suite.available();
    assert_eq!(available.total_locked.u128(), 6_000 * WHOLE);
    assert_eq!(available.available.u128(), 990_000 * WHOLE);
}

#[test]
fn failed_settlement_keeps_reservation() {
    let mut suite = Suite::new(1_000_000 * WHOLE);
    let beneficiary = addr("ton_buyer");
    suite
        .admin_execute(&ExecuteMsg::Lock {
            beneficiary: beneficiary.to_string(),
            amount: Uint128::new(10_000 * WHOLE),
        })
        .unwrap();

    let sale_token = suite.sale_token.clone();
    suite.freeze(&sale_token);
    assert_contract_err!(
        suite.admin_execute(&ExecuteMsg::SettleReservedTransfer {
            beneficiary: beneficiary.to_string(),
            payment: PaymentDescriptor {
                network: "ton".to_string(),
                reference: "ton-tx-2".to_string(),
                amount: Uint128::new(1),
            },
            amount: Uint128::new(10_000 * WHOLE),
        }),
        "Settlement of"
    );
    assert_eq!(suite.locked(&beneficiary).u128(), 10_000 * WHOLE);
    assert_eq!(suite.available().total_locked.u128(), 10_000 * WHOLE);
}

#[test]
fn locked_inventory_is_not_for_sale() {
    let inventory = 1_000_000 * WHOLE;
    let mut suite = Suite::new(inventory);
    suite
        .admin_execute(&ExecuteMsg::Lock {
            beneficiary: addr("ton_buyer").to_string(),
            amount: Uint128::new(inventory),
        })
        .unwrap();

    suite.approve_usdt(USDT);
    assert_contract_err!(suite.exchange_usdt(USDT), "No quantity available");

    let buyer = suite.buyer.clone();
    assert_contract_err!(
        suite.app.execute_contract(
            buyer,
            suite.presale.clone(),
            &ExecuteMsg::Lock {
                beneficiary: addr("other").to_string(),
                amount: Uint128::new(1),
            },
            &[],
        ),
        "Caller is not the admin"
    );
}

#[test]
fn sweep_returns_all_sale_tokens_to_issuer() {
    let inventory = 1_000_000 * WHOLE;
    let mut suite = Suite::new(inventory);
    suite
        .admin_execute(&ExecuteMsg::Lock {
            beneficiary: addr("ton_buyer").to_string(),
            amount: Uint128::new(1_000 * WHOLE),
        })
        .unwrap();

    let issuer_before = suite.cw20_balance(&suite.sale_token, &suite.issuer);
    suite
        .admin_execute(&ExecuteMsg::SweepRemainingSaleTokens {})
        .unwrap();

    assert_eq!(
        suite.cw20_balance(&suite.sale_token, &suite.issuer),
        issuer_before + inventory
    );
    assert_eq!(suite.cw20_balance(&suite.sale_token, &suite.presale), 0);
    assert!(!suite.status().is_active);

    // reservations now exceed the balance; availability refuses to wrap
    let result: StdResult<AvailabilityResponse> = suite
        .app
        .wrap()
        .query_wasm_smart(&suite.presale, &QueryMsg::AvailableForSale {});
    let err = result.unwrap_err();
    assert!(err.to_string().contains("below total locked"), "{}", err);
}

#[test]
fn authorize_users_in_bulk() {
    let mut suite = Suite::new(WHOLE);
    let accounts: Vec<String> = ["a", "b", "c"].iter().map(|n| addr(n).to_string()).collect();

    let res = suite
        .admin_execute(&ExecuteMsg::AuthorizeUsers {
            accounts: accounts.clone(),
        })
        .unwrap();
    let added = res
        .events
        .iter()
        .filter(|e| e.ty == "wasm-authorized_user_added")
        .count();
    assert_eq!(added, 3);

    // already authorized accounts are a no-op
    let res = suite
        .admin_execute(&ExecuteMsg::AuthorizeUsers { accounts })
        .unwrap();
    assert!(!res.events.iter().any(|e| e.ty == "wasm-authorized_user_added"));

    let authorized: bool = suite
        .app
        .wrap()
        .query_wasm_smart(
            &suite.presale,
            &QueryMsg::IsAuthorized {
                address: addr("b").to_string(),
            },
        )
        .unwrap();
    assert!(authorized);
}
