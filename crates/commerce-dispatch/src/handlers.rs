//! One handler per commerce resource. Each action decodes its payload into
//! the matching request type and calls the service.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use commerce_service::requests::*;
use commerce_service::{CommerceService, ServiceResult};
use commerce_types::RequestContext;

use crate::handler::ResourceHandler;
use crate::outcome::DispatchOutcome;

/// Every resource the commerce registry knows about.
pub const RESOURCES: [&str; 11] = [
    "quote",
    "order",
    "payment",
    "transaction",
    "balance",
    "event",
    "investment",
    "portfolio",
    "bank",
    "marketplace",
    "exchange",
];

fn decode<T: DeserializeOwned>(
    resource: &str,
    action: &str,
    payload: Option<&Value>,
) -> Result<T, DispatchOutcome> {
    let payload = payload.ok_or(DispatchOutcome::MissingPayload)?;
    serde_json::from_value(payload.clone()).map_err(|err| {
        warn!(resource, action, error = %err, "payload decode failed");
        DispatchOutcome::DecodeFailed
    })
}

fn settle<T>(resource: &str, action: &str, result: ServiceResult<T>) -> DispatchOutcome {
    match result {
        Ok(_) => {
            debug!(resource, action, "command handled");
            DispatchOutcome::Handled
        }
        Err(err) => {
            warn!(resource, action, error = %err, "command failed");
            DispatchOutcome::ServiceFailed
        }
    }
}

macro_rules! resource_handler {
    ($(#[$doc:meta])* $name:ident, $resource:literal {
        $($action:literal => $method:ident($req:ty)),+ $(,)?
    }) => {
        $(#[$doc])*
        pub struct $name {
            service: Arc<CommerceService>,
        }

        impl $name {
            pub fn new(service: Arc<CommerceService>) -> Self {
                Self { service }
            }
        }

        #[async_trait]
        impl ResourceHandler for $name {
            fn resource(&self) -> &'static str {
                $resource
            }

            fn actions(&self) -> &'static [&'static str] {
                &[$($action),+]
            }

            async fn handle(
                &self,
                ctx: &RequestContext,
                action: &str,
                payload: Option<&Value>,
            ) -> DispatchOutcome {
                match action {
                    $($action => {
                        let req: $req = match decode($resource, action, payload) {
                            Ok(req) => req,
                            Err(outcome) => return outcome,
                        };
                        settle($resource, action, self.service.$method(ctx, req).await)
                    })+
                    _ => DispatchOutcome::UnhandledAction,
                }
            }
        }
    };
}

resource_handler!(QuoteHandler, "quote" {
    "create" => create_quote(CreateQuoteRequest),
    "get" => get_quote(GetQuoteRequest),
    "list" => list_quotes(ListQuotesRequest),
    "update" => update_quote_status(UpdateQuoteStatusRequest),
});

resource_handler!(OrderHandler, "order" {
    "create" => create_order(CreateOrderRequest),
    "get" => get_order(GetOrderRequest),
    "list" => list_orders(ListOrdersRequest),
    "update" => update_order_status(UpdateOrderStatusRequest),
});

resource_handler!(
    /// `confirm` and `refund` share one request shape.
    PaymentHandler, "payment" {
    "initiate" => initiate_payment(InitiatePaymentRequest),
    "confirm" => confirm_payment(PaymentActionRequest),
    "refund" => refund_payment(PaymentActionRequest),
    "get" => get_payment(GetPaymentRequest),
});

resource_handler!(TransactionHandler, "transaction" {
    "create" => record_transaction(RecordTransactionRequest),
    "get" => get_transaction(GetTransactionRequest),
    "list" => list_transactions(ListTransactionsRequest),
});

resource_handler!(BalanceHandler, "balance" {
    "create" => open_balance(OpenBalanceRequest),
    "get" => get_balance(GetBalanceRequest),
    "list" => list_balances(ListBalancesRequest),
    "update" => update_balance(UpdateBalanceRequest),
});

resource_handler!(EventHandler, "event" {
    "list" => list_events(ListEventsRequest),
});

resource_handler!(InvestmentHandler, "investment" {
    "create" => create_investment_account(CreateInvestmentAccountRequest),
    "get" => get_investment_account(GetInvestmentAccountRequest),
    "order" => place_investment_order(PlaceInvestmentOrderRequest),
    "list" => list_investment_accounts(ListInvestmentAccountsRequest),
});

resource_handler!(PortfolioHandler, "portfolio" {
    "create" => create_portfolio(CreatePortfolioRequest),
    "get" => get_portfolio(GetPortfolioRequest),
    "list" => list_portfolios(ListPortfoliosRequest),
});

resource_handler!(BankHandler, "bank" {
    "create" => open_bank_account(OpenBankAccountRequest),
    "transfer" => initiate_bank_transfer(InitiateBankTransferRequest),
});

resource_handler!(MarketplaceHandler, "marketplace" {
    "create" => create_marketplace_listing(CreateMarketplaceListingRequest),
    "order" => place_marketplace_order(PlaceMarketplaceOrderRequest),
    "offer" => make_marketplace_offer(MakeMarketplaceOfferRequest),
});

resource_handler!(ExchangeHandler, "exchange" {
    "create" => create_exchange_pair(CreateExchangePairRequest),
    "rate" => create_exchange_rate(CreateExchangeRateRequest),
    "order" => place_exchange_order(PlaceExchangeOrderRequest),
    "list" => list_exchange_rates(ListExchangeRatesRequest),
});

/// Every commerce handler, in [`RESOURCES`] order.
pub fn all(service: Arc<CommerceService>) -> Vec<Arc<dyn ResourceHandler>> {
    vec![
        Arc::new(QuoteHandler::new(service.clone())),
        Arc::new(OrderHandler::new(service.clone())),
        Arc::new(PaymentHandler::new(service.clone())),
        Arc::new(TransactionHandler::new(service.clone())),
        Arc::new(BalanceHandler::new(service.clone())),
        Arc::new(EventHandler::new(service.clone())),
        Arc::new(InvestmentHandler::new(service.clone())),
        Arc::new(PortfolioHandler::new(service.clone())),
        Arc::new(BankHandler::new(service.clone())),
        Arc::new(MarketplaceHandler::new(service.clone())),
        Arc::new(ExchangeHandler::new(service)),
    ]
}
