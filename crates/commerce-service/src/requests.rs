//! Typed requests accepted by [`CommerceService`](crate::CommerceService).
//!
//! Every request decodes from a JSON document with all fields optional, so
//! a missing field surfaces as an `InvalidArgument` from `validate` rather
//! than as a decode failure. Wrongly-typed fields still fail to decode.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use commerce_types::{
    CampaignId, EntityType, OrderStatus, PageRequest, QuoteStatus, TransactionStatus,
    TransactionType,
};

use crate::error::{ServiceError, ServiceResult};

pub(crate) fn required(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::invalid(format!("{field} is required")));
    }
    Ok(())
}

fn positive(field: &str, value: f64) -> ServiceResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ServiceError::invalid(format!("{field} must be positive")));
    }
    Ok(())
}

fn non_negative(field: &str, value: f64) -> ServiceResult<()> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(ServiceError::invalid(format!("{field} must not be negative")));
    }
    Ok(())
}

macro_rules! request {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $field:ident : $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $($(#[$fmeta])* pub $field: $ty,)*
        }
    };
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

request!(CreateQuoteRequest {
    user_id: String,
    product_id: String,
    amount: f64,
    currency: String,
    campaign_id: CampaignId,
    metadata: Option<Value>,
});

impl CreateQuoteRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("user_id", &self.user_id)?;
        required("product_id", &self.product_id)?;
        required("currency", &self.currency)?;
        non_negative("amount", self.amount)
    }
}

request!(GetQuoteRequest { quote_id: String });

request!(ListQuotesRequest {
    user_id: String,
    campaign_id: CampaignId,
    #[serde(flatten)]
    page: PageRequest,
});

request!(UpdateQuoteStatusRequest {
    quote_id: String,
    status: QuoteStatus,
});

impl UpdateQuoteStatusRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("quote_id", &self.quote_id)?;
        if !self.status.is_specified() {
            return Err(ServiceError::invalid("status is required"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

request!(OrderItemInput {
    product_id: String,
    quantity: i32,
    price: f64,
});

request!(CreateOrderRequest {
    user_id: String,
    items: Vec<OrderItemInput>,
    currency: String,
    campaign_id: CampaignId,
    metadata: Option<Value>,
});

impl CreateOrderRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("user_id", &self.user_id)?;
        required("currency", &self.currency)?;
        if self.items.is_empty() {
            return Err(ServiceError::invalid("at least one item is required"));
        }
        let mut products = BTreeSet::new();
        for item in &self.items {
            required("items.product_id", &item.product_id)?;
            if item.quantity <= 0 {
                return Err(ServiceError::invalid("items.quantity must be positive"));
            }
            positive("items.price", item.price)?;
            // Item keys are derived from the product id.
            if !products.insert(item.product_id.trim()) {
                return Err(ServiceError::invalid(format!(
                    "items.product_id {} appears more than once",
                    item.product_id
                )));
            }
        }
        Ok(())
    }
}

request!(GetOrderRequest { order_id: String });

request!(ListOrdersRequest {
    user_id: String,
    campaign_id: CampaignId,
    #[serde(flatten)]
    page: PageRequest,
});

request!(UpdateOrderStatusRequest {
    order_id: String,
    status: OrderStatus,
});

impl UpdateOrderStatusRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("order_id", &self.order_id)?;
        if !self.status.is_specified() {
            return Err(ServiceError::invalid("status is required"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Payments and transactions
// ---------------------------------------------------------------------------

request!(InitiatePaymentRequest {
    order_id: String,
    user_id: String,
    amount: f64,
    currency: String,
    method: String,
    campaign_id: CampaignId,
    metadata: Option<Value>,
});

impl InitiatePaymentRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("order_id", &self.order_id)?;
        required("user_id", &self.user_id)?;
        positive("amount", self.amount)?;
        required("currency", &self.currency)?;
        required("method", &self.method)
    }
}

request!(
    /// Shared by confirm and refund.
    PaymentActionRequest {
        payment_id: String,
        user_id: String,
        metadata: Option<Value>,
    }
);

impl PaymentActionRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("payment_id", &self.payment_id)?;
        required("user_id", &self.user_id)
    }
}

request!(GetPaymentRequest { payment_id: String });

request!(RecordTransactionRequest {
    payment_id: String,
    user_id: String,
    #[serde(rename = "type")]
    kind: TransactionType,
    amount: f64,
    currency: String,
    status: TransactionStatus,
    campaign_id: CampaignId,
    metadata: Option<Value>,
});

impl RecordTransactionRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("payment_id", &self.payment_id)?;
        required("user_id", &self.user_id)?;
        if !self.kind.is_specified() {
            return Err(ServiceError::invalid("type must be DEBIT or CREDIT"));
        }
        positive("amount", self.amount)?;
        required("currency", &self.currency)
    }
}

request!(GetTransactionRequest { transaction_id: String });

request!(ListTransactionsRequest {
    user_id: String,
    campaign_id: CampaignId,
    #[serde(flatten)]
    page: PageRequest,
});

// ---------------------------------------------------------------------------
// Balances and events
// ---------------------------------------------------------------------------

request!(OpenBalanceRequest {
    user_id: String,
    currency: String,
    amount: f64,
    campaign_id: CampaignId,
    metadata: Option<Value>,
});

impl OpenBalanceRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("user_id", &self.user_id)?;
        required("currency", &self.currency)?;
        non_negative("amount", self.amount)
    }
}

request!(GetBalanceRequest {
    user_id: String,
    currency: String,
    campaign_id: CampaignId,
});

request!(ListBalancesRequest {
    user_id: String,
    campaign_id: CampaignId,
    #[serde(flatten)]
    page: PageRequest,
});

request!(UpdateBalanceRequest {
    user_id: String,
    currency: String,
    campaign_id: CampaignId,
    amount: f64,
});

impl UpdateBalanceRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("user_id", &self.user_id)?;
        required("currency", &self.currency)?;
        if !self.amount.is_finite() {
            return Err(ServiceError::invalid("amount must be a finite number"));
        }
        Ok(())
    }
}

request!(ListEventsRequest {
    entity_id: String,
    entity_type: Option<EntityType>,
    campaign_id: CampaignId,
    #[serde(flatten)]
    page: PageRequest,
});

// ---------------------------------------------------------------------------
// Investment
// ---------------------------------------------------------------------------

request!(CreateInvestmentAccountRequest {
    owner_id: String,
    #[serde(rename = "type")]
    kind: String,
    currency: String,
    balance: f64,
    campaign_id: CampaignId,
    metadata: Option<Value>,
});

impl CreateInvestmentAccountRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("owner_id", &self.owner_id)?;
        required("currency", &self.currency)?;
        non_negative("balance", self.balance)
    }
}

request!(GetInvestmentAccountRequest { account_id: String });

request!(ListInvestmentAccountsRequest {
    owner_id: String,
    campaign_id: CampaignId,
    #[serde(flatten)]
    page: PageRequest,
});

request!(PlaceInvestmentOrderRequest {
    account_id: String,
    asset_id: String,
    quantity: f64,
    price: f64,
    order_type: String,
    campaign_id: CampaignId,
    metadata: Option<Value>,
});

impl PlaceInvestmentOrderRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("account_id", &self.account_id)?;
        required("asset_id", &self.asset_id)?;
        positive("quantity", self.quantity)?;
        positive("price", self.price)?;
        required("order_type", &self.order_type)
    }
}

request!(CreatePortfolioRequest {
    account_id: String,
    campaign_id: CampaignId,
    metadata: Option<Value>,
});

request!(GetPortfolioRequest { portfolio_id: String });

request!(ListPortfoliosRequest {
    account_id: String,
    campaign_id: CampaignId,
    #[serde(flatten)]
    page: PageRequest,
});

// ---------------------------------------------------------------------------
// Banking
// ---------------------------------------------------------------------------

request!(OpenBankAccountRequest {
    user_id: String,
    iban: String,
    bic: String,
    currency: String,
    campaign_id: CampaignId,
    metadata: Option<Value>,
});

impl OpenBankAccountRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("user_id", &self.user_id)?;
        required("iban", &self.iban)?;
        required("currency", &self.currency)
    }
}

request!(InitiateBankTransferRequest {
    from_account_id: String,
    to_account_id: String,
    amount: f64,
    currency: String,
    campaign_id: CampaignId,
    metadata: Option<Value>,
});

impl InitiateBankTransferRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("from_account_id", &self.from_account_id)?;
        required("to_account_id", &self.to_account_id)?;
        if self.from_account_id == self.to_account_id {
            return Err(ServiceError::invalid("cannot transfer to the same account"));
        }
        positive("amount", self.amount)?;
        required("currency", &self.currency)
    }
}

// ---------------------------------------------------------------------------
// Marketplace
// ---------------------------------------------------------------------------

request!(CreateMarketplaceListingRequest {
    seller_id: String,
    product_id: String,
    price: f64,
    currency: String,
    campaign_id: CampaignId,
    metadata: Option<Value>,
});

impl CreateMarketplaceListingRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("seller_id", &self.seller_id)?;
        required("product_id", &self.product_id)?;
        positive("price", self.price)?;
        required("currency", &self.currency)
    }
}

request!(PlaceMarketplaceOrderRequest {
    listing_id: String,
    buyer_id: String,
    campaign_id: CampaignId,
    metadata: Option<Value>,
});

impl PlaceMarketplaceOrderRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("listing_id", &self.listing_id)?;
        required("buyer_id", &self.buyer_id)
    }
}

request!(MakeMarketplaceOfferRequest {
    listing_id: String,
    buyer_id: String,
    offer_price: f64,
    campaign_id: CampaignId,
    metadata: Option<Value>,
});

impl MakeMarketplaceOfferRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("listing_id", &self.listing_id)?;
        required("buyer_id", &self.buyer_id)?;
        positive("offer_price", self.offer_price)
    }
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

request!(CreateExchangePairRequest {
    pair_id: String,
    base_asset: String,
    quote_asset: String,
    campaign_id: CampaignId,
    metadata: Option<Value>,
});

impl CreateExchangePairRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("pair_id", &self.pair_id)?;
        required("base_asset", &self.base_asset)?;
        required("quote_asset", &self.quote_asset)
    }
}

request!(CreateExchangeRateRequest {
    pair_id: String,
    rate: f64,
    campaign_id: CampaignId,
    metadata: Option<Value>,
});

impl CreateExchangeRateRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("pair_id", &self.pair_id)?;
        positive("rate", self.rate)
    }
}

request!(ListExchangeRatesRequest {
    pair_id: String,
    campaign_id: CampaignId,
    #[serde(flatten)]
    page: PageRequest,
});

request!(PlaceExchangeOrderRequest {
    account_id: String,
    pair_id: String,
    amount: f64,
    price: f64,
    order_type: String,
    campaign_id: CampaignId,
    metadata: Option<Value>,
});

impl PlaceExchangeOrderRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        required("account_id", &self.account_id)?;
        required("pair_id", &self.pair_id)?;
        positive("amount", self.amount)?;
        positive("price", self.price)?;
        required("order_type", &self.order_type)
    }
}
