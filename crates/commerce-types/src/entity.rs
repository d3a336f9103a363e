use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Kind of domain record registered in the master index.
///
/// The string form is the `entity_type` column of the master table and the
/// `entity_type` carried by event log entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Quote,
    Order,
    OrderItem,
    Payment,
    Transaction,
    Balance,
    InvestmentAccount,
    InvestmentOrder,
    Portfolio,
    AssetPosition,
    BankAccount,
    BankTransfer,
    BankStatement,
    MarketplaceListing,
    MarketplaceOrder,
    MarketplaceOffer,
    ExchangeOrder,
    ExchangePair,
    ExchangeRate,
}

impl EntityType {
    pub const ALL: [EntityType; 19] = [
        Self::Quote,
        Self::Order,
        Self::OrderItem,
        Self::Payment,
        Self::Transaction,
        Self::Balance,
        Self::InvestmentAccount,
        Self::InvestmentOrder,
        Self::Portfolio,
        Self::AssetPosition,
        Self::BankAccount,
        Self::BankTransfer,
        Self::BankStatement,
        Self::MarketplaceListing,
        Self::MarketplaceOrder,
        Self::MarketplaceOffer,
        Self::ExchangeOrder,
        Self::ExchangePair,
        Self::ExchangeRate,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Order => "order",
            Self::OrderItem => "order_item",
            Self::Payment => "payment",
            Self::Transaction => "transaction",
            Self::Balance => "balance",
            Self::InvestmentAccount => "investment_account",
            Self::InvestmentOrder => "investment_order",
            Self::Portfolio => "portfolio",
            Self::AssetPosition => "asset_position",
            Self::BankAccount => "bank_account",
            Self::BankTransfer => "bank_transfer",
            Self::BankStatement => "bank_statement",
            Self::MarketplaceListing => "marketplace_listing",
            Self::MarketplaceOrder => "marketplace_order",
            Self::MarketplaceOffer => "marketplace_offer",
            Self::ExchangeOrder => "exchange_order",
            Self::ExchangePair => "exchange_pair",
            Self::ExchangeRate => "exchange_rate",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TypeError::UnknownEntityType(s.to_string()))
    }
}
