//! Domain records persisted by the store.
//!
//! Every record carries its business key, a [`MasterRef`] minted in the
//! same transaction that inserted it, a campaign scope, a metadata
//! envelope, and timestamps. The store owns `master`, `created_at` and
//! `updated_at`; values supplied by callers are overwritten on create.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use commerce_metadata::MetadataEnvelope;
use commerce_types::{
    CampaignId, EntityType, LifecycleStatus, MasterRef, OrderStatus, PaymentStatus, QuoteStatus,
    TransactionStatus, TransactionType,
};

use crate::engine::{Row, Table, Tables};

/// A row that is registered in the master index when created.
pub trait Record: Row {
    const ENTITY: EntityType;

    fn master(&self) -> MasterRef;
    fn set_master(&mut self, master: MasterRef);
    fn campaign_id(&self) -> CampaignId;
}

macro_rules! record {
    ($ty:ident, $entity:expr, $table:ident, |$r:ident| $key:expr) => {
        impl Row for $ty {
            const NAME: &'static str = $entity.as_str();

            fn key(&self) -> String {
                let $r = self;
                $key
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }

            fn stamp_created(&mut self, at: DateTime<Utc>) {
                self.created_at = at;
                self.updated_at = at;
            }

            fn touch(&mut self, at: DateTime<Utc>) {
                self.updated_at = at;
            }

            fn metadata(&self) -> &MetadataEnvelope {
                &self.metadata
            }

            fn metadata_mut(&mut self) -> &mut MetadataEnvelope {
                &mut self.metadata
            }

            fn table(tables: &Tables) -> &Table<Self> {
                &tables.$table
            }

            fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
                &mut tables.$table
            }
        }

        impl Record for $ty {
            const ENTITY: EntityType = $entity;

            fn master(&self) -> MasterRef {
                self.master
            }

            fn set_master(&mut self, master: MasterRef) {
                self.master = master;
            }

            fn campaign_id(&self) -> CampaignId {
                self.campaign_id
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Core commerce
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub quote_id: String,
    pub user_id: String,
    pub product_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: QuoteStatus,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub user_id: String,
    /// Loaded from the order item table; never stored on the order row.
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub currency: String,
    pub status: OrderStatus,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sum of `price * quantity` over the order's items.
    pub fn items_total(&self) -> f64 {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub price: f64,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: String,
    pub order_id: String,
    pub user_id: String,
    pub amount: f64,
    pub currency: String,
    pub method: String,
    pub status: PaymentStatus,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub payment_id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub currency: String,
    pub status: TransactionStatus,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user, per-currency balance within a campaign.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub user_id: String,
    pub currency: String,
    pub amount: f64,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// Business key shared by the master index and balance updates.
    pub fn key_for(user_id: &str, currency: &str, campaign_id: CampaignId) -> String {
        format!("{user_id}:{currency}:{campaign_id}")
    }
}

/// Append-only event log entry.
///
/// `master` points at the master entity of the record the event describes,
/// when that record exists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommerceEvent {
    pub id: i64,
    #[serde(flatten)]
    pub master: MasterRef,
    pub entity_id: String,
    pub entity_type: Option<EntityType>,
    pub event_type: String,
    pub payload: Map<String, Value>,
    pub metadata: MetadataEnvelope,
    pub campaign_id: CampaignId,
    pub created_at: DateTime<Utc>,
}

impl Row for CommerceEvent {
    const NAME: &'static str = "commerce_event";

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
    }

    fn metadata(&self) -> &MetadataEnvelope {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut MetadataEnvelope {
        &mut self.metadata
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.events
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.events
    }
}

// ---------------------------------------------------------------------------
// Investment
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestmentAccount {
    pub account_id: String,
    pub owner_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub currency: String,
    pub balance: f64,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestmentOrder {
    pub order_id: String,
    pub account_id: String,
    pub asset_id: String,
    pub quantity: f64,
    pub price: f64,
    pub order_type: String,
    pub status: LifecycleStatus,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub portfolio_id: String,
    pub account_id: String,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetPosition {
    pub portfolio_id: String,
    pub asset_id: String,
    pub quantity: f64,
    pub average_price: f64,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Banking
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub account_id: String,
    pub user_id: String,
    pub iban: String,
    pub bic: String,
    pub currency: String,
    pub balance: f64,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BankTransfer {
    pub transfer_id: String,
    pub from_account_id: String,
    pub to_account_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: LifecycleStatus,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BankStatement {
    pub statement_id: String,
    pub account_id: String,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Marketplace
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceListing {
    pub listing_id: String,
    pub seller_id: String,
    pub product_id: String,
    pub price: f64,
    pub currency: String,
    pub status: LifecycleStatus,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceOrder {
    pub order_id: String,
    pub listing_id: String,
    pub buyer_id: String,
    pub price: f64,
    pub currency: String,
    pub status: LifecycleStatus,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceOffer {
    pub offer_id: String,
    pub listing_id: String,
    pub buyer_id: String,
    pub offer_price: f64,
    pub currency: String,
    pub status: LifecycleStatus,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeOrder {
    pub order_id: String,
    pub account_id: String,
    pub pair: String,
    pub amount: f64,
    pub price: f64,
    pub order_type: String,
    pub status: LifecycleStatus,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangePair {
    pub pair_id: String,
    pub base_asset: String,
    pub quote_asset: String,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub rate_id: String,
    pub pair_id: String,
    pub rate: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub master: MasterRef,
    pub campaign_id: CampaignId,
    pub metadata: MetadataEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

record!(Quote, EntityType::Quote, quotes, |r| r.quote_id.clone());
record!(Order, EntityType::Order, orders, |r| r.order_id.clone());
record!(OrderItem, EntityType::OrderItem, order_items, |r| format!(
    "{}:{}",
    r.order_id, r.product_id
));
record!(Payment, EntityType::Payment, payments, |r| r.payment_id.clone());
record!(Transaction, EntityType::Transaction, transactions, |r| r
    .transaction_id
    .clone());
record!(Balance, EntityType::Balance, balances, |r| Balance::key_for(
    &r.user_id,
    &r.currency,
    r.campaign_id
));
record!(InvestmentAccount, EntityType::InvestmentAccount, investment_accounts, |r| r
    .account_id
    .clone());
record!(InvestmentOrder, EntityType::InvestmentOrder, investment_orders, |r| r
    .order_id
    .clone());
record!(Portfolio, EntityType::Portfolio, portfolios, |r| r.portfolio_id.clone());
record!(AssetPosition, EntityType::AssetPosition, asset_positions, |r| format!(
    "{}:{}",
    r.portfolio_id, r.asset_id
));
record!(BankAccount, EntityType::BankAccount, bank_accounts, |r| r.account_id.clone());
record!(BankTransfer, EntityType::BankTransfer, bank_transfers, |r| r
    .transfer_id
    .clone());
record!(BankStatement, EntityType::BankStatement, bank_statements, |r| r
    .statement_id
    .clone());
record!(MarketplaceListing, EntityType::MarketplaceListing, marketplace_listings, |r| r
    .listing_id
    .clone());
record!(MarketplaceOrder, EntityType::MarketplaceOrder, marketplace_orders, |r| r
    .order_id
    .clone());
record!(MarketplaceOffer, EntityType::MarketplaceOffer, marketplace_offers, |r| r
    .offer_id
    .clone());
record!(ExchangeOrder, EntityType::ExchangeOrder, exchange_orders, |r| r
    .order_id
    .clone());
record!(ExchangePair, EntityType::ExchangePair, exchange_pairs, |r| r.pair_id.clone());
record!(ExchangeRate, EntityType::ExchangeRate, exchange_rates, |r| r.rate_id.clone());
