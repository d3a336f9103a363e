use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use commerce_metadata::marshal;
use commerce_types::{
    CampaignId, EntityType, LifecycleStatus, MasterId, OrderStatus, Page, PageRequest,
    PaymentStatus, QuoteStatus, RequestContext,
};

use crate::engine::{ensure_live, Database, Row, Txn};
use crate::error::{StoreError, StoreResult};
use crate::master::{self, MasterEntity};
use crate::records::{
    AssetPosition, Balance, BankAccount, BankStatement, BankTransfer, CommerceEvent,
    ExchangeOrder, ExchangePair, ExchangeRate, InvestmentAccount, InvestmentOrder,
    MarketplaceListing, MarketplaceOffer, MarketplaceOrder, Order, OrderItem, Payment, Portfolio,
    Quote, Record, Transaction,
};
use crate::traits::CommerceStore;

/// Relative tolerance when checking an order total against its items.
const TOTAL_TOLERANCE: f64 = 1e-9;

/// [`CommerceStore`] backed by the embedded [`Database`].
#[derive(Clone, Default)]
pub struct InMemoryCommerceStore {
    db: Database,
}

impl InMemoryCommerceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Two-phase create: master entity, then the domain row, in one
    /// transaction.
    async fn create<R: Record>(&self, ctx: &RequestContext, mut record: R) -> StoreResult<R> {
        record.stamp_created(Utc::now());
        self.db
            .transaction(ctx, |tx| insert_record(tx, &mut record))
            .await?;
        debug!(
            entity = R::NAME,
            key = %record.key(),
            master_id = %record.master().master_id,
            "record created"
        );
        Ok(record)
    }

    async fn get<R: Row>(&self, ctx: &RequestContext, key: &str) -> StoreResult<R> {
        ensure_live(ctx)?;
        let snap = self.db.snapshot().await;
        snap.of::<R>()
            .get(key)
            .map(|stored| stored.load())
            .ok_or_else(|| StoreError::not_found(R::NAME, key))
    }

    async fn list<R, F>(&self, ctx: &RequestContext, page: PageRequest, filter: F) -> StoreResult<Page<R>>
    where
        R: Row,
        F: Fn(&R) -> bool + Send + Sync,
    {
        ensure_live(ctx)?;
        let snap = self.db.snapshot().await;
        let table = snap.of::<R>();
        let total = table.count(&filter);
        let items = table.select(&filter, page);
        Ok(Page::new(items, total, page))
    }

    /// `UPDATE ... WHERE key = ?` in its own transaction. Zero affected rows
    /// rolls back and reports `NotFound`.
    async fn update<R, F>(&self, ctx: &RequestContext, key: &str, apply: F) -> StoreResult<()>
    where
        R: Row,
        F: FnOnce(&mut R) + Send,
    {
        let now = Utc::now();
        self.db
            .transaction(ctx, |tx| {
                let affected = tx.update::<R>(key, |row| {
                    apply(row);
                    row.touch(now);
                })?;
                if affected == 0 {
                    return Err(StoreError::not_found(R::NAME, key));
                }
                Ok(())
            })
            .await
    }

    /// Compare-and-set on a status column. The current status is re-read
    /// under the write lock and the update applies only if it still equals
    /// `expected`.
    async fn transition<R, S, G, F>(
        &self,
        ctx: &RequestContext,
        key: &str,
        expected: S,
        status_of: G,
        apply: F,
    ) -> StoreResult<()>
    where
        R: Row,
        S: PartialEq + fmt::Display + Send + Sync,
        G: FnOnce(&R) -> S + Send,
        F: FnOnce(&mut R) + Send,
    {
        let now = Utc::now();
        self.db
            .transaction(ctx, |tx| {
                let actual = match tx.tables().of::<R>().get(key) {
                    Some(stored) => status_of(&stored.row),
                    None => return Err(StoreError::not_found(R::NAME, key)),
                };
                if actual != expected {
                    return Err(StoreError::StatusChanged {
                        entity: R::NAME,
                        key: key.to_string(),
                        expected: expected.to_string(),
                        actual: actual.to_string(),
                    });
                }
                tx.update::<R>(key, |row| {
                    apply(row);
                    row.touch(now);
                })?;
                Ok(())
            })
            .await
    }
}

/// Steps 2-4 of the create protocol, inside the caller's transaction.
fn insert_record<R: Record>(tx: &mut Txn, record: &mut R) -> StoreResult<()> {
    let key = record.key();
    let master = master::create(tx, R::ENTITY, &key)?;
    record.set_master(master);
    let metadata = marshal(record.metadata_mut())?;
    tx.insert(record.clone(), metadata)?;
    Ok(())
}

fn totals_match(supplied: f64, computed: f64) -> bool {
    (supplied - computed).abs() <= TOTAL_TOLERANCE * computed.abs().max(1.0)
}

#[async_trait]
impl CommerceStore for InMemoryCommerceStore {
    // -- Quotes --

    async fn create_quote(&self, ctx: &RequestContext, quote: Quote) -> StoreResult<Quote> {
        self.create(ctx, quote).await
    }

    async fn get_quote(&self, ctx: &RequestContext, quote_id: &str) -> StoreResult<Quote> {
        self.get(ctx, quote_id).await
    }

    async fn list_quotes(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<Quote>> {
        self.list(ctx, page, |q: &Quote| {
            q.user_id == user_id && q.campaign_id == campaign_id
        })
        .await
    }

    async fn update_quote_status(
        &self,
        ctx: &RequestContext,
        quote_id: &str,
        status: QuoteStatus,
    ) -> StoreResult<()> {
        self.update(ctx, quote_id, |q: &mut Quote| q.status = status)
            .await
    }

    async fn transition_quote_status(
        &self,
        ctx: &RequestContext,
        quote_id: &str,
        from: QuoteStatus,
        to: QuoteStatus,
    ) -> StoreResult<()> {
        self.transition(ctx, quote_id, from, |q: &Quote| q.status, |q: &mut Quote| q.status = to)
            .await
    }

    // -- Orders --

    async fn create_order(&self, ctx: &RequestContext, mut order: Order) -> StoreResult<Order> {
        if !order.items.is_empty() {
            let computed = order.items_total();
            if !totals_match(order.total, computed) {
                return Err(StoreError::InvalidArgument(format!(
                    "order total {} does not match item sum {computed}",
                    order.total
                )));
            }
        }

        let now = Utc::now();
        order.stamp_created(now);
        let mut items = std::mem::take(&mut order.items);
        for item in &mut items {
            item.order_id = order.order_id.clone();
            item.campaign_id = order.campaign_id;
            item.stamp_created(now);
        }

        self.db
            .transaction(ctx, |tx| {
                insert_record(tx, &mut order)?;
                for item in items.iter_mut() {
                    insert_record(tx, item)?;
                }
                Ok(())
            })
            .await?;

        debug!(
            order_id = %order.order_id,
            items = items.len(),
            master_id = %order.master.master_id,
            "order created"
        );
        order.items = items;
        Ok(order)
    }

    async fn get_order(&self, ctx: &RequestContext, order_id: &str) -> StoreResult<Order> {
        ensure_live(ctx)?;
        let snap = self.db.snapshot().await;
        let mut order = snap
            .of::<Order>()
            .get(order_id)
            .map(|stored| stored.load())
            .ok_or_else(|| StoreError::not_found(Order::NAME, order_id))?;
        order.items = snap
            .of::<OrderItem>()
            .scan(&|item: &OrderItem| item.order_id == order_id);
        Ok(order)
    }

    async fn list_orders(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<Order>> {
        self.list(ctx, page, |o: &Order| {
            o.user_id == user_id && o.campaign_id == campaign_id
        })
        .await
    }

    async fn update_order_status(
        &self,
        ctx: &RequestContext,
        order_id: &str,
        status: OrderStatus,
    ) -> StoreResult<()> {
        self.update(ctx, order_id, |o: &mut Order| o.status = status)
            .await
    }

    async fn transition_order_status(
        &self,
        ctx: &RequestContext,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> StoreResult<()> {
        self.transition(ctx, order_id, from, |o: &Order| o.status, |o: &mut Order| o.status = to)
            .await
    }

    async fn list_order_items(
        &self,
        ctx: &RequestContext,
        order_id: &str,
    ) -> StoreResult<Vec<OrderItem>> {
        ensure_live(ctx)?;
        let snap = self.db.snapshot().await;
        Ok(snap
            .of::<OrderItem>()
            .scan(&|item: &OrderItem| item.order_id == order_id))
    }

    // -- Payments --

    async fn create_payment(&self, ctx: &RequestContext, payment: Payment) -> StoreResult<Payment> {
        self.create(ctx, payment).await
    }

    async fn get_payment(&self, ctx: &RequestContext, payment_id: &str) -> StoreResult<Payment> {
        self.get(ctx, payment_id).await
    }

    async fn list_payments(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<Payment>> {
        self.list(ctx, page, |p: &Payment| {
            p.user_id == user_id && p.campaign_id == campaign_id
        })
        .await
    }

    async fn update_payment_status(
        &self,
        ctx: &RequestContext,
        payment_id: &str,
        status: PaymentStatus,
    ) -> StoreResult<()> {
        self.update(ctx, payment_id, |p: &mut Payment| p.status = status)
            .await
    }

    async fn transition_payment_status(
        &self,
        ctx: &RequestContext,
        payment_id: &str,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> StoreResult<()> {
        self.transition(ctx, payment_id, from, |p: &Payment| p.status, |p: &mut Payment| p.status = to)
            .await
    }

    // -- Transactions --

    async fn create_transaction(
        &self,
        ctx: &RequestContext,
        transaction: Transaction,
    ) -> StoreResult<Transaction> {
        self.create(ctx, transaction).await
    }

    async fn get_transaction(
        &self,
        ctx: &RequestContext,
        transaction_id: &str,
    ) -> StoreResult<Transaction> {
        self.get(ctx, transaction_id).await
    }

    async fn list_transactions(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<Transaction>> {
        self.list(ctx, page, |t: &Transaction| {
            t.user_id == user_id && t.campaign_id == campaign_id
        })
        .await
    }

    // -- Balances --

    async fn create_balance(&self, ctx: &RequestContext, balance: Balance) -> StoreResult<Balance> {
        self.create(ctx, balance).await
    }

    async fn get_balance(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        currency: &str,
        campaign_id: CampaignId,
    ) -> StoreResult<Balance> {
        self.get(ctx, &Balance::key_for(user_id, currency, campaign_id))
            .await
    }

    async fn list_balances(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<Balance>> {
        self.list(ctx, page, |b: &Balance| {
            b.user_id == user_id && b.campaign_id == campaign_id
        })
        .await
    }

    async fn update_balance(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        currency: &str,
        campaign_id: CampaignId,
        amount: f64,
    ) -> StoreResult<()> {
        let key = Balance::key_for(user_id, currency, campaign_id);
        self.update(ctx, &key, |b: &mut Balance| b.amount = amount)
            .await
    }

    // -- Event log --

    async fn log_event(
        &self,
        ctx: &RequestContext,
        mut event: CommerceEvent,
    ) -> StoreResult<CommerceEvent> {
        if event.event_type.trim().is_empty() {
            return Err(StoreError::InvalidArgument("event_type is required".into()));
        }
        event.stamp_created(Utc::now());
        self.db
            .transaction(ctx, |tx| {
                if let Some(entity_type) = event.entity_type {
                    if let Some(m) = master::lookup(tx.tables(), entity_type, &event.entity_id) {
                        event.master = m.reference();
                    }
                }
                event.id = tx.tables().of::<CommerceEvent>().peek_seq() as i64;
                let metadata = marshal(&event.metadata)?;
                tx.insert(event.clone(), metadata)?;
                Ok(())
            })
            .await?;
        Ok(event)
    }

    async fn list_events(
        &self,
        ctx: &RequestContext,
        entity_id: &str,
        entity_type: EntityType,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<CommerceEvent>> {
        self.list(ctx, page, |e: &CommerceEvent| {
            e.entity_id == entity_id
                && e.entity_type == Some(entity_type)
                && e.campaign_id == campaign_id
        })
        .await
    }

    // -- Investment --

    async fn create_investment_account(
        &self,
        ctx: &RequestContext,
        account: InvestmentAccount,
    ) -> StoreResult<InvestmentAccount> {
        self.create(ctx, account).await
    }

    async fn get_investment_account(
        &self,
        ctx: &RequestContext,
        account_id: &str,
    ) -> StoreResult<InvestmentAccount> {
        self.get(ctx, account_id).await
    }

    async fn list_investment_accounts(
        &self,
        ctx: &RequestContext,
        owner_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<InvestmentAccount>> {
        self.list(ctx, page, |a: &InvestmentAccount| {
            a.owner_id == owner_id && a.campaign_id == campaign_id
        })
        .await
    }

    async fn create_investment_order(
        &self,
        ctx: &RequestContext,
        order: InvestmentOrder,
    ) -> StoreResult<InvestmentOrder> {
        self.create(ctx, order).await
    }

    async fn get_investment_order(
        &self,
        ctx: &RequestContext,
        order_id: &str,
    ) -> StoreResult<InvestmentOrder> {
        self.get(ctx, order_id).await
    }

    async fn list_investment_orders(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<InvestmentOrder>> {
        self.list(ctx, page, |o: &InvestmentOrder| {
            o.account_id == account_id && o.campaign_id == campaign_id
        })
        .await
    }

    async fn update_investment_order_status(
        &self,
        ctx: &RequestContext,
        order_id: &str,
        status: LifecycleStatus,
    ) -> StoreResult<()> {
        self.update(ctx, order_id, |o: &mut InvestmentOrder| o.status = status)
            .await
    }

    async fn create_portfolio(
        &self,
        ctx: &RequestContext,
        portfolio: Portfolio,
    ) -> StoreResult<Portfolio> {
        self.create(ctx, portfolio).await
    }

    async fn get_portfolio(
        &self,
        ctx: &RequestContext,
        portfolio_id: &str,
    ) -> StoreResult<Portfolio> {
        self.get(ctx, portfolio_id).await
    }

    async fn list_portfolios(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<Portfolio>> {
        self.list(ctx, page, |p: &Portfolio| {
            p.account_id == account_id && p.campaign_id == campaign_id
        })
        .await
    }

    async fn create_asset_position(
        &self,
        ctx: &RequestContext,
        position: AssetPosition,
    ) -> StoreResult<AssetPosition> {
        self.create(ctx, position).await
    }

    async fn list_asset_positions(
        &self,
        ctx: &RequestContext,
        portfolio_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<AssetPosition>> {
        self.list(ctx, page, |p: &AssetPosition| {
            p.portfolio_id == portfolio_id && p.campaign_id == campaign_id
        })
        .await
    }

    // -- Banking --

    async fn create_bank_account(
        &self,
        ctx: &RequestContext,
        account: BankAccount,
    ) -> StoreResult<BankAccount> {
        self.create(ctx, account).await
    }

    async fn get_bank_account(
        &self,
        ctx: &RequestContext,
        account_id: &str,
    ) -> StoreResult<BankAccount> {
        self.get(ctx, account_id).await
    }

    async fn list_bank_accounts(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<BankAccount>> {
        self.list(ctx, page, |a: &BankAccount| {
            a.user_id == user_id && a.campaign_id == campaign_id
        })
        .await
    }

    async fn create_bank_transfer(
        &self,
        ctx: &RequestContext,
        transfer: BankTransfer,
    ) -> StoreResult<BankTransfer> {
        self.create(ctx, transfer).await
    }

    async fn list_bank_transfers(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<BankTransfer>> {
        self.list(ctx, page, |t: &BankTransfer| {
            (t.from_account_id == account_id || t.to_account_id == account_id)
                && t.campaign_id == campaign_id
        })
        .await
    }

    async fn update_bank_transfer_status(
        &self,
        ctx: &RequestContext,
        transfer_id: &str,
        status: LifecycleStatus,
    ) -> StoreResult<()> {
        self.update(ctx, transfer_id, |t: &mut BankTransfer| t.status = status)
            .await
    }

    async fn create_bank_statement(
        &self,
        ctx: &RequestContext,
        statement: BankStatement,
    ) -> StoreResult<BankStatement> {
        self.create(ctx, statement).await
    }

    async fn list_bank_statements(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<BankStatement>> {
        self.list(ctx, page, |s: &BankStatement| {
            s.account_id == account_id && s.campaign_id == campaign_id
        })
        .await
    }

    // -- Marketplace --

    async fn create_marketplace_listing(
        &self,
        ctx: &RequestContext,
        listing: MarketplaceListing,
    ) -> StoreResult<MarketplaceListing> {
        self.create(ctx, listing).await
    }

    async fn get_marketplace_listing(
        &self,
        ctx: &RequestContext,
        listing_id: &str,
    ) -> StoreResult<MarketplaceListing> {
        self.get(ctx, listing_id).await
    }

    async fn list_marketplace_listings(
        &self,
        ctx: &RequestContext,
        seller_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<MarketplaceListing>> {
        self.list(ctx, page, |l: &MarketplaceListing| {
            l.seller_id == seller_id && l.campaign_id == campaign_id
        })
        .await
    }

    async fn update_marketplace_listing_status(
        &self,
        ctx: &RequestContext,
        listing_id: &str,
        status: LifecycleStatus,
    ) -> StoreResult<()> {
        self.update(ctx, listing_id, |l: &mut MarketplaceListing| l.status = status)
            .await
    }

    async fn create_marketplace_order(
        &self,
        ctx: &RequestContext,
        order: MarketplaceOrder,
    ) -> StoreResult<MarketplaceOrder> {
        self.create(ctx, order).await
    }

    async fn list_marketplace_orders(
        &self,
        ctx: &RequestContext,
        listing_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<MarketplaceOrder>> {
        self.list(ctx, page, |o: &MarketplaceOrder| {
            o.listing_id == listing_id && o.campaign_id == campaign_id
        })
        .await
    }

    async fn create_marketplace_offer(
        &self,
        ctx: &RequestContext,
        offer: MarketplaceOffer,
    ) -> StoreResult<MarketplaceOffer> {
        self.create(ctx, offer).await
    }

    async fn list_marketplace_offers(
        &self,
        ctx: &RequestContext,
        listing_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<MarketplaceOffer>> {
        self.list(ctx, page, |o: &MarketplaceOffer| {
            o.listing_id == listing_id && o.campaign_id == campaign_id
        })
        .await
    }

    async fn update_marketplace_offer_status(
        &self,
        ctx: &RequestContext,
        offer_id: &str,
        status: LifecycleStatus,
    ) -> StoreResult<()> {
        self.update(ctx, offer_id, |o: &mut MarketplaceOffer| o.status = status)
            .await
    }

    // -- Exchange --

    async fn create_exchange_order(
        &self,
        ctx: &RequestContext,
        order: ExchangeOrder,
    ) -> StoreResult<ExchangeOrder> {
        self.create(ctx, order).await
    }

    async fn list_exchange_orders(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<ExchangeOrder>> {
        self.list(ctx, page, |o: &ExchangeOrder| {
            o.account_id == account_id && o.campaign_id == campaign_id
        })
        .await
    }

    async fn update_exchange_order_status(
        &self,
        ctx: &RequestContext,
        order_id: &str,
        status: LifecycleStatus,
    ) -> StoreResult<()> {
        self.update(ctx, order_id, |o: &mut ExchangeOrder| o.status = status)
            .await
    }

    async fn create_exchange_pair(
        &self,
        ctx: &RequestContext,
        pair: ExchangePair,
    ) -> StoreResult<ExchangePair> {
        self.create(ctx, pair).await
    }

    async fn get_exchange_pair(
        &self,
        ctx: &RequestContext,
        pair_id: &str,
    ) -> StoreResult<ExchangePair> {
        self.get(ctx, pair_id).await
    }

    async fn create_exchange_rate(
        &self,
        ctx: &RequestContext,
        rate: ExchangeRate,
    ) -> StoreResult<ExchangeRate> {
        self.create(ctx, rate).await
    }

    async fn list_exchange_rates(
        &self,
        ctx: &RequestContext,
        pair_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<ExchangeRate>> {
        self.list(ctx, page, |r: &ExchangeRate| {
            r.pair_id == pair_id && r.campaign_id == campaign_id
        })
        .await
    }

    // -- Master index --

    async fn lookup_master(
        &self,
        ctx: &RequestContext,
        entity_type: EntityType,
        business_key: &str,
    ) -> StoreResult<MasterEntity> {
        ensure_live(ctx)?;
        let snap = self.db.snapshot().await;
        master::lookup(&snap, entity_type, business_key)
            .ok_or_else(|| StoreError::not_found("master_entity", business_key))
    }

    async fn get_master(&self, ctx: &RequestContext, id: MasterId) -> StoreResult<MasterEntity> {
        ensure_live(ctx)?;
        let snap = self.db.snapshot().await;
        master::get(&snap, id).ok_or_else(|| StoreError::not_found("master_entity", id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use commerce_metadata::canonicalize;

    use super::*;
    use crate::error::ErrorKind;

    fn store() -> InMemoryCommerceStore {
        InMemoryCommerceStore::new()
    }

    fn quote(id: &str, user: &str) -> Quote {
        Quote {
            quote_id: id.into(),
            user_id: user.into(),
            product_id: "p1".into(),
            amount: 10.0,
            currency: "USD".into(),
            status: QuoteStatus::Pending,
            ..Default::default()
        }
    }

    fn item(product: &str, price: f64, quantity: i32) -> OrderItem {
        OrderItem {
            product_id: product.into(),
            price,
            quantity,
            ..Default::default()
        }
    }

    fn order(id: &str, items: Vec<OrderItem>) -> Order {
        let mut order = Order {
            order_id: id.into(),
            user_id: "u1".into(),
            currency: "USD".into(),
            status: OrderStatus::Pending,
            items,
            ..Default::default()
        };
        order.total = order.items_total();
        order
    }

    async fn row_counts(store: &InMemoryCommerceStore) -> (usize, usize, usize, usize) {
        let snap = store.database().snapshot().await;
        (
            snap.master().len(),
            snap.of::<Quote>().len(),
            snap.of::<Order>().len(),
            snap.of::<OrderItem>().len(),
        )
    }

    // -----------------------------------------------------------------------
    // Create protocol
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_assigns_master_and_round_trips() {
        let store = store();
        let ctx = RequestContext::new();
        let created = store.create_quote(&ctx, quote("q1", "u1")).await.unwrap();
        assert!(created.master.is_assigned());

        let fetched = store.get_quote(&ctx, "q1").await.unwrap();
        assert_eq!(fetched, created);

        let m = store
            .lookup_master(&ctx, EntityType::Quote, "q1")
            .await
            .unwrap();
        assert_eq!(m.reference(), created.master);
        assert_eq!(store.get_master(&ctx, m.id).await.unwrap(), m);
    }

    #[tokio::test]
    async fn absent_metadata_persists_as_empty_envelope() {
        let store = store();
        let ctx = RequestContext::new();
        store.create_quote(&ctx, quote("q1", "u1")).await.unwrap();

        let snap = store.database().snapshot().await;
        let stored = snap.of::<Quote>().get("q1").unwrap();
        assert_eq!(stored.metadata, br#"{"service_specific":{}}"#.to_vec());
    }

    #[tokio::test]
    async fn metadata_survives_storage() {
        let store = store();
        let ctx = RequestContext::new();
        let mut q = quote("q1", "u1");
        q.metadata = canonicalize(Some(&json!({"analytics": {"source": "ads"}})));
        store.create_quote(&ctx, q.clone()).await.unwrap();
        let fetched = store.get_quote(&ctx, "q1").await.unwrap();
        assert_eq!(fetched.metadata, q.metadata);
    }

    #[tokio::test]
    async fn duplicate_business_key_conflicts_without_side_effects() {
        let store = store();
        let ctx = RequestContext::new();
        store.create_quote(&ctx, quote("q1", "u1")).await.unwrap();
        let err = store.create_quote(&ctx, quote("q1", "u2")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(row_counts(&store).await, (1, 1, 0, 0));
        assert_eq!(store.get_quote(&ctx, "q1").await.unwrap().user_id, "u1");
    }

    #[tokio::test]
    async fn failure_after_master_insert_leaves_no_rows() {
        let store = store();
        let ctx = RequestContext::new();
        store.database().inject_fault(Quote::NAME);

        let err = store.create_quote(&ctx, quote("q1", "u1")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(row_counts(&store).await, (0, 0, 0, 0));
        assert!(store
            .lookup_master(&ctx, EntityType::Quote, "q1")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn failing_item_rolls_back_whole_order() {
        let store = store();
        let ctx = RequestContext::new();
        store.database().inject_fault(OrderItem::NAME);

        let o = order("o1", vec![item("p1", 2.0, 1), item("p2", 3.0, 1)]);
        assert!(store.create_order(&ctx, o).await.is_err());
        assert_eq!(row_counts(&store).await, (0, 0, 0, 0));
    }

    #[tokio::test]
    async fn duplicate_item_product_rolls_back_order() {
        let store = store();
        let ctx = RequestContext::new();
        let o = order("o1", vec![item("p1", 2.0, 1), item("p1", 2.0, 3)]);
        let err = store.create_order(&ctx, o).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(row_counts(&store).await, (0, 0, 0, 0));
    }

    #[tokio::test]
    async fn cancelled_request_writes_nothing() {
        let store = store();
        let ctx = RequestContext::new();
        ctx.cancel();
        let err = store.create_quote(&ctx, quote("q1", "u1")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(row_counts(&store).await, (0, 0, 0, 0));
    }

    #[tokio::test]
    async fn concurrent_creates_all_commit() {
        let store = store();
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let ctx = RequestContext::new();
                store.create_quote(&ctx, quote(&format!("q{i}"), "u1")).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        let (master, quotes, _, _) = row_counts(&store).await;
        assert_eq!((master, quotes), (16, 16));
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn order_total_equals_item_sum() {
        let store = store();
        let ctx = RequestContext::new();
        let created = store
            .create_order(&ctx, order("o1", vec![item("p1", 2.5, 4), item("p2", 7.25, 2)]))
            .await
            .unwrap();
        assert_eq!(created.total, 2.5 * 4.0 + 7.25 * 2.0);

        let fetched = store.get_order(&ctx, "o1").await.unwrap();
        assert_eq!(fetched.total, created.total);
        assert_eq!(fetched.items.len(), 2);
        assert_eq!(fetched.items[0].product_id, "p1");
        assert!(fetched.items.iter().all(|i| i.master.is_assigned()));
        assert_eq!(row_counts(&store).await, (3, 0, 1, 2));
    }

    #[tokio::test]
    async fn mismatched_total_rejected_before_io() {
        let store = store();
        let ctx = RequestContext::new();
        let mut o = order("o1", vec![item("p1", 2.0, 2)]);
        o.total = 5.0;
        let err = store.create_order(&ctx, o).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(row_counts(&store).await, (0, 0, 0, 0));
    }

    #[tokio::test]
    async fn items_inherit_order_scope() {
        let store = store();
        let ctx = RequestContext::new();
        let mut o = order("o1", vec![item("p1", 1.0, 1)]);
        o.campaign_id = CampaignId(9);
        store.create_order(&ctx, o).await.unwrap();
        let items = store.list_order_items(&ctx, "o1").await.unwrap();
        assert_eq!(items[0].order_id, "o1");
        assert_eq!(items[0].campaign_id, CampaignId(9));
    }

    // -----------------------------------------------------------------------
    // Updates
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn update_changes_status_and_touches() {
        let store = store();
        let ctx = RequestContext::new();
        let created = store.create_order(&ctx, order("o1", vec![])).await.unwrap();
        store
            .update_order_status(&ctx, "o1", OrderStatus::Paid)
            .await
            .unwrap();
        let fetched = store.get_order(&ctx, "o1").await.unwrap();
        assert_eq!(fetched.status, OrderStatus::Paid);
        assert!(fetched.updated_at >= created.updated_at);
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[tokio::test]
    async fn update_on_missing_key_is_not_found_and_changes_nothing() {
        let store = store();
        let ctx = RequestContext::new();
        store.create_order(&ctx, order("o1", vec![])).await.unwrap();

        let err = store
            .update_order_status(&ctx, "missing", OrderStatus::Paid)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            store.get_order(&ctx, "o1").await.unwrap().status,
            OrderStatus::Pending
        );
        assert_eq!(row_counts(&store).await, (1, 0, 1, 0));
    }

    #[tokio::test]
    async fn transition_applies_when_status_matches() {
        let store = store();
        let ctx = RequestContext::new();
        store.create_quote(&ctx, quote("q1", "u1")).await.unwrap();
        store
            .transition_quote_status(&ctx, "q1", QuoteStatus::Pending, QuoteStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(
            store.get_quote(&ctx, "q1").await.unwrap().status,
            QuoteStatus::Accepted
        );
    }

    #[tokio::test]
    async fn transition_from_stale_status_changes_nothing() {
        let store = store();
        let ctx = RequestContext::new();
        store.create_quote(&ctx, quote("q1", "u1")).await.unwrap();
        store
            .transition_quote_status(&ctx, "q1", QuoteStatus::Pending, QuoteStatus::Accepted)
            .await
            .unwrap();

        let err = store
            .transition_quote_status(&ctx, "q1", QuoteStatus::Pending, QuoteStatus::Rejected)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::StatusChanged { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            store.get_quote(&ctx, "q1").await.unwrap().status,
            QuoteStatus::Accepted
        );

        let err = store
            .transition_payment_status(&ctx, "missing", PaymentStatus::Pending, PaymentStatus::Succeeded)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_transitions_have_one_winner() {
        let store = store();
        let ctx = RequestContext::new();
        store.create_order(&ctx, order("o1", vec![])).await.unwrap();

        let targets = [
            OrderStatus::Paid,
            OrderStatus::Cancelled,
            OrderStatus::Paid,
            OrderStatus::Cancelled,
        ];
        let handles: Vec<_> = targets
            .into_iter()
            .map(|to| {
                let store = store.clone();
                tokio::spawn(async move {
                    let ctx = RequestContext::new();
                    store
                        .transition_order_status(&ctx, "o1", OrderStatus::Pending, to)
                        .await
                })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_ne!(
            store.get_order(&ctx, "o1").await.unwrap().status,
            OrderStatus::Pending
        );
    }

    #[tokio::test]
    async fn balance_update_is_scoped_by_campaign() {
        let store = store();
        let ctx = RequestContext::new();
        store
            .create_balance(
                &ctx,
                Balance {
                    user_id: "u1".into(),
                    currency: "USD".into(),
                    amount: 5.0,
                    campaign_id: CampaignId(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = store
            .update_balance(&ctx, "u1", "USD", CampaignId(2), 50.0)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        store
            .update_balance(&ctx, "u1", "USD", CampaignId(1), 50.0)
            .await
            .unwrap();
        let b = store
            .get_balance(&ctx, "u1", "USD", CampaignId(1))
            .await
            .unwrap();
        assert_eq!(b.amount, 50.0);
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn unreadable_metadata_does_not_fail_reads() {
        let store = store();
        let ctx = RequestContext::new();
        store.create_quote(&ctx, quote("q1", "u1")).await.unwrap();
        store
            .database()
            .transaction(&ctx, |tx| {
                tx.replace_metadata::<Quote>("q1", b"{\"audit\": {tru".to_vec())
            })
            .await
            .unwrap();

        let fetched = store.get_quote(&ctx, "q1").await.unwrap();
        assert!(fetched.metadata.is_empty());
        assert_eq!(fetched.amount, 10.0);

        let page = store
            .list_quotes(&ctx, "u1", CampaignId::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert!(page.items[0].metadata.is_empty());
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = store();
        let ctx = RequestContext::new();
        let err = store.get_payment(&ctx, "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "payment not found: nope");
    }

    #[tokio::test]
    async fn lists_are_scoped_by_owner_and_campaign() {
        let store = store();
        let ctx = RequestContext::new();
        store.create_quote(&ctx, quote("a", "u1")).await.unwrap();
        store.create_quote(&ctx, quote("b", "u2")).await.unwrap();
        let mut other_campaign = quote("c", "u1");
        other_campaign.campaign_id = CampaignId(7);
        store.create_quote(&ctx, other_campaign).await.unwrap();

        let page = store
            .list_quotes(&ctx, "u1", CampaignId::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].quote_id, "a");
    }

    #[tokio::test]
    async fn non_positive_paging_is_clamped() {
        let store = store();
        let ctx = RequestContext::new();
        for i in 0..3 {
            store.create_quote(&ctx, quote(&format!("q{i}"), "u1")).await.unwrap();
        }
        let page = store
            .list_quotes(&ctx, "u1", CampaignId::default(), PageRequest::new(0, -3))
            .await
            .unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 20);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.items[0].quote_id, "q2");
    }

    #[tokio::test]
    async fn events_link_to_existing_master() {
        let store = store();
        let ctx = RequestContext::new();
        let q = store.create_quote(&ctx, quote("q1", "u1")).await.unwrap();

        let logged = store
            .log_event(
                &ctx,
                CommerceEvent {
                    entity_id: "q1".into(),
                    entity_type: Some(EntityType::Quote),
                    event_type: "commerce.quote_created".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(logged.master, q.master);
        assert_eq!(logged.id, 1);

        let orphan = store
            .log_event(
                &ctx,
                CommerceEvent {
                    entity_id: "ghost".into(),
                    entity_type: Some(EntityType::Order),
                    event_type: "commerce.order_created".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!orphan.master.is_assigned());

        let page = store
            .list_events(&ctx, "q1", EntityType::Quote, CampaignId::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].event_type, "commerce.quote_created");
    }

    #[tokio::test]
    async fn bank_transfers_list_both_sides() {
        let store = store();
        let ctx = RequestContext::new();
        for (id, from, to) in [("t1", "a", "b"), ("t2", "b", "c"), ("t3", "c", "d")] {
            store
                .create_bank_transfer(
                    &ctx,
                    BankTransfer {
                        transfer_id: id.into(),
                        from_account_id: from.into(),
                        to_account_id: to.into(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }
        let page = store
            .list_bank_transfers(&ctx, "b", CampaignId::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn page_total_is_independent_of_page_size(n in 0usize..40, k in 1i64..50) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let store = store();
                let ctx = RequestContext::new();
                for i in 0..n {
                    store.create_quote(&ctx, quote(&format!("q{i}"), "u1")).await.unwrap();
                }
                store.create_quote(&ctx, quote("other", "u2")).await.unwrap();

                let page = store
                    .list_quotes(&ctx, "u1", CampaignId::default(), PageRequest::new(1, k))
                    .await
                    .unwrap();
                assert_eq!(page.total, n as u64);
                assert_eq!(page.items.len(), n.min(k as usize));
            });
        }
    }
}
