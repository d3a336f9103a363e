use async_trait::async_trait;

use commerce_types::{
    CampaignId, EntityType, LifecycleStatus, MasterId, OrderStatus, Page, PageRequest,
    PaymentStatus, QuoteStatus, RequestContext,
};

use crate::error::StoreResult;
use crate::master::MasterEntity;
use crate::records::{
    AssetPosition, Balance, BankAccount, BankStatement, BankTransfer, CommerceEvent,
    ExchangeOrder, ExchangePair, ExchangeRate, InvestmentAccount, InvestmentOrder,
    MarketplaceListing, MarketplaceOffer, MarketplaceOrder, Order, OrderItem, Payment, Portfolio,
    Quote, Transaction,
};

/// Persistence interface consumed by the service layer.
///
/// All implementations must satisfy these invariants:
/// - `create_*` mints the master entity and inserts the domain row (and, for
///   orders, every item) in one transaction: afterwards both exist or
///   neither does.
/// - Every stored record has a non-null metadata envelope.
/// - `update_*` matching zero rows returns `NotFound` and changes nothing.
/// - `list_*` returns rows newest-created first together with the total
///   number of matching rows, computed independently of the page.
/// - Reads never fail because stored metadata is unreadable.
#[async_trait]
pub trait CommerceStore: Send + Sync {
    // -- Quotes --
    async fn create_quote(&self, ctx: &RequestContext, quote: Quote) -> StoreResult<Quote>;
    async fn get_quote(&self, ctx: &RequestContext, quote_id: &str) -> StoreResult<Quote>;
    async fn list_quotes(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<Quote>>;
    async fn update_quote_status(
        &self,
        ctx: &RequestContext,
        quote_id: &str,
        status: QuoteStatus,
    ) -> StoreResult<()>;
    /// Move a quote from `from` to `to` in one transaction. Fails with
    /// [`StoreError::StatusChanged`] when the stored status is not `from`.
    ///
    /// [`StoreError::StatusChanged`]: crate::StoreError::StatusChanged
    async fn transition_quote_status(
        &self,
        ctx: &RequestContext,
        quote_id: &str,
        from: QuoteStatus,
        to: QuoteStatus,
    ) -> StoreResult<()>;

    // -- Orders --
    /// Create an order and its items atomically. A supplied `total` must
    /// equal the sum of the item lines.
    async fn create_order(&self, ctx: &RequestContext, order: Order) -> StoreResult<Order>;
    /// Fetch an order with its items.
    async fn get_order(&self, ctx: &RequestContext, order_id: &str) -> StoreResult<Order>;
    async fn list_orders(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<Order>>;
    async fn update_order_status(
        &self,
        ctx: &RequestContext,
        order_id: &str,
        status: OrderStatus,
    ) -> StoreResult<()>;
    /// Move a order from `from` to `to` in one transaction. Fails with
    /// [`StoreError::StatusChanged`] when the stored status is not `from`.
    ///
    /// [`StoreError::StatusChanged`]: crate::StoreError::StatusChanged
    async fn transition_order_status(
        &self,
        ctx: &RequestContext,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> StoreResult<()>;
    async fn list_order_items(
        &self,
        ctx: &RequestContext,
        order_id: &str,
    ) -> StoreResult<Vec<OrderItem>>;

    // -- Payments --
    async fn create_payment(&self, ctx: &RequestContext, payment: Payment) -> StoreResult<Payment>;
    async fn get_payment(&self, ctx: &RequestContext, payment_id: &str) -> StoreResult<Payment>;
    async fn list_payments(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<Payment>>;
    async fn update_payment_status(
        &self,
        ctx: &RequestContext,
        payment_id: &str,
        status: PaymentStatus,
    ) -> StoreResult<()>;
    /// Move a payment from `from` to `to` in one transaction. Fails with
    /// [`StoreError::StatusChanged`] when the stored status is not `from`.
    ///
    /// [`StoreError::StatusChanged`]: crate::StoreError::StatusChanged
    async fn transition_payment_status(
        &self,
        ctx: &RequestContext,
        payment_id: &str,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> StoreResult<()>;

    // -- Transactions --
    async fn create_transaction(
        &self,
        ctx: &RequestContext,
        transaction: Transaction,
    ) -> StoreResult<Transaction>;
    async fn get_transaction(
        &self,
        ctx: &RequestContext,
        transaction_id: &str,
    ) -> StoreResult<Transaction>;
    async fn list_transactions(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<Transaction>>;

    // -- Balances --
    async fn create_balance(&self, ctx: &RequestContext, balance: Balance) -> StoreResult<Balance>;
    async fn get_balance(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        currency: &str,
        campaign_id: CampaignId,
    ) -> StoreResult<Balance>;
    async fn list_balances(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<Balance>>;
    async fn update_balance(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        currency: &str,
        campaign_id: CampaignId,
        amount: f64,
    ) -> StoreResult<()>;

    // -- Event log --
    async fn log_event(
        &self,
        ctx: &RequestContext,
        event: CommerceEvent,
    ) -> StoreResult<CommerceEvent>;
    async fn list_events(
        &self,
        ctx: &RequestContext,
        entity_id: &str,
        entity_type: EntityType,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<CommerceEvent>>;

    // -- Investment --
    async fn create_investment_account(
        &self,
        ctx: &RequestContext,
        account: InvestmentAccount,
    ) -> StoreResult<InvestmentAccount>;
    async fn get_investment_account(
        &self,
        ctx: &RequestContext,
        account_id: &str,
    ) -> StoreResult<InvestmentAccount>;
    async fn list_investment_accounts(
        &self,
        ctx: &RequestContext,
        owner_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<InvestmentAccount>>;
    async fn create_investment_order(
        &self,
        ctx: &RequestContext,
        order: InvestmentOrder,
    ) -> StoreResult<InvestmentOrder>;
    async fn get_investment_order(
        &self,
        ctx: &RequestContext,
        order_id: &str,
    ) -> StoreResult<InvestmentOrder>;
    async fn list_investment_orders(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<InvestmentOrder>>;
    async fn update_investment_order_status(
        &self,
        ctx: &RequestContext,
        order_id: &str,
        status: LifecycleStatus,
    ) -> StoreResult<()>;
    async fn create_portfolio(
        &self,
        ctx: &RequestContext,
        portfolio: Portfolio,
    ) -> StoreResult<Portfolio>;
    async fn get_portfolio(&self, ctx: &RequestContext, portfolio_id: &str)
        -> StoreResult<Portfolio>;
    async fn list_portfolios(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<Portfolio>>;
    async fn create_asset_position(
        &self,
        ctx: &RequestContext,
        position: AssetPosition,
    ) -> StoreResult<AssetPosition>;
    async fn list_asset_positions(
        &self,
        ctx: &RequestContext,
        portfolio_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<AssetPosition>>;

    // -- Banking --
    async fn create_bank_account(
        &self,
        ctx: &RequestContext,
        account: BankAccount,
    ) -> StoreResult<BankAccount>;
    async fn get_bank_account(
        &self,
        ctx: &RequestContext,
        account_id: &str,
    ) -> StoreResult<BankAccount>;
    async fn list_bank_accounts(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<BankAccount>>;
    async fn create_bank_transfer(
        &self,
        ctx: &RequestContext,
        transfer: BankTransfer,
    ) -> StoreResult<BankTransfer>;
    /// Transfers where the account is either side.
    async fn list_bank_transfers(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<BankTransfer>>;
    async fn update_bank_transfer_status(
        &self,
        ctx: &RequestContext,
        transfer_id: &str,
        status: LifecycleStatus,
    ) -> StoreResult<()>;
    async fn create_bank_statement(
        &self,
        ctx: &RequestContext,
        statement: BankStatement,
    ) -> StoreResult<BankStatement>;
    async fn list_bank_statements(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<BankStatement>>;

    // -- Marketplace --
    async fn create_marketplace_listing(
        &self,
        ctx: &RequestContext,
        listing: MarketplaceListing,
    ) -> StoreResult<MarketplaceListing>;
    async fn get_marketplace_listing(
        &self,
        ctx: &RequestContext,
        listing_id: &str,
    ) -> StoreResult<MarketplaceListing>;
    async fn list_marketplace_listings(
        &self,
        ctx: &RequestContext,
        seller_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<MarketplaceListing>>;
    async fn update_marketplace_listing_status(
        &self,
        ctx: &RequestContext,
        listing_id: &str,
        status: LifecycleStatus,
    ) -> StoreResult<()>;
    async fn create_marketplace_order(
        &self,
        ctx: &RequestContext,
        order: MarketplaceOrder,
    ) -> StoreResult<MarketplaceOrder>;
    async fn list_marketplace_orders(
        &self,
        ctx: &RequestContext,
        listing_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<MarketplaceOrder>>;
    async fn create_marketplace_offer(
        &self,
        ctx: &RequestContext,
        offer: MarketplaceOffer,
    ) -> StoreResult<MarketplaceOffer>;
    async fn list_marketplace_offers(
        &self,
        ctx: &RequestContext,
        listing_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<MarketplaceOffer>>;
    async fn update_marketplace_offer_status(
        &self,
        ctx: &RequestContext,
        offer_id: &str,
        status: LifecycleStatus,
    ) -> StoreResult<()>;

    // -- Exchange --
    async fn create_exchange_order(
        &self,
        ctx: &RequestContext,
        order: ExchangeOrder,
    ) -> StoreResult<ExchangeOrder>;
    async fn list_exchange_orders(
        &self,
        ctx: &RequestContext,
        account_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<ExchangeOrder>>;
    async fn update_exchange_order_status(
        &self,
        ctx: &RequestContext,
        order_id: &str,
        status: LifecycleStatus,
    ) -> StoreResult<()>;
    async fn create_exchange_pair(
        &self,
        ctx: &RequestContext,
        pair: ExchangePair,
    ) -> StoreResult<ExchangePair>;
    async fn get_exchange_pair(&self, ctx: &RequestContext, pair_id: &str)
        -> StoreResult<ExchangePair>;
    async fn create_exchange_rate(
        &self,
        ctx: &RequestContext,
        rate: ExchangeRate,
    ) -> StoreResult<ExchangeRate>;
    async fn list_exchange_rates(
        &self,
        ctx: &RequestContext,
        pair_id: &str,
        campaign_id: CampaignId,
        page: PageRequest,
    ) -> StoreResult<Page<ExchangeRate>>;

    // -- Master index --
    async fn lookup_master(
        &self,
        ctx: &RequestContext,
        entity_type: EntityType,
        business_key: &str,
    ) -> StoreResult<MasterEntity>;
    async fn get_master(&self, ctx: &RequestContext, id: MasterId) -> StoreResult<MasterEntity>;
}
