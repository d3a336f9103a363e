//! Quotes, orders, payments, transactions, balances, and the event log.

use tracing::info;

use commerce_store::{Balance, CommerceEvent, Order, OrderItem, Payment, Quote, Transaction};
use commerce_types::{
    OrderStatus, Page, PaymentStatus, QuoteStatus, RequestContext, TransactionStatus,
};

use crate::error::{ServiceError, ServiceResult};
use crate::events;
use crate::requests::*;
use crate::service::CommerceService;

impl CommerceService {
    // -- Quotes --

    pub async fn create_quote(
        &self,
        ctx: &RequestContext,
        req: CreateQuoteRequest,
    ) -> ServiceResult<Quote> {
        req.validate()?;
        let metadata = self.prepare_metadata(ctx, req.metadata.as_ref(), "create_quote")?;
        let quote = Quote {
            quote_id: self.keys.key(&[req.user_id.as_str(), req.product_id.as_str()]),
            user_id: req.user_id,
            product_id: req.product_id,
            amount: req.amount,
            currency: req.currency,
            status: QuoteStatus::Pending,
            campaign_id: req.campaign_id,
            metadata,
            ..Default::default()
        };
        let quote = self.store.create_quote(ctx, quote).await?;
        info!(operation = "create_quote", business_key = %quote.quote_id, "quote created");
        self.after_write(ctx, events::QUOTE_CREATED, &quote).await;
        Ok(quote)
    }

    pub async fn get_quote(&self, ctx: &RequestContext, req: GetQuoteRequest) -> ServiceResult<Quote> {
        required("quote_id", &req.quote_id)?;
        Ok(self.store.get_quote(ctx, &req.quote_id).await?)
    }

    pub async fn list_quotes(
        &self,
        ctx: &RequestContext,
        req: ListQuotesRequest,
    ) -> ServiceResult<Page<Quote>> {
        required("user_id", &req.user_id)?;
        Ok(self
            .store
            .list_quotes(ctx, &req.user_id, req.campaign_id, req.page)
            .await?)
    }

    pub async fn update_quote_status(
        &self,
        ctx: &RequestContext,
        req: UpdateQuoteStatusRequest,
    ) -> ServiceResult<Quote> {
        req.validate()?;
        let current = self.store.get_quote(ctx, &req.quote_id).await?;
        if !current.status.can_transition_to(req.status) {
            return Err(ServiceError::invalid(format!(
                "quote cannot move from {} to {}",
                current.status, req.status
            )));
        }
        self.store
            .transition_quote_status(ctx, &req.quote_id, current.status, req.status)
            .await?;
        let quote = self.store.get_quote(ctx, &req.quote_id).await?;
        info!(operation = "update_quote_status", business_key = %quote.quote_id, status = %quote.status, "quote status updated");
        self.after_write(ctx, events::QUOTE_STATUS_UPDATED, &quote).await;
        Ok(quote)
    }

    // -- Orders --

    pub async fn create_order(
        &self,
        ctx: &RequestContext,
        req: CreateOrderRequest,
    ) -> ServiceResult<Order> {
        req.validate()?;
        let metadata = self.prepare_metadata(ctx, req.metadata.as_ref(), "create_order")?;
        let order_id = self.keys.key(&[req.user_id.as_str(), "order"]);
        let items: Vec<OrderItem> = req
            .items
            .into_iter()
            .map(|item| OrderItem {
                order_id: order_id.clone(),
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
                campaign_id: req.campaign_id,
                metadata: metadata.clone(),
                ..Default::default()
            })
            .collect();
        let mut order = Order {
            order_id,
            user_id: req.user_id,
            items,
            currency: req.currency,
            status: OrderStatus::Pending,
            campaign_id: req.campaign_id,
            metadata,
            ..Default::default()
        };
        order.total = order.items_total();

        let order = self.store.create_order(ctx, order).await?;
        info!(
            operation = "create_order",
            business_key = %order.order_id,
            items = order.items.len(),
            total = order.total,
            "order created"
        );
        self.after_write(ctx, events::ORDER_CREATED, &order).await;
        Ok(order)
    }

    pub async fn get_order(&self, ctx: &RequestContext, req: GetOrderRequest) -> ServiceResult<Order> {
        required("order_id", &req.order_id)?;
        Ok(self.store.get_order(ctx, &req.order_id).await?)
    }

    pub async fn list_orders(
        &self,
        ctx: &RequestContext,
        req: ListOrdersRequest,
    ) -> ServiceResult<Page<Order>> {
        required("user_id", &req.user_id)?;
        Ok(self
            .store
            .list_orders(ctx, &req.user_id, req.campaign_id, req.page)
            .await?)
    }

    pub async fn update_order_status(
        &self,
        ctx: &RequestContext,
        req: UpdateOrderStatusRequest,
    ) -> ServiceResult<Order> {
        req.validate()?;
        let current = self.store.get_order(ctx, &req.order_id).await?;
        if !current.status.can_transition_to(req.status) {
            return Err(ServiceError::invalid(format!(
                "order cannot move from {} to {}",
                current.status, req.status
            )));
        }
        self.store
            .transition_order_status(ctx, &req.order_id, current.status, req.status)
            .await?;
        let order = self.store.get_order(ctx, &req.order_id).await?;
        info!(operation = "update_order_status", business_key = %order.order_id, status = %order.status, "order status updated");
        self.after_write(ctx, events::ORDER_STATUS_UPDATED, &order).await;
        Ok(order)
    }

    // -- Payments --

    pub async fn initiate_payment(
        &self,
        ctx: &RequestContext,
        req: InitiatePaymentRequest,
    ) -> ServiceResult<Payment> {
        req.validate()?;
        let metadata = self.prepare_metadata(ctx, req.metadata.as_ref(), "initiate_payment")?;
        let payment = Payment {
            payment_id: self.keys.key(&[req.order_id.as_str(), "payment"]),
            order_id: req.order_id,
            user_id: req.user_id,
            amount: req.amount,
            currency: req.currency,
            method: req.method,
            status: PaymentStatus::Pending,
            campaign_id: req.campaign_id,
            metadata,
            ..Default::default()
        };
        let payment = self.store.create_payment(ctx, payment).await?;
        info!(operation = "initiate_payment", business_key = %payment.payment_id, "payment initiated");
        self.after_write(ctx, events::PAYMENT_INITIATED, &payment).await;
        Ok(payment)
    }

    pub async fn confirm_payment(
        &self,
        ctx: &RequestContext,
        req: PaymentActionRequest,
    ) -> ServiceResult<Payment> {
        self.move_payment(ctx, req, PaymentStatus::Succeeded, "confirm_payment", events::PAYMENT_CONFIRMED)
            .await
    }

    /// Refund a payment. Only a `SUCCEEDED` payment can be refunded.
    pub async fn refund_payment(
        &self,
        ctx: &RequestContext,
        req: PaymentActionRequest,
    ) -> ServiceResult<Payment> {
        self.move_payment(ctx, req, PaymentStatus::Refunded, "refund_payment", events::PAYMENT_REFUNDED)
            .await
    }

    async fn move_payment(
        &self,
        ctx: &RequestContext,
        req: PaymentActionRequest,
        next: PaymentStatus,
        operation: &str,
        event_type: &str,
    ) -> ServiceResult<Payment> {
        req.validate()?;
        if req.metadata.is_some() {
            self.prepare_metadata(ctx, req.metadata.as_ref(), operation)?;
        }
        let current = self.store.get_payment(ctx, &req.payment_id).await?;
        if current.user_id != req.user_id {
            return Err(ServiceError::NotFound(format!("payment {}", req.payment_id)));
        }
        if !current.status.can_transition_to(next) {
            return Err(ServiceError::invalid(format!(
                "payment cannot move from {} to {next}",
                current.status
            )));
        }
        self.store
            .transition_payment_status(ctx, &req.payment_id, current.status, next)
            .await?;
        let payment = self.store.get_payment(ctx, &req.payment_id).await?;
        info!(operation, business_key = %payment.payment_id, status = %payment.status, "payment status updated");
        self.after_write(ctx, event_type, &payment).await;
        Ok(payment)
    }

    pub async fn get_payment(
        &self,
        ctx: &RequestContext,
        req: GetPaymentRequest,
    ) -> ServiceResult<Payment> {
        required("payment_id", &req.payment_id)?;
        Ok(self.store.get_payment(ctx, &req.payment_id).await?)
    }

    // -- Transactions --

    pub async fn record_transaction(
        &self,
        ctx: &RequestContext,
        req: RecordTransactionRequest,
    ) -> ServiceResult<Transaction> {
        req.validate()?;
        let metadata = self.prepare_metadata(ctx, req.metadata.as_ref(), "record_transaction")?;
        let status = if req.status.is_specified() {
            req.status
        } else {
            TransactionStatus::Pending
        };
        let transaction = Transaction {
            transaction_id: self.keys.key(&[req.payment_id.as_str(), "transaction"]),
            payment_id: req.payment_id,
            user_id: req.user_id,
            kind: req.kind,
            amount: req.amount,
            currency: req.currency,
            status,
            campaign_id: req.campaign_id,
            metadata,
            ..Default::default()
        };
        let transaction = self.store.create_transaction(ctx, transaction).await?;
        info!(operation = "record_transaction", business_key = %transaction.transaction_id, "transaction recorded");
        self.after_write(ctx, events::TRANSACTION_RECORDED, &transaction)
            .await;
        Ok(transaction)
    }

    pub async fn get_transaction(
        &self,
        ctx: &RequestContext,
        req: GetTransactionRequest,
    ) -> ServiceResult<Transaction> {
        required("transaction_id", &req.transaction_id)?;
        Ok(self.store.get_transaction(ctx, &req.transaction_id).await?)
    }

    pub async fn list_transactions(
        &self,
        ctx: &RequestContext,
        req: ListTransactionsRequest,
    ) -> ServiceResult<Page<Transaction>> {
        required("user_id", &req.user_id)?;
        Ok(self
            .store
            .list_transactions(ctx, &req.user_id, req.campaign_id, req.page)
            .await?)
    }

    // -- Balances --

    pub async fn open_balance(
        &self,
        ctx: &RequestContext,
        req: OpenBalanceRequest,
    ) -> ServiceResult<Balance> {
        req.validate()?;
        let metadata = self.prepare_metadata(ctx, req.metadata.as_ref(), "open_balance")?;
        let balance = Balance {
            user_id: req.user_id,
            currency: req.currency,
            amount: req.amount,
            campaign_id: req.campaign_id,
            metadata,
            ..Default::default()
        };
        let balance = self.store.create_balance(ctx, balance).await?;
        info!(operation = "open_balance", user_id = %balance.user_id, currency = %balance.currency, "balance opened");
        self.after_write(ctx, events::BALANCE_UPDATED, &balance).await;
        Ok(balance)
    }

    pub async fn get_balance(
        &self,
        ctx: &RequestContext,
        req: GetBalanceRequest,
    ) -> ServiceResult<Balance> {
        required("user_id", &req.user_id)?;
        required("currency", &req.currency)?;
        Ok(self
            .store
            .get_balance(ctx, &req.user_id, &req.currency, req.campaign_id)
            .await?)
    }

    pub async fn list_balances(
        &self,
        ctx: &RequestContext,
        req: ListBalancesRequest,
    ) -> ServiceResult<Page<Balance>> {
        required("user_id", &req.user_id)?;
        Ok(self
            .store
            .list_balances(ctx, &req.user_id, req.campaign_id, req.page)
            .await?)
    }

    pub async fn update_balance(
        &self,
        ctx: &RequestContext,
        req: UpdateBalanceRequest,
    ) -> ServiceResult<Balance> {
        req.validate()?;
        self.store
            .update_balance(ctx, &req.user_id, &req.currency, req.campaign_id, req.amount)
            .await?;
        let balance = self
            .store
            .get_balance(ctx, &req.user_id, &req.currency, req.campaign_id)
            .await?;
        info!(operation = "update_balance", user_id = %balance.user_id, currency = %balance.currency, "balance updated");
        self.after_write(ctx, events::BALANCE_UPDATED, &balance).await;
        Ok(balance)
    }

    // -- Event log --

    pub async fn list_events(
        &self,
        ctx: &RequestContext,
        req: ListEventsRequest,
    ) -> ServiceResult<Page<CommerceEvent>> {
        required("entity_id", &req.entity_id)?;
        let entity_type = req
            .entity_type
            .ok_or_else(|| ServiceError::invalid("entity_type is required"))?;
        Ok(self
            .store
            .list_events(ctx, &req.entity_id, entity_type, req.campaign_id, req.page)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use commerce_store::CommerceStore;
    use commerce_types::{CampaignId, EntityType, PageRequest, TransactionType};

    use super::*;
    use crate::testing::harness;

    fn quote_request(user: &str) -> CreateQuoteRequest {
        CreateQuoteRequest {
            user_id: user.into(),
            product_id: "p1".into(),
            amount: 10.0,
            currency: "USD".into(),
            ..Default::default()
        }
    }

    fn order_request() -> CreateOrderRequest {
        CreateOrderRequest {
            user_id: "u1".into(),
            currency: "USD".into(),
            items: vec![
                OrderItemInput {
                    product_id: "p1".into(),
                    quantity: 3,
                    price: 2.5,
                },
                OrderItemInput {
                    product_id: "p2".into(),
                    quantity: 1,
                    price: 4.0,
                },
            ],
            ..Default::default()
        }
    }

    fn payment_request() -> InitiatePaymentRequest {
        InitiatePaymentRequest {
            order_id: "o1".into(),
            user_id: "u1".into(),
            amount: 11.5,
            currency: "USD".into(),
            method: "card".into(),
            ..Default::default()
        }
    }

    fn action(payment_id: &str) -> PaymentActionRequest {
        PaymentActionRequest {
            payment_id: payment_id.into(),
            user_id: "u1".into(),
            metadata: None,
        }
    }

    // -----------------------------------------------------------------------
    // Quotes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn created_quote_reads_back() {
        let h = harness();
        let ctx = RequestContext::new();
        let quote = h.service.create_quote(&ctx, quote_request("u1")).await.unwrap();

        assert_eq!(quote.status, QuoteStatus::Pending);
        assert!(quote.quote_id.starts_with("u1:p1:"));
        assert!(quote.master.is_assigned());

        let fetched = h
            .service
            .get_quote(&ctx, GetQuoteRequest { quote_id: quote.quote_id.clone() })
            .await
            .unwrap();
        assert_eq!(fetched.user_id, "u1");
        assert_eq!(fetched.product_id, "p1");
        assert_eq!(fetched.amount, 10.0);
        assert_eq!(fetched.currency, "USD");
        assert_eq!(fetched, quote);
    }

    #[tokio::test]
    async fn repeated_quotes_get_distinct_keys() {
        let h = harness();
        let ctx = RequestContext::new();
        let a = h.service.create_quote(&ctx, quote_request("u1")).await.unwrap();
        let b = h.service.create_quote(&ctx, quote_request("u1")).await.unwrap();
        assert_ne!(a.quote_id, b.quote_id);

        let page = h
            .service
            .list_quotes(
                &ctx,
                ListQuotesRequest {
                    user_id: "u1".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].quote_id, b.quote_id);
    }

    #[tokio::test]
    async fn quote_terminal_states_are_final() {
        let mut h = harness();
        let ctx = RequestContext::new();
        let quote = h.service.create_quote(&ctx, quote_request("u1")).await.unwrap();

        let accepted = h
            .service
            .update_quote_status(
                &ctx,
                UpdateQuoteStatusRequest {
                    quote_id: quote.quote_id.clone(),
                    status: QuoteStatus::Accepted,
                },
            )
            .await
            .unwrap();
        assert_eq!(accepted.status, QuoteStatus::Accepted);

        let err = h
            .service
            .update_quote_status(
                &ctx,
                UpdateQuoteStatusRequest {
                    quote_id: quote.quote_id,
                    status: QuoteStatus::Rejected,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(
            h.drain(),
            vec!["commerce.quote_created", "commerce.quote_status_updated"]
        );
    }

    #[tokio::test]
    async fn concurrent_quote_decisions_have_one_winner() {
        let h = harness();
        let ctx = RequestContext::new();
        let quote = h.service.create_quote(&ctx, quote_request("u1")).await.unwrap();
        let service = Arc::new(h.service);

        // An open write transaction parks both updates so their reads overlap.
        let gate = h.store.database().begin(&ctx).await.unwrap();
        let decide = |status: QuoteStatus| {
            let service = Arc::clone(&service);
            let quote_id = quote.quote_id.clone();
            tokio::spawn(async move {
                service
                    .update_quote_status(
                        &RequestContext::new(),
                        UpdateQuoteStatusRequest { quote_id, status },
                    )
                    .await
            })
        };
        let accept = decide(QuoteStatus::Accepted);
        let reject = decide(QuoteStatus::Rejected);
        tokio::time::sleep(Duration::from_millis(20)).await;
        gate.rollback();

        let results = [accept.await.unwrap(), reject.await.unwrap()];
        let winners: Vec<&Quote> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(ServiceError::is_invalid_argument));

        let stored = h.store.get_quote(&ctx, &quote.quote_id).await.unwrap();
        assert_eq!(stored.status, winners[0].status);
        assert_eq!(h.bus.published_count(), 2);
    }

    #[tokio::test]
    async fn missing_fields_fail_before_io() {
        let h = harness();
        let ctx = RequestContext::new();
        let err = h
            .service
            .create_quote(&ctx, quote_request(""))
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let snap = h.store.database().snapshot().await;
        assert!(snap.master().is_empty());
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn order_total_is_sum_of_items() {
        let mut h = harness();
        let ctx = RequestContext::new();
        let order = h.service.create_order(&ctx, order_request()).await.unwrap();
        assert_eq!(order.total, 3.0 * 2.5 + 4.0);
        assert_eq!(order.items.len(), 2);
        assert!(order.items.iter().all(|i| i.order_id == order.order_id));

        let fetched = h
            .service
            .get_order(&ctx, GetOrderRequest { order_id: order.order_id.clone() })
            .await
            .unwrap();
        assert_eq!(fetched.total, order.total);
        assert_eq!(fetched.items.len(), 2);
        assert_eq!(h.drain(), vec!["commerce.order_created"]);
    }

    #[tokio::test]
    async fn updating_missing_order_is_not_found_and_silent() {
        let mut h = harness();
        let ctx = RequestContext::new();
        let err = h
            .service
            .update_order_status(
                &ctx,
                UpdateOrderStatusRequest {
                    order_id: "nonexistent".into(),
                    status: OrderStatus::Paid,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(h.drain().is_empty());
    }

    #[tokio::test]
    async fn order_walks_its_state_machine() {
        let h = harness();
        let ctx = RequestContext::new();
        let order = h.service.create_order(&ctx, order_request()).await.unwrap();
        let update = |status| UpdateOrderStatusRequest {
            order_id: order.order_id.clone(),
            status,
        };

        let err = h
            .service
            .update_order_status(&ctx, update(OrderStatus::Shipped))
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());

        for status in [OrderStatus::Paid, OrderStatus::Shipped, OrderStatus::Completed] {
            let updated = h.service.update_order_status(&ctx, update(status)).await.unwrap();
            assert_eq!(updated.status, status);
        }

        let err = h
            .service
            .update_order_status(&ctx, update(OrderStatus::Refunded))
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    // -----------------------------------------------------------------------
    // Payments
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn refund_requires_confirmed_payment() {
        let mut h = harness();
        let ctx = RequestContext::new();
        let payment = h
            .service
            .initiate_payment(&ctx, payment_request())
            .await
            .unwrap();
        assert!(payment.payment_id.starts_with("o1:payment:"));

        let err = h
            .service
            .refund_payment(&ctx, action(&payment.payment_id))
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let confirmed = h
            .service
            .confirm_payment(&ctx, action(&payment.payment_id))
            .await
            .unwrap();
        assert_eq!(confirmed.status, PaymentStatus::Succeeded);

        let refunded = h
            .service
            .refund_payment(&ctx, action(&payment.payment_id))
            .await
            .unwrap();
        assert_eq!(refunded.status, PaymentStatus::Refunded);

        assert_eq!(
            h.drain(),
            vec![
                "commerce.payment_initiated",
                "commerce.payment_confirmed",
                "commerce.payment_refunded"
            ]
        );
    }

    #[tokio::test]
    async fn other_users_cannot_move_a_payment() {
        let h = harness();
        let ctx = RequestContext::new();
        let payment = h
            .service
            .initiate_payment(&ctx, payment_request())
            .await
            .unwrap();
        let mut req = action(&payment.payment_id);
        req.user_id = "intruder".into();
        let err = h.service.confirm_payment(&ctx, req).await.unwrap_err();
        assert!(err.is_not_found());
    }

    // -----------------------------------------------------------------------
    // Transactions, balances, events
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn transaction_defaults_to_pending() {
        let h = harness();
        let ctx = RequestContext::new();
        let tx = h
            .service
            .record_transaction(
                &ctx,
                RecordTransactionRequest {
                    payment_id: "pay1".into(),
                    user_id: "u1".into(),
                    kind: TransactionType::Debit,
                    amount: 5.0,
                    currency: "USD".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(tx.transaction_id.starts_with("pay1:transaction:"));

        let page = h
            .service
            .list_transactions(
                &ctx,
                ListTransactionsRequest {
                    user_id: "u1".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn balance_open_update_and_read() {
        let mut h = harness();
        let ctx = RequestContext::new();
        let campaign = CampaignId(5);
        h.service
            .open_balance(
                &ctx,
                OpenBalanceRequest {
                    user_id: "u1".into(),
                    currency: "EUR".into(),
                    amount: 1.0,
                    campaign_id: campaign,
                    metadata: None,
                },
            )
            .await
            .unwrap();

        let updated = h
            .service
            .update_balance(
                &ctx,
                UpdateBalanceRequest {
                    user_id: "u1".into(),
                    currency: "EUR".into(),
                    campaign_id: campaign,
                    amount: 42.0,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.amount, 42.0);

        let missing = h
            .service
            .get_balance(
                &ctx,
                GetBalanceRequest {
                    user_id: "u1".into(),
                    currency: "EUR".into(),
                    campaign_id: CampaignId(6),
                },
            )
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
        assert_eq!(
            h.drain(),
            vec!["commerce.balance_updated", "commerce.balance_updated"]
        );
    }

    #[tokio::test]
    async fn events_listing_requires_entity_type() {
        let h = harness();
        let ctx = RequestContext::new();
        let order = h.service.create_order(&ctx, order_request()).await.unwrap();

        let err = h
            .service
            .list_events(
                &ctx,
                ListEventsRequest {
                    entity_id: order.order_id.clone(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let page = h
            .service
            .list_events(
                &ctx,
                ListEventsRequest {
                    entity_id: order.order_id.clone(),
                    entity_type: Some(EntityType::Order),
                    campaign_id: CampaignId::default(),
                    page: PageRequest::default(),
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].event_type, "commerce.order_created");

        let direct = h
            .store
            .list_order_items(&ctx, &order.order_id)
            .await
            .unwrap();
        assert_eq!(direct.len(), 2);
    }
}
