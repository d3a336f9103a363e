//! Exchange pairs, rates, and orders.

use chrono::Utc;
use tracing::info;

use commerce_store::{ExchangeOrder, ExchangePair, ExchangeRate};
use commerce_types::{LifecycleStatus, Page, RequestContext};

use crate::error::ServiceResult;
use crate::events;
use crate::requests::*;
use crate::service::CommerceService;

impl CommerceService {
    /// Pairs are keyed by the caller-supplied `pair_id`; creating the same
    /// pair twice fails.
    pub async fn create_exchange_pair(
        &self,
        ctx: &RequestContext,
        req: CreateExchangePairRequest,
    ) -> ServiceResult<ExchangePair> {
        req.validate()?;
        let metadata = self.prepare_metadata(ctx, req.metadata.as_ref(), "create_exchange_pair")?;
        let pair = ExchangePair {
            pair_id: req.pair_id,
            base_asset: req.base_asset,
            quote_asset: req.quote_asset,
            campaign_id: req.campaign_id,
            metadata,
            ..Default::default()
        };
        let pair = self.store.create_exchange_pair(ctx, pair).await?;
        info!(operation = "create_exchange_pair", business_key = %pair.pair_id, "exchange pair created");
        self.after_write(ctx, events::EXCHANGE_PAIR_CREATED, &pair)
            .await;
        Ok(pair)
    }

    pub async fn create_exchange_rate(
        &self,
        ctx: &RequestContext,
        req: CreateExchangeRateRequest,
    ) -> ServiceResult<ExchangeRate> {
        req.validate()?;
        let metadata = self.prepare_metadata(ctx, req.metadata.as_ref(), "create_exchange_rate")?;
        self.store.get_exchange_pair(ctx, &req.pair_id).await?;
        let rate = ExchangeRate {
            rate_id: self.keys.key(&[req.pair_id.as_str(), "rate"]),
            pair_id: req.pair_id,
            rate: req.rate,
            timestamp: Utc::now(),
            campaign_id: req.campaign_id,
            metadata,
            ..Default::default()
        };
        let rate = self.store.create_exchange_rate(ctx, rate).await?;
        info!(operation = "create_exchange_rate", business_key = %rate.rate_id, rate = rate.rate, "exchange rate created");
        self.after_write(ctx, events::EXCHANGE_RATE_CREATED, &rate)
            .await;
        Ok(rate)
    }

    pub async fn list_exchange_rates(
        &self,
        ctx: &RequestContext,
        req: ListExchangeRatesRequest,
    ) -> ServiceResult<Page<ExchangeRate>> {
        required("pair_id", &req.pair_id)?;
        Ok(self
            .store
            .list_exchange_rates(ctx, &req.pair_id, req.campaign_id, req.page)
            .await?)
    }

    pub async fn place_exchange_order(
        &self,
        ctx: &RequestContext,
        req: PlaceExchangeOrderRequest,
    ) -> ServiceResult<ExchangeOrder> {
        req.validate()?;
        let metadata = self.prepare_metadata(ctx, req.metadata.as_ref(), "place_exchange_order")?;
        self.store.get_exchange_pair(ctx, &req.pair_id).await?;
        let order = ExchangeOrder {
            order_id: self.keys.key(&[req.account_id.as_str(), "exchange_order"]),
            account_id: req.account_id,
            pair: req.pair_id,
            amount: req.amount,
            price: req.price,
            order_type: req.order_type,
            status: LifecycleStatus::Pending,
            campaign_id: req.campaign_id,
            metadata,
            ..Default::default()
        };
        let order = self.store.create_exchange_order(ctx, order).await?;
        info!(operation = "place_exchange_order", business_key = %order.order_id, "exchange order placed");
        self.after_write(ctx, events::EXCHANGE_ORDER_PLACED, &order)
            .await;
        Ok(order)
    }
}
