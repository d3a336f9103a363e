//! Marketplace listings, orders, and offers.

use tracing::info;

use commerce_store::{MarketplaceListing, MarketplaceOffer, MarketplaceOrder};
use commerce_types::{CampaignId, LifecycleStatus, RequestContext};

use crate::error::{ServiceError, ServiceResult};
use crate::events;
use crate::requests::*;
use crate::service::CommerceService;

impl CommerceService {
    /// New listings are immediately `ACTIVE`.
    pub async fn create_marketplace_listing(
        &self,
        ctx: &RequestContext,
        req: CreateMarketplaceListingRequest,
    ) -> ServiceResult<MarketplaceListing> {
        req.validate()?;
        let metadata =
            self.prepare_metadata(ctx, req.metadata.as_ref(), "create_marketplace_listing")?;
        let listing = MarketplaceListing {
            listing_id: self.keys.key(&[req.seller_id.as_str(), "listing"]),
            seller_id: req.seller_id,
            product_id: req.product_id,
            price: req.price,
            currency: req.currency,
            status: LifecycleStatus::Active,
            campaign_id: req.campaign_id,
            metadata,
            ..Default::default()
        };
        let listing = self.store.create_marketplace_listing(ctx, listing).await?;
        info!(operation = "create_marketplace_listing", business_key = %listing.listing_id, "listing created");
        self.after_write(ctx, events::MARKETPLACE_LISTING_CREATED, &listing)
            .await;
        Ok(listing)
    }

    /// The listing must be `ACTIVE` and belong to the caller's campaign.
    async fn active_listing(
        &self,
        ctx: &RequestContext,
        listing_id: &str,
        campaign_id: CampaignId,
    ) -> ServiceResult<MarketplaceListing> {
        let listing = self.store.get_marketplace_listing(ctx, listing_id).await?;
        if listing.status != LifecycleStatus::Active {
            return Err(ServiceError::invalid(format!(
                "listing {listing_id} is {}",
                listing.status
            )));
        }
        if listing.campaign_id != campaign_id {
            return Err(ServiceError::invalid(format!(
                "listing {listing_id} belongs to campaign {}, not {campaign_id}",
                listing.campaign_id
            )));
        }
        Ok(listing)
    }

    /// Buy an active listing at its listed price.
    pub async fn place_marketplace_order(
        &self,
        ctx: &RequestContext,
        req: PlaceMarketplaceOrderRequest,
    ) -> ServiceResult<MarketplaceOrder> {
        req.validate()?;
        let metadata =
            self.prepare_metadata(ctx, req.metadata.as_ref(), "place_marketplace_order")?;
        let listing = self.active_listing(ctx, &req.listing_id, req.campaign_id).await?;
        if listing.seller_id == req.buyer_id {
            return Err(ServiceError::invalid("seller cannot buy their own listing"));
        }
        let order = MarketplaceOrder {
            order_id: self.keys.key(&[req.listing_id.as_str(), "order"]),
            listing_id: req.listing_id,
            buyer_id: req.buyer_id,
            price: listing.price,
            currency: listing.currency,
            status: LifecycleStatus::Pending,
            campaign_id: req.campaign_id,
            metadata,
            ..Default::default()
        };
        let order = self.store.create_marketplace_order(ctx, order).await?;
        info!(operation = "place_marketplace_order", business_key = %order.order_id, "marketplace order placed");
        self.after_write(ctx, events::MARKETPLACE_ORDER_PLACED, &order)
            .await;
        Ok(order)
    }

    pub async fn make_marketplace_offer(
        &self,
        ctx: &RequestContext,
        req: MakeMarketplaceOfferRequest,
    ) -> ServiceResult<MarketplaceOffer> {
        req.validate()?;
        let metadata =
            self.prepare_metadata(ctx, req.metadata.as_ref(), "make_marketplace_offer")?;
        let listing = self.active_listing(ctx, &req.listing_id, req.campaign_id).await?;
        let offer = MarketplaceOffer {
            offer_id: self.keys.key(&[req.listing_id.as_str(), "offer"]),
            listing_id: req.listing_id,
            buyer_id: req.buyer_id,
            offer_price: req.offer_price,
            currency: listing.currency,
            status: LifecycleStatus::Pending,
            campaign_id: req.campaign_id,
            metadata,
            ..Default::default()
        };
        let offer = self.store.create_marketplace_offer(ctx, offer).await?;
        info!(operation = "make_marketplace_offer", business_key = %offer.offer_id, "marketplace offer made");
        self.after_write(ctx, events::MARKETPLACE_OFFER_MADE, &offer)
            .await;
        Ok(offer)
    }
}
