//! Investment accounts, investment orders, and portfolios.

use tracing::info;

use commerce_store::{InvestmentAccount, InvestmentOrder, Portfolio};
use commerce_types::{LifecycleStatus, Page, RequestContext};

use crate::error::ServiceResult;
use crate::events;
use crate::requests::*;
use crate::service::CommerceService;

impl CommerceService {
    pub async fn create_investment_account(
        &self,
        ctx: &RequestContext,
        req: CreateInvestmentAccountRequest,
    ) -> ServiceResult<InvestmentAccount> {
        req.validate()?;
        let metadata =
            self.prepare_metadata(ctx, req.metadata.as_ref(), "create_investment_account")?;
        let account = InvestmentAccount {
            account_id: self.keys.key(&[req.owner_id.as_str(), "investment_account"]),
            owner_id: req.owner_id,
            kind: req.kind,
            currency: req.currency,
            balance: req.balance,
            campaign_id: req.campaign_id,
            metadata,
            ..Default::default()
        };
        let account = self.store.create_investment_account(ctx, account).await?;
        info!(operation = "create_investment_account", business_key = %account.account_id, "investment account created");
        self.after_write(ctx, events::INVESTMENT_ACCOUNT_CREATED, &account)
            .await;
        Ok(account)
    }

    pub async fn get_investment_account(
        &self,
        ctx: &RequestContext,
        req: GetInvestmentAccountRequest,
    ) -> ServiceResult<InvestmentAccount> {
        required("account_id", &req.account_id)?;
        Ok(self
            .store
            .get_investment_account(ctx, &req.account_id)
            .await?)
    }

    pub async fn list_investment_accounts(
        &self,
        ctx: &RequestContext,
        req: ListInvestmentAccountsRequest,
    ) -> ServiceResult<Page<InvestmentAccount>> {
        required("owner_id", &req.owner_id)?;
        Ok(self
            .store
            .list_investment_accounts(ctx, &req.owner_id, req.campaign_id, req.page)
            .await?)
    }

    /// Place an order against an existing investment account.
    pub async fn place_investment_order(
        &self,
        ctx: &RequestContext,
        req: PlaceInvestmentOrderRequest,
    ) -> ServiceResult<InvestmentOrder> {
        req.validate()?;
        let metadata =
            self.prepare_metadata(ctx, req.metadata.as_ref(), "place_investment_order")?;
        self.store
            .get_investment_account(ctx, &req.account_id)
            .await?;
        let order = InvestmentOrder {
            order_id: self.keys.key(&[req.account_id.as_str(), "investment_order"]),
            account_id: req.account_id,
            asset_id: req.asset_id,
            quantity: req.quantity,
            price: req.price,
            order_type: req.order_type,
            status: LifecycleStatus::Pending,
            campaign_id: req.campaign_id,
            metadata,
            ..Default::default()
        };
        let order = self.store.create_investment_order(ctx, order).await?;
        info!(operation = "place_investment_order", business_key = %order.order_id, "investment order placed");
        self.after_write(ctx, events::INVESTMENT_ORDER_PLACED, &order)
            .await;
        Ok(order)
    }

    pub async fn create_portfolio(
        &self,
        ctx: &RequestContext,
        req: CreatePortfolioRequest,
    ) -> ServiceResult<Portfolio> {
        required("account_id", &req.account_id)?;
        let metadata = self.prepare_metadata(ctx, req.metadata.as_ref(), "create_portfolio")?;
        self.store
            .get_investment_account(ctx, &req.account_id)
            .await?;
        let portfolio = Portfolio {
            portfolio_id: self.keys.key(&[req.account_id.as_str(), "portfolio"]),
            account_id: req.account_id,
            campaign_id: req.campaign_id,
            metadata,
            ..Default::default()
        };
        let portfolio = self.store.create_portfolio(ctx, portfolio).await?;
        info!(operation = "create_portfolio", business_key = %portfolio.portfolio_id, "portfolio created");
        self.after_write(ctx, events::PORTFOLIO_CREATED, &portfolio)
            .await;
        Ok(portfolio)
    }

    pub async fn get_portfolio(
        &self,
        ctx: &RequestContext,
        req: GetPortfolioRequest,
    ) -> ServiceResult<Portfolio> {
        required("portfolio_id", &req.portfolio_id)?;
        Ok(self.store.get_portfolio(ctx, &req.portfolio_id).await?)
    }

    pub async fn list_portfolios(
        &self,
        ctx: &RequestContext,
        req: ListPortfoliosRequest,
    ) -> ServiceResult<Page<Portfolio>> {
        required("account_id", &req.account_id)?;
        Ok(self
            .store
            .list_portfolios(ctx, &req.account_id, req.campaign_id, req.page)
            .await?)
    }
}
