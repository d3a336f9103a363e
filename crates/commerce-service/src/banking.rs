//! Bank accounts and transfers.

use tracing::info;

use commerce_store::{BankAccount, BankTransfer};
use commerce_types::{LifecycleStatus, RequestContext};

use crate::error::{ServiceError, ServiceResult};
use crate::events;
use crate::requests::*;
use crate::service::CommerceService;

impl CommerceService {
    pub async fn open_bank_account(
        &self,
        ctx: &RequestContext,
        req: OpenBankAccountRequest,
    ) -> ServiceResult<BankAccount> {
        req.validate()?;
        let metadata = self.prepare_metadata(ctx, req.metadata.as_ref(), "open_bank_account")?;
        let account = BankAccount {
            account_id: self.keys.key(&[req.user_id.as_str(), "bank_account"]),
            user_id: req.user_id,
            iban: req.iban,
            bic: req.bic,
            currency: req.currency,
            balance: 0.0,
            campaign_id: req.campaign_id,
            metadata,
            ..Default::default()
        };
        let account = self.store.create_bank_account(ctx, account).await?;
        info!(operation = "open_bank_account", business_key = %account.account_id, "bank account opened");
        self.after_write(ctx, events::BANK_ACCOUNT_OPENED, &account)
            .await;
        Ok(account)
    }

    /// Start a transfer out of an existing account. The transfer currency
    /// must match the source account.
    pub async fn initiate_bank_transfer(
        &self,
        ctx: &RequestContext,
        req: InitiateBankTransferRequest,
    ) -> ServiceResult<BankTransfer> {
        req.validate()?;
        let metadata =
            self.prepare_metadata(ctx, req.metadata.as_ref(), "initiate_bank_transfer")?;
        let source = self.store.get_bank_account(ctx, &req.from_account_id).await?;
        if source.currency != req.currency {
            return Err(ServiceError::invalid(format!(
                "transfer currency {} does not match account currency {}",
                req.currency, source.currency
            )));
        }
        let transfer = BankTransfer {
            transfer_id: self.keys.key(&[req.from_account_id.as_str(), "transfer"]),
            from_account_id: req.from_account_id,
            to_account_id: req.to_account_id,
            amount: req.amount,
            currency: req.currency,
            status: LifecycleStatus::Pending,
            campaign_id: req.campaign_id,
            metadata,
            ..Default::default()
        };
        let transfer = self.store.create_bank_transfer(ctx, transfer).await?;
        info!(operation = "initiate_bank_transfer", business_key = %transfer.transfer_id, "bank transfer initiated");
        self.after_write(ctx, events::BANK_TRANSFER_INITIATED, &transfer)
            .await;
        Ok(transfer)
    }
}

#[cfg(test)]
mod tests {
    use commerce_store::CommerceStore;
    use commerce_types::{CampaignId, PageRequest};

    use super::*;
    use crate::testing::harness;

    async fn open(h: &crate::testing::Harness, ctx: &RequestContext, user: &str) -> BankAccount {
        h.service
            .open_bank_account(
                ctx,
                OpenBankAccountRequest {
                    user_id: user.into(),
                    iban: format!("DE00{user}"),
                    bic: "DEUTDEFF".into(),
                    currency: "EUR".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn transfer_between_accounts() {
        let h = harness();
        let ctx = RequestContext::new();
        let a = open(&h, &ctx, "u1").await;
        let b = open(&h, &ctx, "u2").await;
        assert_eq!(a.balance, 0.0);

        let transfer = h
            .service
            .initiate_bank_transfer(
                &ctx,
                InitiateBankTransferRequest {
                    from_account_id: a.account_id.clone(),
                    to_account_id: b.account_id.clone(),
                    amount: 25.0,
                    currency: "EUR".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(transfer.status, LifecycleStatus::Pending);

        let incoming = h
            .store
            .list_bank_transfers(&ctx, &b.account_id, CampaignId::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(incoming.total, 1);
    }

    #[tokio::test]
    async fn transfer_currency_must_match_source() {
        let h = harness();
        let ctx = RequestContext::new();
        let a = open(&h, &ctx, "u1").await;
        let err = h
            .service
            .initiate_bank_transfer(
                &ctx,
                InitiateBankTransferRequest {
                    from_account_id: a.account_id,
                    to_account_id: "elsewhere".into(),
                    amount: 25.0,
                    currency: "USD".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
