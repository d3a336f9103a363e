//! Notification types published after successful writes.

pub const QUOTE_CREATED: &str = "commerce.quote_created";
pub const QUOTE_STATUS_UPDATED: &str = "commerce.quote_status_updated";
pub const ORDER_CREATED: &str = "commerce.order_created";
pub const ORDER_STATUS_UPDATED: &str = "commerce.order_status_updated";
pub const PAYMENT_INITIATED: &str = "commerce.payment_initiated";
pub const PAYMENT_CONFIRMED: &str = "commerce.payment_confirmed";
pub const PAYMENT_REFUNDED: &str = "commerce.payment_refunded";
pub const TRANSACTION_RECORDED: &str = "commerce.transaction_recorded";
pub const BALANCE_UPDATED: &str = "commerce.balance_updated";
pub const INVESTMENT_ACCOUNT_CREATED: &str = "commerce.investment_account_created";
pub const INVESTMENT_ORDER_PLACED: &str = "commerce.investment_order_placed";
pub const PORTFOLIO_CREATED: &str = "commerce.portfolio_created";
pub const BANK_ACCOUNT_OPENED: &str = "commerce.bank_account_opened";
pub const BANK_TRANSFER_INITIATED: &str = "commerce.bank_transfer_initiated";
pub const MARKETPLACE_LISTING_CREATED: &str = "commerce.marketplace_listing_created";
pub const MARKETPLACE_ORDER_PLACED: &str = "commerce.marketplace_order_placed";
pub const MARKETPLACE_OFFER_MADE: &str = "commerce.marketplace_offer_made";
pub const EXCHANGE_PAIR_CREATED: &str = "commerce.exchange_pair_created";
pub const EXCHANGE_RATE_CREATED: &str = "commerce.exchange_rate_created";
pub const EXCHANGE_ORDER_PLACED: &str = "commerce.exchange_order_placed";
