//! Transactional record store for the commerce core.
//!
//! Every domain record is registered in a master entity index in the same
//! transaction that inserts it. [`InMemoryCommerceStore`] implements the
//! [`CommerceStore`] contract over an embedded serializable engine
//! ([`Database`]); the service layer depends only on the trait.

pub mod engine;
pub mod error;
pub mod master;
pub mod memory;
pub mod records;
pub mod traits;

pub use engine::{Database, Row, Snapshot, Stored, Table, Tables, Txn};
pub use error::{ErrorKind, StoreError, StoreResult};
pub use master::MasterEntity;
pub use memory::InMemoryCommerceStore;
pub use records::{
    AssetPosition, Balance, BankAccount, BankStatement, BankTransfer, CommerceEvent,
    ExchangeOrder, ExchangePair, ExchangeRate, InvestmentAccount, InvestmentOrder,
    MarketplaceListing, MarketplaceOffer, MarketplaceOrder, Order, OrderItem, Payment, Portfolio,
    Quote, Record, Transaction,
};
pub use traits::CommerceStore;
