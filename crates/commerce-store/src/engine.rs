//! Embedded relational engine backing the record store.
//!
//! One table per record kind plus the shared master table, held behind a
//! single async read-write lock. Write transactions hold the write half for
//! their whole lifetime, so they execute one at a time and every schedule
//! is serial (and therefore serializable). Readers see committed state
//! only.
//!
//! Mutations apply in place and push an undo entry; rollback replays the
//! undo log in reverse. A [`Txn`] dropped without commit rolls back,
//! including while unwinding from a panic.

use std::collections::BTreeMap;
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, error, warn};

use commerce_metadata::{unmarshal, MetadataEnvelope};
use commerce_types::{PageRequest, RequestContext};

use crate::error::{StoreError, StoreResult};
use crate::master::MasterTable;
use crate::records::{
    AssetPosition, Balance, BankAccount, BankStatement, BankTransfer, CommerceEvent,
    ExchangeOrder, ExchangePair, ExchangeRate, InvestmentAccount, InvestmentOrder,
    MarketplaceListing, MarketplaceOffer, MarketplaceOrder, Order, OrderItem, Payment, Portfolio,
    Quote, Transaction,
};

/// A value stored in a [`Table`].
pub trait Row: Clone + Send + Sync + 'static {
    /// Entity name used in errors and logs.
    const NAME: &'static str;

    /// Primary key within the row's table.
    fn key(&self) -> String;
    fn created_at(&self) -> DateTime<Utc>;
    fn stamp_created(&mut self, at: DateTime<Utc>);
    /// Record a modification time. Append-only rows ignore it.
    fn touch(&mut self, _at: DateTime<Utc>) {}
    fn metadata(&self) -> &MetadataEnvelope;
    fn metadata_mut(&mut self) -> &mut MetadataEnvelope;

    fn table(tables: &Tables) -> &Table<Self>;
    fn table_mut(tables: &mut Tables) -> &mut Table<Self>;
}

/// A stored row: the record without its metadata, plus the metadata column
/// as raw JSON bytes.
#[derive(Clone, Debug)]
pub struct Stored<R> {
    pub(crate) seq: u64,
    pub(crate) row: R,
    pub(crate) metadata: Vec<u8>,
}

impl<R: Row> Stored<R> {
    /// Materialize the record. Unreadable metadata decodes as empty.
    pub fn load(&self) -> R {
        let mut row = self.row.clone();
        *row.metadata_mut() = unmarshal(&self.metadata);
        row
    }
}

/// Rows of one kind keyed by primary key.
#[derive(Clone, Debug)]
pub struct Table<R> {
    rows: BTreeMap<String, Stored<R>>,
    next_seq: u64,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_seq: 0,
        }
    }
}

impl<R: Row> Table<R> {
    pub fn get(&self, key: &str) -> Option<&Stored<R>> {
        self.rows.get(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sequence number the next insert will receive.
    pub fn peek_seq(&self) -> u64 {
        self.next_seq + 1
    }

    /// Number of rows matching `filter`.
    pub fn count(&self, filter: &dyn Fn(&R) -> bool) -> u64 {
        self.rows.values().filter(|s| filter(&s.row)).count() as u64
    }

    /// One page of rows matching `filter`, newest-created first.
    pub fn select(&self, filter: &dyn Fn(&R) -> bool, page: PageRequest) -> Vec<R> {
        let mut matching: Vec<&Stored<R>> =
            self.rows.values().filter(|s| filter(&s.row)).collect();
        matching.sort_by(|a, b| {
            b.row
                .created_at()
                .cmp(&a.row.created_at())
                .then(b.seq.cmp(&a.seq))
        });
        matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .map(Stored::load)
            .collect()
    }

    /// Every row matching `filter`, in insertion order.
    pub fn scan(&self, filter: &dyn Fn(&R) -> bool) -> Vec<R> {
        let mut matching: Vec<&Stored<R>> =
            self.rows.values().filter(|s| filter(&s.row)).collect();
        matching.sort_by_key(|s| s.seq);
        matching.into_iter().map(Stored::load).collect()
    }
}

/// Every table in the database.
#[derive(Default)]
pub struct Tables {
    pub(crate) master: MasterTable,
    pub(crate) quotes: Table<Quote>,
    pub(crate) orders: Table<Order>,
    pub(crate) order_items: Table<OrderItem>,
    pub(crate) payments: Table<Payment>,
    pub(crate) transactions: Table<Transaction>,
    pub(crate) balances: Table<Balance>,
    pub(crate) events: Table<CommerceEvent>,
    pub(crate) investment_accounts: Table<InvestmentAccount>,
    pub(crate) investment_orders: Table<InvestmentOrder>,
    pub(crate) portfolios: Table<Portfolio>,
    pub(crate) asset_positions: Table<AssetPosition>,
    pub(crate) bank_accounts: Table<BankAccount>,
    pub(crate) bank_transfers: Table<BankTransfer>,
    pub(crate) bank_statements: Table<BankStatement>,
    pub(crate) marketplace_listings: Table<MarketplaceListing>,
    pub(crate) marketplace_orders: Table<MarketplaceOrder>,
    pub(crate) marketplace_offers: Table<MarketplaceOffer>,
    pub(crate) exchange_orders: Table<ExchangeOrder>,
    pub(crate) exchange_pairs: Table<ExchangePair>,
    pub(crate) exchange_rates: Table<ExchangeRate>,
}

impl Tables {
    pub fn master(&self) -> &MasterTable {
        &self.master
    }

    pub fn of<R: Row>(&self) -> &Table<R> {
        R::table(self)
    }
}

type Undo = Box<dyn FnOnce(&mut Tables) + Send>;

/// Shared handle to the database. Cheap to clone.
#[derive(Clone, Default)]
pub struct Database {
    tables: Arc<RwLock<Tables>>,
    #[cfg(test)]
    faults: Arc<faults::FaultPlan>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a write transaction.
    ///
    /// Waits for any running write transaction to finish. Fails with
    /// [`StoreError::Cancelled`] if the request is cancelled before or while
    /// waiting.
    pub async fn begin(&self, ctx: &RequestContext) -> StoreResult<Txn> {
        ensure_live(ctx)?;
        let guard = Arc::clone(&self.tables).write_owned().await;
        let tx = Txn {
            guard,
            undo: Vec::new(),
            ctx: ctx.clone(),
            statements: 0,
            finished: false,
            #[cfg(test)]
            faults: Arc::clone(&self.faults),
        };
        ensure_live(ctx)?;
        Ok(tx)
    }

    /// Read-only view of committed state.
    pub async fn snapshot(&self) -> Snapshot {
        Snapshot {
            guard: Arc::clone(&self.tables).read_owned().await,
        }
    }

    /// Run `body` in a write transaction.
    ///
    /// Commits when `body` returns `Ok`, rolls back when it returns `Err`.
    /// A panic inside `body` rolls the transaction back and then resumes
    /// unwinding, so the panic still reaches the caller.
    pub async fn transaction<T, F>(&self, ctx: &RequestContext, body: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Txn) -> StoreResult<T> + Send,
        T: Send,
    {
        let mut tx = self.begin(ctx).await?;
        match panic::catch_unwind(AssertUnwindSafe(|| body(&mut tx))) {
            Ok(Ok(value)) => {
                tx.commit()?;
                Ok(value)
            }
            Ok(Err(e)) => {
                debug!(error = %e, statements = tx.statements, "transaction rolled back");
                tx.rollback();
                Err(e)
            }
            Err(payload) => {
                error!(statements = tx.statements, "panic inside transaction, rolling back");
                tx.rollback();
                panic::resume_unwind(payload)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn inject_fault(&self, table: &'static str) {
        self.faults.arm(table);
    }
}

/// Committed state pinned for the duration of a read.
pub struct Snapshot {
    guard: OwnedRwLockReadGuard<Tables>,
}

impl Deref for Snapshot {
    type Target = Tables;

    fn deref(&self) -> &Tables {
        &self.guard
    }
}

/// An open write transaction.
pub struct Txn {
    guard: OwnedRwLockWriteGuard<Tables>,
    undo: Vec<Undo>,
    ctx: RequestContext,
    statements: usize,
    finished: bool,
    #[cfg(test)]
    faults: Arc<faults::FaultPlan>,
}

impl Txn {
    pub fn tables(&self) -> &Tables {
        &self.guard
    }

    pub(crate) fn tables_mut(&mut self) -> &mut Tables {
        &mut self.guard
    }

    pub(crate) fn push_undo(&mut self, undo: impl FnOnce(&mut Tables) + Send + 'static) {
        self.undo.push(Box::new(undo));
    }

    /// Gate every statement: observe cancellation, count, and (under test)
    /// fire armed faults.
    pub(crate) fn statement(&mut self, table: &'static str) -> StoreResult<()> {
        ensure_live(&self.ctx)?;
        self.statements += 1;
        #[cfg(test)]
        if self.faults.fire(table) {
            return Err(StoreError::Internal(format!("injected fault on {table}")));
        }
        #[cfg(not(test))]
        let _ = table;
        Ok(())
    }

    /// Insert a row whose metadata column has already been encoded.
    ///
    /// Fails with [`StoreError::DuplicateKey`] when the key exists.
    pub fn insert<R: Row>(&mut self, mut row: R, metadata: Vec<u8>) -> StoreResult<u64> {
        self.statement(R::NAME)?;
        let key = row.key();
        *row.metadata_mut() = MetadataEnvelope::default();

        let table = R::table_mut(&mut self.guard);
        if table.rows.contains_key(&key) {
            return Err(StoreError::DuplicateKey {
                table: R::NAME,
                key,
            });
        }
        table.next_seq += 1;
        let seq = table.next_seq;
        table.rows.insert(
            key.clone(),
            Stored {
                seq,
                row,
                metadata,
            },
        );
        self.push_undo(move |t| {
            R::table_mut(t).rows.remove(&key);
        });
        Ok(seq)
    }

    /// Apply `apply` to the row with `key`. Returns the number of rows
    /// affected (0 or 1).
    pub fn update<R: Row>(&mut self, key: &str, apply: impl FnOnce(&mut R)) -> StoreResult<u64> {
        self.statement(R::NAME)?;
        let Some(stored) = R::table_mut(&mut self.guard).rows.get_mut(key) else {
            return Ok(0);
        };
        let before = stored.row.clone();
        apply(&mut stored.row);
        let key = key.to_string();
        self.push_undo(move |t| {
            if let Some(stored) = R::table_mut(t).rows.get_mut(&key) {
                stored.row = before;
            }
        });
        Ok(1)
    }

    /// Replace the metadata column of the row with `key`.
    pub fn replace_metadata<R: Row>(&mut self, key: &str, metadata: Vec<u8>) -> StoreResult<u64> {
        self.statement(R::NAME)?;
        let Some(stored) = R::table_mut(&mut self.guard).rows.get_mut(key) else {
            return Ok(0);
        };
        let before = std::mem::replace(&mut stored.metadata, metadata);
        let key = key.to_string();
        self.push_undo(move |t| {
            if let Some(stored) = R::table_mut(t).rows.get_mut(&key) {
                stored.metadata = before;
            }
        });
        Ok(1)
    }

    /// Make every change visible. Fails, rolling back, if the request was
    /// cancelled.
    pub fn commit(mut self) -> StoreResult<()> {
        if let Err(e) = ensure_live(&self.ctx) {
            self.revert();
            return Err(e);
        }
        self.undo.clear();
        self.finished = true;
        Ok(())
    }

    pub fn rollback(mut self) {
        self.revert();
    }

    fn revert(&mut self) {
        while let Some(undo) = self.undo.pop() {
            undo(&mut *self.guard);
        }
        self.finished = true;
    }
}

impl Drop for Txn {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if std::thread::panicking() {
            warn!(statements = self.statements, "rolling back transaction during unwind");
        } else {
            debug!(statements = self.statements, "rolling back uncommitted transaction");
        }
        self.revert();
    }
}

pub(crate) fn ensure_live(ctx: &RequestContext) -> StoreResult<()> {
    if ctx.is_cancelled() {
        Err(StoreError::Cancelled)
    } else {
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Quote;

    fn quote(id: &str) -> Quote {
        Quote {
            quote_id: id.into(),
            user_id: "u1".into(),
            ..Default::default()
        }
    }

    // -----------------------------------------------------------------------
    // Commit / rollback
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn commit_makes_rows_visible() {
        let db = Database::new();
        let ctx = RequestContext::new();
        let mut tx = db.begin(&ctx).await.unwrap();
        tx.insert(quote("q1"), b"{}".to_vec()).unwrap();
        tx.commit().unwrap();

        let snap = db.snapshot().await;
        assert_eq!(snap.of::<Quote>().len(), 1);
    }

    #[tokio::test]
    async fn explicit_rollback_discards_rows() {
        let db = Database::new();
        let ctx = RequestContext::new();
        let mut tx = db.begin(&ctx).await.unwrap();
        tx.insert(quote("q1"), b"{}".to_vec()).unwrap();
        tx.rollback();

        assert!(db.snapshot().await.of::<Quote>().is_empty());
    }

    #[tokio::test]
    async fn drop_without_commit_rolls_back() {
        let db = Database::new();
        let ctx = RequestContext::new();
        {
            let mut tx = db.begin(&ctx).await.unwrap();
            tx.insert(quote("q1"), b"{}".to_vec()).unwrap();
        }
        assert!(db.snapshot().await.of::<Quote>().is_empty());
    }

    #[tokio::test]
    async fn rollback_restores_updated_rows() {
        let db = Database::new();
        let ctx = RequestContext::new();
        db.transaction(&ctx, |tx| tx.insert(quote("q1"), b"{}".to_vec()))
            .await
            .unwrap();

        let result: StoreResult<()> = db
            .transaction(&ctx, |tx| {
                tx.update::<Quote>("q1", |q| q.amount = 99.0)?;
                Err(StoreError::Internal("boom".into()))
            })
            .await;
        assert!(result.is_err());

        let snap = db.snapshot().await;
        assert_eq!(snap.of::<Quote>().get("q1").unwrap().load().amount, 0.0);
    }

    #[tokio::test]
    async fn duplicate_key_rejected() {
        let db = Database::new();
        let ctx = RequestContext::new();
        let mut tx = db.begin(&ctx).await.unwrap();
        tx.insert(quote("q1"), vec![]).unwrap();
        let err = tx.insert(quote("q1"), vec![]).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { table: "quote", .. }));
    }

    #[tokio::test]
    async fn update_missing_row_affects_nothing() {
        let db = Database::new();
        let ctx = RequestContext::new();
        let mut tx = db.begin(&ctx).await.unwrap();
        assert_eq!(tx.update::<Quote>("nope", |q| q.amount = 1.0).unwrap(), 0);
    }

    // -----------------------------------------------------------------------
    // Cancellation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn cancelled_context_cannot_begin() {
        let db = Database::new();
        let ctx = RequestContext::new();
        ctx.cancel();
        assert!(matches!(db.begin(&ctx).await, Err(StoreError::Cancelled)));
    }

    #[tokio::test]
    async fn cancellation_mid_transaction_aborts_commit() {
        let db = Database::new();
        let ctx = RequestContext::new();
        let mut tx = db.begin(&ctx).await.unwrap();
        tx.insert(quote("q1"), vec![]).unwrap();
        ctx.cancel();
        assert!(matches!(tx.insert(quote("q2"), vec![]), Err(StoreError::Cancelled)));
        assert!(matches!(tx.commit(), Err(StoreError::Cancelled)));
        assert!(db.snapshot().await.of::<Quote>().is_empty());
    }

    // -----------------------------------------------------------------------
    // Panics
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn panic_rolls_back_and_propagates() {
        let db = Database::new();
        let inner = db.clone();
        let handle = tokio::spawn(async move {
            let ctx = RequestContext::new();
            let _: StoreResult<()> = inner
                .transaction(&ctx, |tx| {
                    tx.insert(quote("q1"), vec![]).unwrap();
                    panic!("handler bug");
                })
                .await;
        });
        let err = handle.await.unwrap_err();
        assert!(err.is_panic());
        assert!(db.snapshot().await.of::<Quote>().is_empty());
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn select_orders_newest_first_and_pages() {
        let db = Database::new();
        let ctx = RequestContext::new();
        let base = Utc::now();
        db.transaction(&ctx, |tx| {
            for i in 0..5 {
                let mut q = quote(&format!("q{i}"));
                q.stamp_created(base + chrono::Duration::seconds(i));
                tx.insert(q, vec![])?;
            }
            Ok(())
        })
        .await
        .unwrap();

        let snap = db.snapshot().await;
        let table = snap.of::<Quote>();
        let all = |_: &Quote| true;
        let first = table.select(&all, PageRequest::new(1, 2));
        assert_eq!(
            first.iter().map(|q| q.quote_id.as_str()).collect::<Vec<_>>(),
            vec!["q4", "q3"]
        );
        let last = table.select(&all, PageRequest::new(3, 2));
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].quote_id, "q0");
        assert_eq!(table.count(&all), 5);
    }

    #[tokio::test]
    async fn load_tolerates_corrupt_metadata() {
        let db = Database::new();
        let ctx = RequestContext::new();
        db.transaction(&ctx, |tx| tx.insert(quote("q1"), b"{\"audit\":".to_vec()))
            .await
            .unwrap();
        let loaded = db.snapshot().await.of::<Quote>().get("q1").unwrap().load();
        assert!(loaded.metadata.is_empty());
    }
}
