//! Order checkout and stock reservation.
//!
//! [`CheckoutProcessor`] turns a list of requested (product, quantity) pairs
//! into a committed [`Order`]: it opens one scoped transaction, writes the
//! order header, then for each item reads the product's stock under a row
//! lock, writes a line item, and decrements the stock. The whole aggregate
//! commits or none of it does: dropping the transaction on any early return
//! rolls every write back.
//!
//! The storage side is injected through the [`CheckoutStore`]/[`CheckoutTx`]
//! traits rather than reached through ambient database state, so the
//! processor can be exercised against an in-memory store in tests. The
//! production implementation is [`crate::db::orders::PgCheckoutStore`].

use rust_decimal::Decimal;
use thiserror::Error;

use bazaar_core::{AddressId, ProductId, UserId};

use crate::db::RepositoryError;
use crate::models::order::{LineItem, Order, OrderHeader};

/// One requested (product, quantity) pair, in cart order.
#[derive(Debug, Clone, Copy)]
pub struct RequestedItem {
    pub product_id: ProductId,
    pub qty: i32,
}

/// Priced stock snapshot for one product row, read under lock.
#[derive(Debug, Clone, Copy)]
pub struct StockLine {
    pub unit_price: Decimal,
    pub stock: i32,
}

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request is malformed: empty item list, non-positive quantity, or
    /// a product reference that doesn't resolve. Nothing was written.
    #[error("invalid checkout request: {0}")]
    InvalidRequest(String),

    /// A requested quantity exceeds the product's available stock. The
    /// transaction was rolled back; no order, line items, or stock changes
    /// are visible. Names the first under-stocked item in request order.
    #[error("insufficient stock for product {0}")]
    OutOfStock(ProductId),

    /// The underlying store failed to commit (or errored mid-transaction).
    #[error("order could not be committed")]
    Persistence(#[from] RepositoryError),
}

/// One in-flight checkout transaction.
///
/// Implementations must roll back every staged write when the value is
/// dropped without [`commit`](Self::commit) being called.
#[allow(async_fn_in_trait)]
pub trait CheckoutTx: Send {
    /// Write the order header and return it with its generated identifiers.
    async fn insert_order(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
        total: Decimal,
        tax: Decimal,
    ) -> Result<OrderHeader, RepositoryError>;

    /// Read a product's unit price and available stock, taking a row lock
    /// that is held until the transaction ends. Returns `None` for unknown
    /// products.
    ///
    /// The lock is what makes check-and-decrement atomic per product row:
    /// a concurrent checkout touching the same product blocks here until
    /// this transaction commits or rolls back.
    async fn lock_stock(
        &mut self,
        product_id: ProductId,
    ) -> Result<Option<StockLine>, RepositoryError>;

    /// Stage one line item for the order.
    async fn insert_line_item(
        &mut self,
        order_id: bazaar_core::OrderId,
        product_id: ProductId,
        qty: i32,
        line_total: Decimal,
    ) -> Result<(), RepositoryError>;

    /// Decrement the product's stock by `qty`.
    ///
    /// Returns `RepositoryError::Conflict` if the decrement would drive the
    /// stock negative.
    async fn decrement_stock(&mut self, product_id: ProductId, qty: i32)
    -> Result<(), RepositoryError>;

    /// Make every staged write durable. Consumes the transaction.
    async fn commit(self) -> Result<(), RepositoryError>;
}

/// Factory for checkout transactions.
#[allow(async_fn_in_trait)]
pub trait CheckoutStore: Send + Sync {
    type Tx: CheckoutTx;

    /// Open a new transaction.
    async fn begin(&self) -> Result<Self::Tx, RepositoryError>;
}

/// The checkout processor.
///
/// Stateless apart from its store handle; safe to share across requests.
pub struct CheckoutProcessor<S> {
    store: S,
}

impl<S: CheckoutStore> CheckoutProcessor<S> {
    /// Create a new processor over the given store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Create an order for `user_id`, shipped to `address_id`, reserving
    /// stock for every requested item.
    ///
    /// Items are processed in request order; the first under-stocked item
    /// encountered is the one named in the `OutOfStock` error. Line totals
    /// are computed from the catalog's unit price at the moment of the
    /// locked read, not from anything the client sent.
    ///
    /// The caller must have verified that `address_id` belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::InvalidRequest`] for an empty item list, a
    ///   non-positive quantity (both checked before any transaction is
    ///   opened), or an unknown product reference.
    /// - [`CheckoutError::OutOfStock`] when a requested quantity exceeds the
    ///   available stock at commit time.
    /// - [`CheckoutError::Persistence`] when the store errors or fails to
    ///   commit.
    ///
    /// On any error the store is left exactly as it was before the call.
    pub async fn checkout(
        &self,
        user_id: UserId,
        address_id: AddressId,
        total: Decimal,
        tax: Decimal,
        requested_items: &[RequestedItem],
    ) -> Result<Order, CheckoutError> {
        // Fail fast, before opening a transaction.
        if requested_items.is_empty() {
            return Err(CheckoutError::InvalidRequest(
                "order contains no items".to_owned(),
            ));
        }
        if let Some(item) = requested_items.iter().find(|item| item.qty <= 0) {
            return Err(CheckoutError::InvalidRequest(format!(
                "quantity for product {} must be a positive integer",
                item.product_id
            )));
        }

        // Every early return below drops `tx`, which rolls back the header,
        // any line items, and any stock decrements staged so far.
        let mut tx = self.store.begin().await?;

        let header = tx.insert_order(user_id, address_id, total, tax).await?;

        let mut items = Vec::with_capacity(requested_items.len());
        for item in requested_items {
            let Some(line) = tx.lock_stock(item.product_id).await? else {
                return Err(CheckoutError::InvalidRequest(format!(
                    "unknown product {}",
                    item.product_id
                )));
            };

            if line.stock - item.qty < 0 {
                return Err(CheckoutError::OutOfStock(item.product_id));
            }

            let line_total = line.unit_price * Decimal::from(item.qty);
            tx.insert_line_item(header.id, item.product_id, item.qty, line_total)
                .await?;
            tx.decrement_stock(item.product_id, item.qty).await?;

            items.push(LineItem {
                product_id: item.product_id,
                qty: item.qty,
                line_item_total: line_total,
            });
        }

        tx.commit().await?;

        Ok(Order { header, items })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use chrono::Utc;
    use tokio::sync::{Mutex, OwnedMutexGuard};
    use uuid::Uuid;

    use bazaar_core::OrderId;

    use super::*;

    // =========================================================================
    // In-memory store
    // =========================================================================

    #[derive(Default)]
    struct MemState {
        /// product id -> (unit price, stock)
        products: HashMap<i32, (Decimal, i32)>,
        /// committed orders
        orders: Vec<(OrderHeader, Vec<LineItem>)>,
        next_order_id: i32,
        fail_commit: bool,
    }

    /// In-memory `CheckoutStore`. A transaction holds the store-wide lock
    /// for its whole lifetime, standing in for the per-row locks the SQL
    /// store takes: concurrent checkouts serialize at `begin`. Writes are
    /// staged on the transaction and applied only at commit.
    #[derive(Clone)]
    struct MemStore {
        state: Arc<Mutex<MemState>>,
    }

    impl MemStore {
        fn with_products(products: &[(i32, Decimal, i32)]) -> Self {
            let mut map = HashMap::new();
            for &(id, price, stock) in products {
                map.insert(id, (price, stock));
            }
            Self {
                state: Arc::new(Mutex::new(MemState {
                    products: map,
                    ..MemState::default()
                })),
            }
        }

        async fn stock_of(&self, product_id: i32) -> i32 {
            self.state.lock().await.products[&product_id].1
        }

        async fn order_count(&self) -> usize {
            self.state.lock().await.orders.len()
        }

        async fn set_fail_commit(&self, fail: bool) {
            self.state.lock().await.fail_commit = fail;
        }
    }

    struct MemTx {
        guard: OwnedMutexGuard<MemState>,
        header: Option<OrderHeader>,
        staged_items: Vec<LineItem>,
        staged_decrements: Vec<(i32, i32)>,
    }

    impl MemTx {
        /// Stock as this transaction sees it: committed value minus what
        /// this transaction has already staged.
        fn effective_stock(&self, product_id: i32) -> Option<(Decimal, i32)> {
            let &(price, stock) = self.guard.products.get(&product_id)?;
            let staged: i32 = self
                .staged_decrements
                .iter()
                .filter(|&&(id, _)| id == product_id)
                .map(|&(_, qty)| qty)
                .sum();
            Some((price, stock - staged))
        }
    }

    impl CheckoutTx for MemTx {
        async fn insert_order(
            &mut self,
            user_id: UserId,
            address_id: AddressId,
            total: Decimal,
            tax: Decimal,
        ) -> Result<OrderHeader, RepositoryError> {
            self.guard.next_order_id += 1;
            let header = OrderHeader {
                id: OrderId::new(self.guard.next_order_id),
                uuid: Uuid::new_v4(),
                user_id,
                address_id,
                total,
                tax,
                created_at: Utc::now(),
            };
            self.header = Some(header.clone());
            Ok(header)
        }

        async fn lock_stock(
            &mut self,
            product_id: ProductId,
        ) -> Result<Option<StockLine>, RepositoryError> {
            Ok(self
                .effective_stock(product_id.as_i32())
                .map(|(unit_price, stock)| StockLine { unit_price, stock }))
        }

        async fn insert_line_item(
            &mut self,
            _order_id: OrderId,
            product_id: ProductId,
            qty: i32,
            line_total: Decimal,
        ) -> Result<(), RepositoryError> {
            self.staged_items.push(LineItem {
                product_id,
                qty,
                line_item_total: line_total,
            });
            Ok(())
        }

        async fn decrement_stock(
            &mut self,
            product_id: ProductId,
            qty: i32,
        ) -> Result<(), RepositoryError> {
            // Mirrors the SQL guard `stock >= qty`.
            match self.effective_stock(product_id.as_i32()) {
                Some((_, stock)) if stock >= qty => {
                    self.staged_decrements.push((product_id.as_i32(), qty));
                    Ok(())
                }
                Some(_) => Err(RepositoryError::Conflict(format!(
                    "stock underflow for product {product_id}"
                ))),
                None => Err(RepositoryError::NotFound),
            }
        }

        async fn commit(mut self) -> Result<(), RepositoryError> {
            if self.guard.fail_commit {
                return Err(RepositoryError::Database(sqlx::Error::PoolClosed));
            }
            for (product_id, qty) in self.staged_decrements.drain(..) {
                if let Some(entry) = self.guard.products.get_mut(&product_id) {
                    entry.1 -= qty;
                }
            }
            if let Some(header) = self.header.take() {
                let items = std::mem::take(&mut self.staged_items);
                self.guard.orders.push((header, items));
            }
            Ok(())
        }
    }

    impl CheckoutStore for MemStore {
        type Tx = MemTx;

        async fn begin(&self) -> Result<MemTx, RepositoryError> {
            Ok(MemTx {
                guard: Arc::clone(&self.state).lock_owned().await,
                header: None,
                staged_items: Vec::new(),
                staged_decrements: Vec::new(),
            })
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    const USER: UserId = UserId::new(1);
    const ADDRESS: AddressId = AddressId::new(1);

    fn item(product_id: i32, qty: i32) -> RequestedItem {
        RequestedItem {
            product_id: ProductId::new(product_id),
            qty,
        }
    }

    fn price(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    async fn run_checkout(
        store: &MemStore,
        items: &[RequestedItem],
    ) -> Result<Order, CheckoutError> {
        let processor = CheckoutProcessor::new(store.clone());
        processor
            .checkout(USER, ADDRESS, price(10_000), price(500), items)
            .await
    }

    // =========================================================================
    // Tests
    // =========================================================================

    #[tokio::test]
    async fn test_checkout_success_decrements_stock_and_persists_order() {
        // stock = {A: 5, B: 2}; request [(A, 3), (B, 2)]
        let store = MemStore::with_products(&[(1, price(1000), 5), (2, price(450), 2)]);

        let order = run_checkout(&store, &[item(1, 3), item(2, 2)])
            .await
            .unwrap();

        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].line_item_total, price(3000));
        assert_eq!(order.items[1].line_item_total, price(900));
        assert_eq!(order.header.total, price(10_000));
        assert_eq!(order.header.tax, price(500));

        assert_eq!(store.stock_of(1).await, 2);
        assert_eq!(store.stock_of(2).await, 0);
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_checkout_out_of_stock_leaves_store_untouched() {
        // stock = {A: 5, B: 2}; request [(A, 3), (B, 5)]
        let store = MemStore::with_products(&[(1, price(1000), 5), (2, price(450), 2)]);

        let err = run_checkout(&store, &[item(1, 3), item(2, 5)])
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::OutOfStock(p) if p == ProductId::new(2)));
        assert_eq!(store.stock_of(1).await, 5);
        assert_eq!(store.stock_of(2).await, 2);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_checkout_reports_first_under_stocked_item() {
        let store = MemStore::with_products(&[(1, price(1000), 1), (2, price(450), 1)]);

        let err = run_checkout(&store, &[item(1, 100), item(2, 100)])
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::OutOfStock(p) if p == ProductId::new(1)));
    }

    #[tokio::test]
    async fn test_checkout_failure_is_idempotent() {
        let store = MemStore::with_products(&[(1, price(1000), 5)]);

        for _ in 0..2 {
            let err = run_checkout(&store, &[item(1, 6)]).await.unwrap_err();
            assert!(matches!(err, CheckoutError::OutOfStock(p) if p == ProductId::new(1)));
            assert_eq!(store.stock_of(1).await, 5);
        }
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_checkout_quantity_equal_to_stock_drains_it() {
        let store = MemStore::with_products(&[(1, price(1000), 5)]);

        let order = run_checkout(&store, &[item(1, 5)]).await.unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(store.stock_of(1).await, 0);
    }

    #[tokio::test]
    async fn test_checkout_empty_item_list_rejected_before_transaction() {
        let store = MemStore::with_products(&[(1, price(1000), 5)]);

        let err = run_checkout(&store, &[]).await.unwrap_err();

        assert!(matches!(err, CheckoutError::InvalidRequest(_)));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_checkout_non_positive_quantity_rejected() {
        let store = MemStore::with_products(&[(1, price(1000), 5)]);

        for qty in [0, -3] {
            let err = run_checkout(&store, &[item(1, qty)]).await.unwrap_err();
            assert!(matches!(err, CheckoutError::InvalidRequest(_)));
        }
        assert_eq!(store.stock_of(1).await, 5);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_checkout_unknown_product_rolls_back() {
        let store = MemStore::with_products(&[(1, price(1000), 5)]);

        let err = run_checkout(&store, &[item(1, 2), item(99, 1)])
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::InvalidRequest(_)));
        // The first item's staged decrement must not survive the rollback.
        assert_eq!(store.stock_of(1).await, 5);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_checkout_commit_failure_surfaces_as_persistence() {
        let store = MemStore::with_products(&[(1, price(1000), 5)]);
        store.set_fail_commit(true).await;

        let err = run_checkout(&store, &[item(1, 1)]).await.unwrap_err();

        assert!(matches!(err, CheckoutError::Persistence(_)));
        assert_eq!(store.stock_of(1).await, 5);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_checkouts_cannot_oversell() {
        // stock = 100, two concurrent requests for 60 each: exactly one
        // succeeds, and stock never goes negative.
        let store = MemStore::with_products(&[(1, price(1000), 100)]);

        let a = {
            let store = store.clone();
            tokio::spawn(async move { run_checkout(&store, &[item(1, 60)]).await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { run_checkout(&store, &[item(1, 60)]).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let out_of_stock = results
            .iter()
            .filter(|r| matches!(r, Err(CheckoutError::OutOfStock(_))))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(out_of_stock, 1);
        assert_eq!(store.stock_of(1).await, 40);
        assert_eq!(store.order_count().await, 1);
    }
}
