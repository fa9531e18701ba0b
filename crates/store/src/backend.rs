use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::model::{Book, BookField, Customer, CustomerField, CustomerOrder};
use crate::prefilter::PrefilterMode;
use crate::StoreError;

/// Read side of the record store as seen by the lookup engine.
///
/// Every method is a single round trip to storage. Implementations must be
/// safe to call concurrently from several in-flight fetches of one request.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Coarse candidates for `field`, narrowed by the store's prefilter.
    async fn fetch_books(&self, field: BookField, filter: &str) -> Result<Vec<Book>, StoreError>;

    /// Coarse candidates for `field`, with each customer's orders preloaded.
    async fn fetch_customers(
        &self,
        field: CustomerField,
        filter: &str,
    ) -> Result<Vec<Customer>, StoreError>;

    /// Exact lookup of an order by its identifier.
    async fn find_order(&self, order_id: i32) -> Result<Option<CustomerOrder>, StoreError>;

    /// Exact lookup of a customer by online id, orders preloaded.
    async fn find_customer_by_online_id(
        &self,
        online_id: &str,
    ) -> Result<Option<Customer>, StoreError>;
}

/// Configuration for building a store.
///
/// # Example
/// ```
/// use store::{PrefilterMode, StoreConfig};
///
/// let store = StoreConfig::new()
///     .with_prefilter(PrefilterMode::FullScan)
///     .build();
/// assert_eq!(store.book_count().unwrap(), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct StoreConfig {
    pub prefilter: PrefilterMode,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefilter(mut self, prefilter: PrefilterMode) -> Self {
        self.prefilter = prefilter;
        self
    }

    pub fn build(&self) -> InMemoryStore {
        InMemoryStore::with_prefilter(self.prefilter)
    }
}

#[derive(Default)]
struct Tables {
    books: BTreeMap<i32, Book>,
    customers: BTreeMap<i32, Customer>,
    orders: BTreeMap<i32, CustomerOrder>,
}

impl Tables {
    fn orders_of(&self, online_id: &str) -> Vec<CustomerOrder> {
        self.orders
            .values()
            .filter(|order| order.customer_online_id == online_id)
            .cloned()
            .collect()
    }

    fn with_orders(&self, customer: &Customer) -> Customer {
        Customer {
            orders: self.orders_of(&customer.online_id),
            ..customer.clone()
        }
    }
}

fn next_id<V>(table: &BTreeMap<i32, V>) -> i32 {
    table.keys().next_back().map_or(1, |last| last + 1)
}

/// An in-memory store using a `RwLock` around id-ordered tables.
///
/// Reads return records in ascending id order.
pub struct InMemoryStore {
    prefilter: PrefilterMode,
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_prefilter(PrefilterMode::default())
    }

    pub fn with_prefilter(prefilter: PrefilterMode) -> Self {
        Self {
            prefilter,
            tables: RwLock::new(Tables::default()),
        }
    }

    pub fn prefilter(&self) -> PrefilterMode {
        self.prefilter
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }

    /// Insert a book, assigning the next free id when `book.id` is 0.
    pub fn insert_book(&self, mut book: Book) -> Result<i32, StoreError> {
        let mut tables = self.write()?;
        if book.id == 0 {
            book.id = next_id(&tables.books);
        } else if tables.books.contains_key(&book.id) {
            return Err(StoreError::Conflict(format!("book id {} already exists", book.id)));
        }
        if tables.books.values().any(|b| b.book_no == book.book_no) {
            return Err(StoreError::Conflict(format!(
                "book_no {} already exists",
                book.book_no
            )));
        }
        let id = book.id;
        tables.books.insert(id, book);
        tracing::debug!(id, "book inserted");
        Ok(id)
    }

    /// Insert a customer, assigning the next free id when `customer.id` is 0.
    /// Any orders carried on the value are ignored; orders are stored separately.
    pub fn insert_customer(&self, mut customer: Customer) -> Result<i32, StoreError> {
        let mut tables = self.write()?;
        if customer.id == 0 {
            customer.id = next_id(&tables.customers);
        } else if tables.customers.contains_key(&customer.id) {
            return Err(StoreError::Conflict(format!(
                "customer id {} already exists",
                customer.id
            )));
        }
        if tables
            .customers
            .values()
            .any(|c| c.online_id == customer.online_id)
        {
            return Err(StoreError::Conflict(format!(
                "online_id {} already exists",
                customer.online_id
            )));
        }
        customer.orders.clear();
        let id = customer.id;
        tables.customers.insert(id, customer);
        tracing::debug!(id, "customer inserted");
        Ok(id)
    }

    /// Insert an order, assigning the next free id when `order.id` is 0.
    pub fn insert_order(&self, mut order: CustomerOrder) -> Result<i32, StoreError> {
        let mut tables = self.write()?;
        if order.id == 0 {
            order.id = next_id(&tables.orders);
        } else if tables.orders.contains_key(&order.id) {
            return Err(StoreError::Conflict(format!("order id {} already exists", order.id)));
        }
        let id = order.id;
        tables.orders.insert(id, order);
        tracing::debug!(id, "order inserted");
        Ok(id)
    }

    /// Remove a book by id, returning it when present.
    pub fn remove_book(&self, id: i32) -> Result<Option<Book>, StoreError> {
        Ok(self.write()?.books.remove(&id))
    }

    pub fn book_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.books.len())
    }

    pub fn customer_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.customers.len())
    }

    pub fn order_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.orders.len())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn fetch_books(&self, field: BookField, filter: &str) -> Result<Vec<Book>, StoreError> {
        let tables = self.read()?;
        let multi = field.is_multi_valued();
        Ok(tables
            .books
            .values()
            .filter(|book| self.prefilter.admits(field.value(book), filter, multi))
            .cloned()
            .collect())
    }

    async fn fetch_customers(
        &self,
        field: CustomerField,
        filter: &str,
    ) -> Result<Vec<Customer>, StoreError> {
        let tables = self.read()?;
        let multi = field.is_multi_valued();
        Ok(tables
            .customers
            .values()
            .filter(|c| self.prefilter.admits(field.value(c), filter, multi))
            .map(|c| tables.with_orders(c))
            .collect())
    }

    async fn find_order(&self, order_id: i32) -> Result<Option<CustomerOrder>, StoreError> {
        Ok(self.read()?.orders.get(&order_id).cloned())
    }

    async fn find_customer_by_online_id(
        &self,
        online_id: &str,
    ) -> Result<Option<Customer>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .customers
            .values()
            .find(|c| c.online_id == online_id)
            .map(|c| tables.with_orders(c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(book_no: &str, title: &str, authors: &str) -> Book {
        Book {
            book_no: book_no.into(),
            title: title.into(),
            publisher_name: "Tech Press".into(),
            authors: authors.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn substring_prefilter_narrows_candidates() {
        let store = InMemoryStore::new();
        store.insert_book(book("B001", "Go Programming", "John Doe")).unwrap();
        store.insert_book(book("B002", "Cooking", "Jane Roe")).unwrap();

        let hits = store.fetch_books(BookField::Title, "Programming").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].book_no, "B001");
    }

    #[tokio::test]
    async fn full_scan_returns_every_book_in_id_order() {
        let store = StoreConfig::new()
            .with_prefilter(PrefilterMode::FullScan)
            .build();
        store.insert_book(book("B002", "Second", "")).unwrap();
        store.insert_book(book("B001", "First", "")).unwrap();

        let hits = store.fetch_books(BookField::Title, "zzz").await.unwrap();
        let ids: Vec<i32> = hits.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn duplicate_book_no_is_rejected() {
        let store = InMemoryStore::new();
        store.insert_book(book("B001", "One", "")).unwrap();
        let err = store.insert_book(book("B001", "Two", "")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.book_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn removed_book_is_no_longer_fetched() {
        let store = InMemoryStore::new();
        let go = store.insert_book(book("B001", "Go Programming", "John Doe")).unwrap();
        store.insert_book(book("B002", "Rust Programming", "Jane Roe")).unwrap();

        let removed = store.remove_book(go).unwrap().expect("book present");
        assert_eq!(removed.book_no, "B001");
        assert_eq!(store.book_count().unwrap(), 1);
        assert!(store.remove_book(go).unwrap().is_none());

        let hits = store.fetch_books(BookField::Title, "Programming").await.unwrap();
        let numbers: Vec<&str> = hits.iter().map(|b| b.book_no.as_str()).collect();
        assert_eq!(numbers, vec!["B002"]);

        // The book number is free again.
        store.insert_book(book("B001", "Go Programming", "John Doe")).unwrap();
    }

    #[test]
    fn explicit_ids_are_kept_and_next_id_follows_them() {
        let store = InMemoryStore::new();
        let explicit = Book {
            id: 10,
            ..book("B010", "Ten", "")
        };
        assert_eq!(store.insert_book(explicit).unwrap(), 10);
        assert_eq!(store.insert_book(book("B011", "Eleven", "")).unwrap(), 11);
    }

    #[tokio::test]
    async fn customers_are_returned_with_their_orders() {
        let store = InMemoryStore::new();
        store
            .insert_customer(Customer {
                online_id: "customer1".into(),
                name: "Customer 1".into(),
                address: "Address 1".into(),
                ..Default::default()
            })
            .unwrap();
        let order_id = store
            .insert_order(CustomerOrder {
                order_date: "2024-01-01".into(),
                customer_online_id: "customer1".into(),
                book_no: "B001".into(),
                book_count: 1,
                ..Default::default()
            })
            .unwrap();

        let found = store
            .find_customer_by_online_id("customer1")
            .await
            .unwrap()
            .expect("customer");
        assert_eq!(found.orders.len(), 1);
        assert_eq!(found.orders[0].id, order_id);

        let order = store.find_order(order_id).await.unwrap().expect("order");
        assert_eq!(order.customer_online_id, "customer1");
        assert!(store.find_order(order_id + 1).await.unwrap().is_none());
    }
}
