use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backend::InMemoryStore;
use crate::model::{Book, Customer, CustomerOrder};
use crate::prefilter::PrefilterMode;
use crate::StoreError;

/// JSON catalogue snapshot used to populate an [`InMemoryStore`].
///
/// ```json
/// {
///   "books": [{ "book_no": "B001", "title": "Go Programming", "authors": "John Doe" }],
///   "customers": [{ "online_id": "customer1", "name": "Customer 1", "address": "Address 1" }],
///   "orders": [{ "order_date": "2024-01-01", "customer_online_id": "customer1",
///                "book_no": "B001", "book_count": 1 }]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub orders: Vec<CustomerOrder>,
}

impl CatalogSeed {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl InMemoryStore {
    /// Build a store holding every record of `seed`.
    pub fn from_seed(seed: CatalogSeed, prefilter: PrefilterMode) -> Result<Self, StoreError> {
        let store = InMemoryStore::with_prefilter(prefilter);
        store.load(seed)?;
        Ok(store)
    }

    /// Insert every record of `seed`, stopping at the first conflict.
    pub fn load(&self, seed: CatalogSeed) -> Result<(), StoreError> {
        let (books, customers, orders) =
            (seed.books.len(), seed.customers.len(), seed.orders.len());
        for book in seed.books {
            self.insert_book(book)?;
        }
        for customer in seed.customers {
            self.insert_customer(customer)?;
        }
        for order in seed.orders {
            self.insert_order(order)?;
        }
        tracing::info!(books, customers, orders, "catalogue seed loaded");
        Ok(())
    }

    /// Read a JSON seed file and insert its records.
    pub fn load_seed<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        self.load(CatalogSeed::from_file(path)?)
    }
}
