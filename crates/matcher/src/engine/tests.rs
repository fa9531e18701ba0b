use super::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use store::{CustomerOrder, PrefilterMode};

use crate::metrics::{set_match_metrics, MatchMetrics};

fn book(book_no: &str, title: &str, keywords: &str, authors: &str) -> Book {
    Book {
        book_no: book_no.into(),
        title: title.into(),
        publisher_name: "Tech Press".into(),
        price: 30,
        keywords: keywords.into(),
        authors: authors.into(),
        stock_quantity: 10,
        ..Default::default()
    }
}

fn customer(online_id: &str, name: &str, address: &str) -> Customer {
    Customer {
        online_id: online_id.into(),
        name: name.into(),
        address: address.into(),
        account_balance: 100,
        credit_level: 1,
        ..Default::default()
    }
}

fn seeded_store(prefilter: PrefilterMode) -> InMemoryStore {
    let store = InMemoryStore::with_prefilter(prefilter);
    store
        .insert_book(book("B001", "Go Programming", "go,programming", "John Doe"))
        .unwrap();
    store
        .insert_book(book(
            "B002",
            "Rust Programming",
            "rust,programming,systems",
            "Jane Roe",
        ))
        .unwrap();
    store
        .insert_book(book(
            "B003",
            "Python Programming",
            "python,programming",
            "Alan Poe",
        ))
        .unwrap();
    store
        .insert_customer(customer("customer1", "John Doe", "123 Main St"))
        .unwrap();
    store
        .insert_customer(customer("customer2", "Jane Roe", "456 Oak Ave"))
        .unwrap();
    store
        .insert_order(CustomerOrder {
            order_date: "2024-01-01".into(),
            customer_online_id: "customer1".into(),
            book_no: "B001".into(),
            book_count: 2,
            price: 60,
            address: "123 Main St".into(),
            status: "shipped".into(),
            ..Default::default()
        })
        .unwrap();
    store
}

fn matcher() -> DefaultMatcher {
    Matcher::new(Arc::new(seeded_store(PrefilterMode::Substring)))
}

fn book_nos(resp: &LookupResponse<BookMatch>) -> Vec<&str> {
    resp.results.iter().map(|m| m.book.book_no.as_str()).collect()
}

fn title_query(title: &str, threshold: i64) -> BookQuery {
    BookQuery {
        title: Some(title.into()),
        ..Default::default()
    }
    .with_threshold(threshold)
}

#[tokio::test]
async fn title_lookup_returns_every_close_title() -> Result<(), MatchError> {
    let resp = matcher().query_books(&title_query("Programming", 50)).await?;
    assert!(resp.success);
    assert_eq!(resp.feedback, "Books found");
    assert_eq!(book_nos(&resp), vec!["B001", "B002", "B003"]);
    assert!(resp.results[0].feedback.starts_with("matched by title (78.57%)"));
    Ok(())
}

#[tokio::test]
async fn exact_author_lookup_returns_single_book() -> Result<(), MatchError> {
    let query = BookQuery {
        authors: Some("John Doe".into()),
        match_threshold: Some(100),
        ..Default::default()
    };
    let resp = matcher().query_books(&query).await?;
    assert_eq!(book_nos(&resp), vec!["B001"]);
    assert_eq!(resp.results[0].feedback, "matched by authors (100.00%)");
    Ok(())
}

#[tokio::test]
async fn unknown_value_is_an_unsuccessful_response() -> Result<(), MatchError> {
    let resp = matcher().query_books(&title_query("Nonexistent", 50)).await?;
    assert!(!resp.success);
    assert_eq!(resp.feedback, "No books found");
    assert!(resp.results.is_empty());
    Ok(())
}

#[tokio::test]
async fn raising_threshold_never_adds_results() -> Result<(), MatchError> {
    let m = matcher();
    let mut previous: Option<HashSet<String>> = None;
    for threshold in [0, 50, 65, 70, 80, 100] {
        let resp = m.query_books(&title_query("Programming", threshold)).await?;
        let ids: HashSet<String> = resp.results.iter().map(|r| r.book.book_no.clone()).collect();
        if let Some(prev) = &previous {
            assert!(ids.is_subset(prev), "threshold {threshold} widened the result set");
        }
        previous = Some(ids);
    }
    let resp = m.query_books(&title_query("Programming", 70)).await?;
    assert_eq!(book_nos(&resp), vec!["B001"]);
    Ok(())
}

#[tokio::test]
async fn record_matched_by_two_fields_appears_once() -> Result<(), MatchError> {
    let query = BookQuery {
        title: Some("Go Programming".into()),
        authors: Some("John Doe".into()),
        match_threshold: Some(100),
        ..Default::default()
    };
    let resp = matcher().query_books(&query).await?;
    assert_eq!(resp.results.len(), 1);
    let hit = &resp.results[0];
    assert_eq!(hit.matched.len(), 2);
    assert_eq!(hit.feedback, "matched by title (100.00%), authors (100.00%)");
    Ok(())
}

#[tokio::test]
async fn all_mode_intersects_and_any_mode_unions() -> Result<(), MatchError> {
    let m = matcher();
    let mut query = BookQuery {
        title: Some("Programming".into()),
        authors: Some("Jane Roe".into()),
        match_threshold: Some(50),
        ..Default::default()
    };
    let resp = m.query_books(&query).await?;
    assert_eq!(book_nos(&resp), vec!["B002"]);

    query.accept_mode = Some(AcceptMode::Any);
    let resp = m.query_books(&query).await?;
    assert_eq!(book_nos(&resp), vec!["B001", "B002", "B003"]);
    Ok(())
}

#[tokio::test]
async fn configured_accept_mode_applies_when_query_has_none() -> Result<(), MatchError> {
    let config = MatcherConfig {
        accept_mode: AcceptMode::Any,
        ..MatcherConfig::default()
    };
    let m = Matcher::with_config(Arc::new(seeded_store(PrefilterMode::Substring)), config)?;
    let query = BookQuery {
        title: Some("Rust Programming".into()),
        authors: Some("John Doe".into()),
        match_threshold: Some(100),
        ..Default::default()
    };
    let resp = m.query_books(&query).await?;
    assert_eq!(book_nos(&resp), vec!["B001", "B002"]);
    Ok(())
}

#[tokio::test]
async fn keywords_require_every_query_token() -> Result<(), MatchError> {
    let m = matcher();
    let query = BookQuery {
        keywords: Some("programming,go".into()),
        match_threshold: Some(100),
        ..Default::default()
    };
    let resp = m.query_books(&query).await?;
    assert_eq!(book_nos(&resp), vec!["B001"]);

    let query = BookQuery {
        keywords: Some("programming".into()),
        match_threshold: Some(100),
        ..Default::default()
    };
    let resp = m.query_books(&query).await?;
    assert_eq!(resp.results.len(), 3);
    Ok(())
}

#[tokio::test]
async fn free_text_book_lookup_accepts_any_field() -> Result<(), MatchError> {
    let resp = matcher()
        .query_books(&BookQuery::free_text("Tech Press").with_threshold(100))
        .await?;
    assert_eq!(resp.results.len(), 3);
    assert!(resp
        .results
        .iter()
        .all(|r| r.feedback == "matched by publisher_name (100.00%)"));
    Ok(())
}

#[tokio::test]
async fn full_scan_prefilter_finds_misspelled_titles() -> Result<(), MatchError> {
    let query = title_query("Go Programing", 80);

    let resp = matcher().query_books(&query).await?;
    assert!(!resp.success);

    let m = Matcher::new(Arc::new(seeded_store(PrefilterMode::FullScan)));
    let resp = m.query_books(&query).await?;
    assert_eq!(book_nos(&resp), vec!["B001"]);
    Ok(())
}

#[tokio::test]
async fn thresholds_are_clamped_and_defaulted() -> Result<(), MatchError> {
    let m = matcher();

    let resp = m.query_books(&title_query("Go Programming", 250)).await?;
    assert_eq!(book_nos(&resp), vec!["B001"]);

    let resp = m.query_books(&title_query("Programming", -10)).await?;
    assert_eq!(resp.results.len(), 3);

    let omitted = BookQuery {
        title: Some("Programming".into()),
        ..Default::default()
    };
    let resp = m.query_books(&omitted).await?;
    assert_eq!(resp.results.len(), 3);
    Ok(())
}

#[tokio::test]
async fn query_without_criteria_is_rejected_softly() -> Result<(), MatchError> {
    let m = matcher();
    let resp = m.query_books(&BookQuery::default()).await?;
    assert!(!resp.success);
    assert_eq!(resp.feedback, "No search criteria supplied");

    let blank = BookQuery {
        title: Some(String::new()),
        ..Default::default()
    };
    assert!(!m.query_books(&blank).await?.success);

    let resp = m.query_customers(&CustomerQuery::default()).await?;
    assert_eq!(resp.feedback, "No search criteria supplied");
    Ok(())
}

#[tokio::test]
async fn order_id_joins_to_customer_with_orders() -> Result<(), MatchError> {
    let query = CustomerQuery {
        order_id: Some(1),
        ..Default::default()
    };
    let resp = matcher().query_customers(&query).await?;
    assert!(resp.success);
    assert_eq!(resp.feedback, "Customers found");
    assert_eq!(resp.results.len(), 1);
    let hit = &resp.results[0];
    assert_eq!(hit.customer.online_id, "customer1");
    assert_eq!(hit.customer.orders.len(), 1);
    assert_eq!(hit.feedback, "matched by order_id");
    Ok(())
}

#[tokio::test]
async fn missing_order_finds_no_customer() -> Result<(), MatchError> {
    let query = CustomerQuery {
        order_id: Some(99),
        ..Default::default()
    };
    let resp = matcher().query_customers(&query).await?;
    assert!(!resp.success);
    assert_eq!(resp.feedback, "No customers found");
    Ok(())
}

#[tokio::test]
async fn non_positive_order_id_is_unspecified() -> Result<(), MatchError> {
    let m = matcher();
    for order_id in [0, -1] {
        let query = CustomerQuery {
            name: Some("John Doe".into()),
            order_id: Some(order_id),
            match_threshold: Some(100),
            ..Default::default()
        };
        let resp = m.query_customers(&query).await?;
        assert!(resp.success);
        assert_eq!(resp.results.len(), 1);
        assert_eq!(resp.results[0].customer.online_id, "customer1");
        assert_eq!(resp.results[0].feedback, "matched by name (100.00%)");
    }

    let only_zero = CustomerQuery {
        order_id: Some(0),
        ..Default::default()
    };
    let resp = m.query_customers(&only_zero).await?;
    assert_eq!(resp.feedback, "No search criteria supplied");
    Ok(())
}

#[tokio::test]
async fn order_join_takes_part_in_accept_mode() -> Result<(), MatchError> {
    let m = matcher();
    let mut query = CustomerQuery {
        name: Some("Jane Roe".into()),
        order_id: Some(1),
        match_threshold: Some(100),
        ..Default::default()
    };
    let resp = m.query_customers(&query).await?;
    assert!(resp.results.is_empty());

    query.accept_mode = Some(AcceptMode::Any);
    let resp = m.query_customers(&query).await?;
    let ids: Vec<&str> = resp
        .results
        .iter()
        .map(|r| r.customer.online_id.as_str())
        .collect();
    assert_eq!(ids, vec!["customer1", "customer2"]);
    Ok(())
}

#[tokio::test]
async fn free_text_customer_lookup_tries_the_order_join() -> Result<(), MatchError> {
    let m = matcher();
    let resp = m.query_customers(&CustomerQuery::free_text("1")).await?;
    assert!(resp.results.iter().any(|r| {
        r.customer.online_id == "customer1" && r.matched.iter().any(|f| f.field == "order_id")
    }));

    let resp = m
        .query_customers(&CustomerQuery::free_text("customer2").with_threshold(100))
        .await?;
    assert_eq!(resp.results.len(), 1);
    assert_eq!(resp.results[0].customer.name, "Jane Roe");
    Ok(())
}

/// Delegates to an in-memory store but fails the configured book fields and,
/// optionally, order lookups.
struct FailingStore {
    inner: InMemoryStore,
    failing: Vec<BookField>,
    fail_orders: bool,
}

#[async_trait]
impl CatalogStore for FailingStore {
    async fn fetch_books(&self, field: BookField, filter: &str) -> Result<Vec<Book>, StoreError> {
        if self.failing.contains(&field) {
            return Err(StoreError::unavailable(format!("{field} shard offline")));
        }
        self.inner.fetch_books(field, filter).await
    }

    async fn fetch_customers(
        &self,
        field: CustomerField,
        filter: &str,
    ) -> Result<Vec<Customer>, StoreError> {
        self.inner.fetch_customers(field, filter).await
    }

    async fn find_order(&self, order_id: i32) -> Result<Option<CustomerOrder>, StoreError> {
        if self.fail_orders {
            return Err(StoreError::unavailable("orders offline"));
        }
        self.inner.find_order(order_id).await
    }

    async fn find_customer_by_online_id(
        &self,
        online_id: &str,
    ) -> Result<Option<Customer>, StoreError> {
        self.inner.find_customer_by_online_id(online_id).await
    }
}

fn failing_matcher(failing: Vec<BookField>, fail_orders: bool) -> Matcher<FailingStore> {
    Matcher::new(Arc::new(FailingStore {
        inner: seeded_store(PrefilterMode::Substring),
        failing,
        fail_orders,
    }))
}

#[tokio::test]
async fn failed_field_is_skipped_when_others_succeed() -> Result<(), MatchError> {
    let m = failing_matcher(vec![BookField::Title], false);
    let query = BookQuery {
        title: Some("Programming".into()),
        authors: Some("John Doe".into()),
        match_threshold: Some(100),
        ..Default::default()
    };
    let resp = m.query_books(&query).await?;
    assert_eq!(book_nos(&resp), vec!["B001"]);
    assert_eq!(resp.results[0].matched.len(), 1);
    Ok(())
}

#[tokio::test]
async fn every_field_failing_is_storage_unavailable() {
    let m = failing_matcher(vec![BookField::Title, BookField::Authors], false);
    let query = BookQuery {
        title: Some("Programming".into()),
        authors: Some("John Doe".into()),
        ..Default::default()
    };
    match m.query_books(&query).await {
        Err(MatchError::StorageUnavailable { kind, failed }) => {
            assert_eq!(kind, "books");
            assert_eq!(failed, 2);
        }
        other => panic!("expected StorageUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_order_join_falls_back_to_other_fields() -> Result<(), MatchError> {
    let m = failing_matcher(Vec::new(), true);
    let query = CustomerQuery {
        name: Some("John Doe".into()),
        order_id: Some(1),
        match_threshold: Some(100),
        ..Default::default()
    };
    let resp = m.query_customers(&query).await?;
    assert_eq!(resp.results.len(), 1);
    assert_eq!(resp.results[0].feedback, "matched by name (100.00%)");

    let only_order = CustomerQuery {
        order_id: Some(1),
        ..Default::default()
    };
    assert!(matches!(
        m.query_customers(&only_order).await,
        Err(MatchError::StorageUnavailable { failed: 1, .. })
    ));
    Ok(())
}

struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Never answers; counts fetches abandoned by their caller.
struct StalledStore {
    abandoned: Arc<AtomicUsize>,
}

#[async_trait]
impl CatalogStore for StalledStore {
    async fn fetch_books(&self, _field: BookField, _filter: &str) -> Result<Vec<Book>, StoreError> {
        let _guard = DropCounter(self.abandoned.clone());
        futures::future::pending().await
    }

    async fn fetch_customers(
        &self,
        _field: CustomerField,
        _filter: &str,
    ) -> Result<Vec<Customer>, StoreError> {
        let _guard = DropCounter(self.abandoned.clone());
        futures::future::pending().await
    }

    async fn find_order(&self, _order_id: i32) -> Result<Option<CustomerOrder>, StoreError> {
        let _guard = DropCounter(self.abandoned.clone());
        futures::future::pending().await
    }

    async fn find_customer_by_online_id(
        &self,
        _online_id: &str,
    ) -> Result<Option<Customer>, StoreError> {
        futures::future::pending().await
    }
}

#[tokio::test]
async fn dropping_the_lookup_abandons_pending_fetches() {
    let abandoned = Arc::new(AtomicUsize::new(0));
    let m = Matcher::new(Arc::new(StalledStore {
        abandoned: abandoned.clone(),
    }));

    let query = BookQuery {
        title: Some("Programming".into()),
        authors: Some("John Doe".into()),
        ..Default::default()
    };
    let outcome = tokio::time::timeout(Duration::from_millis(20), m.query_books(&query)).await;
    assert!(outcome.is_err());
    assert_eq!(abandoned.load(Ordering::SeqCst), 2);

    let query = CustomerQuery {
        name: Some("John Doe".into()),
        order_id: Some(1),
        ..Default::default()
    };
    let outcome = tokio::time::timeout(Duration::from_millis(20), m.query_customers(&query)).await;
    assert!(outcome.is_err());
    assert_eq!(abandoned.load(Ordering::SeqCst), 4);
}

struct RecordingMetrics {
    events: Arc<RwLock<Vec<(LookupKind, AcceptMode, usize, usize)>>>,
}

impl RecordingMetrics {
    fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }

    fn snapshot(&self) -> Vec<(LookupKind, AcceptMode, usize, usize)> {
        self.events.read().unwrap().clone()
    }
}

impl MatchMetrics for RecordingMetrics {
    fn record_lookup(
        &self,
        kind: LookupKind,
        mode: AcceptMode,
        _latency: Duration,
        hit_count: usize,
        failed_fields: usize,
    ) {
        self.events
            .write()
            .unwrap()
            .push((kind, mode, hit_count, failed_fields));
    }
}

#[tokio::test]
async fn metrics_recorder_observes_lookups() -> Result<(), MatchError> {
    let metrics = Arc::new(RecordingMetrics::new());
    set_match_metrics(Some(metrics.clone()));

    let m = failing_matcher(vec![BookField::Title], false);
    let query = BookQuery {
        title: Some("Programming".into()),
        authors: Some("Jane Roe".into()),
        match_threshold: Some(100),
        accept_mode: Some(AcceptMode::Any),
        ..Default::default()
    };
    let resp = m.query_books(&query).await?;
    assert_eq!(resp.results.len(), 1);

    let events = metrics.snapshot();
    assert!(events.contains(&(LookupKind::Books, AcceptMode::Any, 1, 1)));

    set_match_metrics(None);
    Ok(())
}
