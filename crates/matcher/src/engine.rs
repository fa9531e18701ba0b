use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{join, join_all};
use store::{Book, BookField, CatalogStore, Customer, CustomerField, InMemoryStore, StoreError};

use crate::metrics::metrics_recorder;
use crate::similarity::{is_match, similarity};
use crate::tokens::tokens_score;
use crate::types::{
    AcceptMode, BookMatch, BookQuery, CustomerMatch, CustomerQuery, LookupKind, LookupResponse,
    MatchError, MatchThreshold, MatchedField, MatcherConfig, ORDER_JOIN_FIELD,
};

#[cfg(test)]
mod tests;

/// Candidates one field (or the order join) accepted, or the storage error
/// that prevented fetching them.
struct FieldEvidence<R> {
    field: &'static str,
    hits: Result<Vec<(R, f64)>, StoreError>,
}

trait Keyed {
    fn key(&self) -> i32;
}

impl Keyed for Book {
    fn key(&self) -> i32 {
        self.id
    }
}

impl Keyed for Customer {
    fn key(&self) -> i32 {
        self.id
    }
}

/// Score one field value. Comma-delimited fields go through the token
/// matcher; everything else is a single comparison.
fn score_field(
    query: &str,
    target: &str,
    multi_valued: bool,
    threshold: MatchThreshold,
) -> Option<f64> {
    if multi_valued {
        return tokens_score(query, target, threshold.get());
    }
    is_match(query, target, threshold.get()).then(|| similarity(query, target))
}

/// Combine per-field evidence into ordered, deduplicated records.
///
/// Failed units are skipped. In `All` mode a record must appear in every
/// unit that succeeded; in `Any` mode one unit is enough.
fn merge<R: Keyed>(
    kind: LookupKind,
    units: Vec<FieldEvidence<R>>,
    mode: AcceptMode,
) -> Result<(Vec<(R, Vec<MatchedField>)>, usize), MatchError> {
    let total = units.len();
    let mut failed = 0usize;
    let mut succeeded = 0usize;
    let mut merged: BTreeMap<i32, (R, Vec<MatchedField>)> = BTreeMap::new();

    for unit in units {
        let hits = match unit.hits {
            Ok(hits) => hits,
            Err(err) => {
                tracing::warn!(
                    kind = kind.as_str(),
                    field = unit.field,
                    error = %err,
                    "candidate fetch failed; field contributes no matches"
                );
                failed += 1;
                continue;
            }
        };
        succeeded += 1;
        for (record, score) in hits {
            let matched = MatchedField {
                field: unit.field.to_string(),
                score,
            };
            merged
                .entry(record.key())
                .or_insert_with(|| (record, Vec::new()))
                .1
                .push(matched);
        }
    }

    if total > 0 && failed == total {
        return Err(MatchError::StorageUnavailable {
            kind: kind.as_str(),
            failed,
        });
    }

    let records = merged
        .into_values()
        .filter(|(_, matched)| match mode {
            AcceptMode::All => matched.len() == succeeded,
            AcceptMode::Any => true,
        })
        .collect();
    Ok((records, failed))
}

/// Lookup engine over a [`CatalogStore`].
///
/// Each supplied field becomes one fetch-and-score unit. Units of a request
/// run concurrently inside the request future and are merged once all of
/// them have finished, so dropping the future abandons every pending fetch.
pub struct Matcher<S: CatalogStore + ?Sized = InMemoryStore> {
    store: Arc<S>,
    config: MatcherConfig,
}

/// Matcher over the bundled in-memory store.
pub type DefaultMatcher = Matcher<InMemoryStore>;

impl<S: CatalogStore + ?Sized> Matcher<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: MatcherConfig::default(),
        }
    }

    pub fn with_config(store: Arc<S>, config: MatcherConfig) -> Result<Self, MatchError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    fn resolve_threshold(&self, requested: Option<i64>) -> MatchThreshold {
        let Some(raw) = requested else {
            return MatchThreshold::clamped(i64::from(self.config.default_threshold));
        };
        let threshold = MatchThreshold::clamped(raw);
        if i64::from(threshold.get()) != raw {
            tracing::warn!(
                requested = raw,
                applied = threshold.get(),
                "match threshold out of range; clamped"
            );
        }
        threshold
    }

    fn record(
        &self,
        kind: LookupKind,
        mode: AcceptMode,
        start: Instant,
        hits: usize,
        failed: usize,
    ) {
        if let Some(recorder) = metrics_recorder() {
            recorder.record_lookup(kind, mode, start.elapsed(), hits, failed);
        }
    }

    async fn book_unit(
        &self,
        field: BookField,
        value: &str,
        threshold: MatchThreshold,
    ) -> FieldEvidence<Book> {
        let hits = self.store.fetch_books(field, value).await.map(|candidates| {
            candidates
                .into_iter()
                .filter_map(|book| {
                    score_field(value, field.value(&book), field.is_multi_valued(), threshold)
                        .map(|score| (book, score))
                })
                .collect()
        });
        FieldEvidence {
            field: field.name(),
            hits,
        }
    }

    async fn customer_unit(
        &self,
        field: CustomerField,
        value: &str,
        threshold: MatchThreshold,
    ) -> FieldEvidence<Customer> {
        let hits = self
            .store
            .fetch_customers(field, value)
            .await
            .map(|candidates| {
                candidates
                    .into_iter()
                    .filter_map(|customer| {
                        score_field(
                            value,
                            field.value(&customer),
                            field.is_multi_valued(),
                            threshold,
                        )
                        .map(|score| (customer, score))
                    })
                    .collect()
            });
        FieldEvidence {
            field: field.name(),
            hits,
        }
    }

    /// Order -> customer join. A missing order or an order whose customer no
    /// longer exists yields no candidates.
    async fn join_order(&self, order_id: i32) -> Result<Vec<(Customer, f64)>, StoreError> {
        let Some(order) = self.store.find_order(order_id).await? else {
            return Ok(Vec::new());
        };
        let customer = self
            .store
            .find_customer_by_online_id(&order.customer_online_id)
            .await?;
        Ok(customer.into_iter().map(|c| (c, 100.0)).collect())
    }

    async fn order_unit(&self, order_id: i32) -> FieldEvidence<Customer> {
        FieldEvidence {
            field: ORDER_JOIN_FIELD,
            hits: self.join_order(order_id).await,
        }
    }

    /// Look up books by any combination of fields.
    pub async fn query_books(
        &self,
        query: &BookQuery,
    ) -> Result<LookupResponse<BookMatch>, MatchError> {
        let start = Instant::now();
        let mode = query.accept_mode.unwrap_or(self.config.accept_mode);
        let fields = query.supplied_fields();
        if fields.is_empty() {
            self.record(LookupKind::Books, mode, start, 0, 0);
            return Ok(LookupResponse::no_criteria());
        }
        let threshold = self.resolve_threshold(query.match_threshold);

        let units = join_all(
            fields
                .iter()
                .map(|(field, value)| self.book_unit(*field, value, threshold)),
        )
        .await;

        let (records, failed) = merge(LookupKind::Books, units, mode).inspect_err(|_| {
            self.record(LookupKind::Books, mode, start, 0, fields.len());
        })?;
        let results: Vec<BookMatch> = records
            .into_iter()
            .map(|(book, matched)| BookMatch::new(book, matched))
            .collect();

        tracing::debug!(
            fields = fields.len(),
            failed,
            threshold = threshold.get(),
            ?mode,
            hits = results.len(),
            "book lookup finished"
        );
        self.record(LookupKind::Books, mode, start, results.len(), failed);
        Ok(LookupResponse::from_results(LookupKind::Books, results))
    }

    /// Look up customers by any combination of fields and/or an order id.
    pub async fn query_customers(
        &self,
        query: &CustomerQuery,
    ) -> Result<LookupResponse<CustomerMatch>, MatchError> {
        let start = Instant::now();
        let mode = query.accept_mode.unwrap_or(self.config.accept_mode);
        if !query.has_criteria() {
            self.record(LookupKind::Customers, mode, start, 0, 0);
            return Ok(LookupResponse::no_criteria());
        }
        let threshold = self.resolve_threshold(query.match_threshold);
        let fields = query.supplied_fields();

        let field_units = join_all(
            fields
                .iter()
                .map(|(field, value)| self.customer_unit(*field, value, threshold)),
        );
        let order_unit = async {
            match query.order_id() {
                Some(order_id) => Some(self.order_unit(order_id).await),
                None => None,
            }
        };
        let (mut units, order) = join(field_units, order_unit).await;
        units.extend(order);
        let unit_count = units.len();

        let (records, failed) = merge(LookupKind::Customers, units, mode).inspect_err(|_| {
            self.record(LookupKind::Customers, mode, start, 0, unit_count);
        })?;
        let results: Vec<CustomerMatch> = records
            .into_iter()
            .map(|(customer, matched)| CustomerMatch::new(customer, matched))
            .collect();

        tracing::debug!(
            fields = unit_count,
            failed,
            threshold = threshold.get(),
            ?mode,
            hits = results.len(),
            "customer lookup finished"
        );
        self.record(LookupKind::Customers, mode, start, results.len(), failed);
        Ok(LookupResponse::from_results(LookupKind::Customers, results))
    }
}
