//! # Lookup Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` answers approximate lookups over the bookstore catalogue. A
//! caller supplies any subset of a record's searchable fields plus a
//! similarity threshold; each field is fetched from a [`store::CatalogStore`]
//! (coarse prefilter), scored by edit-distance similarity, and the per-field
//! results are merged into one deduplicated, id-ordered list.
//!
//! Comma-delimited fields (`keywords`, `authors`) are compared token by
//! token: every query token must find a close enough stored token.
//!
//! ## Core Types
//!
//! - [`BookQuery`], [`CustomerQuery`]: optional per-field criteria, a
//!   threshold, and an optional [`AcceptMode`] override.
//! - [`AcceptMode`]: `All` requires every supplied field to pass; `Any` takes
//!   the union (used for free-text queries).
//! - [`LookupResponse`]: `success`, a feedback line and the matched records,
//!   each annotated with the fields that matched and their scores.
//! - [`Matcher`]: the orchestrator. Field units run concurrently and are
//!   cancelled together when the lookup future is dropped.
//! - [`MatchError`]: only raised when storage failed for every field.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use matcher::{BookQuery, Matcher};
//! use store::{Book, InMemoryStore};
//!
//! let store = InMemoryStore::new();
//! store.insert_book(Book {
//!     book_no: "B001".into(),
//!     title: "Go Programming".into(),
//!     authors: "John Doe".into(),
//!     ..Default::default()
//! }).unwrap();
//! let matcher = Matcher::new(Arc::new(store));
//!
//! let query = BookQuery {
//!     title: Some("Programming".into()),
//!     ..Default::default()
//! }
//! .with_threshold(50);
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let resp = matcher.query_books(&query).await.unwrap();
//! assert!(resp.success);
//! assert_eq!(resp.results[0].feedback, "matched by title (78.57%)");
//! # });
//! ```
//!
//! ## Observability
//!
//! Install a [`MatchMetrics`] implementation via [`set_match_metrics`] to
//! record latency, hit counts and failed fields per lookup.

pub mod engine;
pub mod metrics;
pub mod similarity;
pub mod tokens;
pub mod types;

pub use crate::engine::{DefaultMatcher, Matcher};
pub use crate::metrics::{set_match_metrics, MatchMetrics};
pub use crate::similarity::{is_match, similarity};
pub use crate::tokens::{tokens_match, tokens_score};
pub use crate::types::{
    AcceptMode, BookMatch, BookQuery, CustomerMatch, CustomerQuery, LookupKind, LookupResponse,
    MatchError, MatchThreshold, MatchedField, MatcherConfig, ORDER_JOIN_FIELD,
};
