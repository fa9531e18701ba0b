use serde::{Deserialize, Serialize};
use store::{Book, BookField, Customer, CustomerField, StoreError};
use thiserror::Error;

/// Minimum similarity percentage a field comparison must reach.
///
/// Out-of-range input is clamped to `[0, 100]` instead of being rejected so
/// every request yields a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct MatchThreshold(u8);

impl MatchThreshold {
    pub const MIN: MatchThreshold = MatchThreshold(0);
    pub const MAX: MatchThreshold = MatchThreshold(100);

    /// Clamp any integer into the valid range.
    pub fn clamped(raw: i64) -> Self {
        MatchThreshold(raw.clamp(0, 100) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl From<i64> for MatchThreshold {
    fn from(raw: i64) -> Self {
        MatchThreshold::clamped(raw)
    }
}

impl From<MatchThreshold> for u8 {
    fn from(t: MatchThreshold) -> Self {
        t.0
    }
}

/// How per-field results combine into an accepted record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AcceptMode {
    /// A record must pass every supplied field.
    #[default]
    All,
    /// A record passing any supplied field is accepted.
    Any,
}

/// Which record kind a lookup targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LookupKind {
    Books,
    Customers,
}

impl LookupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LookupKind::Books => "books",
            LookupKind::Customers => "customers",
        }
    }

    fn found(self) -> &'static str {
        match self {
            LookupKind::Books => "Books found",
            LookupKind::Customers => "Customers found",
        }
    }

    fn not_found(self) -> &'static str {
        match self {
            LookupKind::Books => "No books found",
            LookupKind::Customers => "No customers found",
        }
    }
}

/// Engine-wide settings. Thresholds travel with each request; the value
/// here is only the fallback for requests that omit one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatcherConfig {
    #[serde(default = "MatcherConfig::default_threshold")]
    pub default_threshold: u8,
    #[serde(default)]
    pub accept_mode: AcceptMode,
}

impl MatcherConfig {
    pub(crate) fn default_threshold() -> u8 {
        50
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.default_threshold > 100 {
            return Err(MatchError::InvalidConfig(format!(
                "default_threshold must be within 0..=100, got {}",
                self.default_threshold
            )));
        }
        Ok(())
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            default_threshold: Self::default_threshold(),
            accept_mode: AcceptMode::default(),
        }
    }
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Structured book lookup. Unset and empty fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookQuery {
    #[serde(default)]
    pub book_no: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub publisher_name: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    /// Percentage in `[0, 100]`; out-of-range values are clamped.
    #[serde(default)]
    pub match_threshold: Option<i64>,
    /// Overrides [`MatcherConfig::accept_mode`] for this request.
    #[serde(default)]
    pub accept_mode: Option<AcceptMode>,
}

impl BookQuery {
    /// Try `input` against every searchable field, accepting any hit.
    pub fn free_text(input: impl Into<String>) -> Self {
        let input = input.into();
        Self {
            book_no: Some(input.clone()),
            title: Some(input.clone()),
            publisher_name: Some(input.clone()),
            keywords: Some(input.clone()),
            authors: Some(input),
            match_threshold: None,
            accept_mode: Some(AcceptMode::Any),
        }
    }

    pub fn with_threshold(mut self, threshold: i64) -> Self {
        self.match_threshold = Some(threshold);
        self
    }

    pub fn value(&self, field: BookField) -> Option<&str> {
        match field {
            BookField::BookNo => supplied(&self.book_no),
            BookField::Title => supplied(&self.title),
            BookField::PublisherName => supplied(&self.publisher_name),
            BookField::Keywords => supplied(&self.keywords),
            BookField::Authors => supplied(&self.authors),
        }
    }

    /// Non-empty fields, in declaration order.
    pub fn supplied_fields(&self) -> Vec<(BookField, &str)> {
        BookField::ALL
            .into_iter()
            .filter_map(|f| self.value(f).map(|v| (f, v)))
            .collect()
    }
}

/// Structured customer lookup. `order_id` is an exact join through the
/// order table, not a similarity comparison.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomerQuery {
    #[serde(default)]
    pub online_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub order_id: Option<i32>,
    #[serde(default)]
    pub match_threshold: Option<i64>,
    #[serde(default)]
    pub accept_mode: Option<AcceptMode>,
}

impl CustomerQuery {
    /// Try `input` against every searchable field, and as an order id when it
    /// parses as one, accepting any hit.
    pub fn free_text(input: impl Into<String>) -> Self {
        let input = input.into();
        Self {
            order_id: input.parse().ok(),
            online_id: Some(input.clone()),
            name: Some(input.clone()),
            address: Some(input),
            match_threshold: None,
            accept_mode: Some(AcceptMode::Any),
        }
    }

    pub fn with_threshold(mut self, threshold: i64) -> Self {
        self.match_threshold = Some(threshold);
        self
    }

    pub fn value(&self, field: CustomerField) -> Option<&str> {
        match field {
            CustomerField::OnlineId => supplied(&self.online_id),
            CustomerField::Name => supplied(&self.name),
            CustomerField::Address => supplied(&self.address),
        }
    }

    pub fn supplied_fields(&self) -> Vec<(CustomerField, &str)> {
        CustomerField::ALL
            .into_iter()
            .filter_map(|f| self.value(f).map(|v| (f, v)))
            .collect()
    }

    /// The order id to join through. Ids are assigned from 1, so zero and
    /// negative values count as unspecified.
    pub fn order_id(&self) -> Option<i32> {
        self.order_id.filter(|id| *id > 0)
    }

    pub fn has_criteria(&self) -> bool {
        self.order_id().is_some() || !self.supplied_fields().is_empty()
    }
}

/// One field (or join path) that accepted a record, with its score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchedField {
    pub field: String,
    pub score: f64,
}

/// Label of the exact order -> customer join in [`MatchedField::field`].
pub const ORDER_JOIN_FIELD: &str = "order_id";

fn feedback_label(matched: &[MatchedField]) -> String {
    let parts: Vec<String> = matched
        .iter()
        .map(|m| match m.field.as_str() {
            ORDER_JOIN_FIELD => m.field.clone(),
            _ => format!("{} ({:.2}%)", m.field, m.score),
        })
        .collect();
    format!("matched by {}", parts.join(", "))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookMatch {
    #[serde(flatten)]
    pub book: Book,
    pub matched: Vec<MatchedField>,
    /// Human-readable summary of `matched`.
    pub feedback: String,
}

impl BookMatch {
    pub fn new(book: Book, matched: Vec<MatchedField>) -> Self {
        let feedback = feedback_label(&matched);
        Self {
            book,
            matched,
            feedback,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerMatch {
    #[serde(flatten)]
    pub customer: Customer,
    pub matched: Vec<MatchedField>,
    pub feedback: String,
}

impl CustomerMatch {
    pub fn new(customer: Customer, matched: Vec<MatchedField>) -> Self {
        let feedback = feedback_label(&matched);
        Self {
            customer,
            matched,
            feedback,
        }
    }
}

/// Outcome of a lookup. An empty result is `success = false`, not an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LookupResponse<T> {
    pub success: bool,
    pub feedback: String,
    pub results: Vec<T>,
}

impl<T> LookupResponse<T> {
    pub fn from_results(kind: LookupKind, results: Vec<T>) -> Self {
        if results.is_empty() {
            return Self {
                success: false,
                feedback: kind.not_found().to_string(),
                results,
            };
        }
        Self {
            success: true,
            feedback: kind.found().to_string(),
            results,
        }
    }

    pub fn no_criteria() -> Self {
        Self {
            success: false,
            feedback: "No search criteria supplied".to_string(),
            results: Vec::new(),
        }
    }
}

/// Errors produced by the matching layer.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Every supplied field failed to fetch candidates.
    #[error("storage unavailable for all {failed} queried {kind} field(s)")]
    StorageUnavailable { kind: &'static str, failed: usize },
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
