use serde::{Deserialize, Serialize};

/// A catalogue entry.
///
/// `keywords` and `authors` hold comma-joined lists exactly as they were
/// stored; they are never trimmed or re-joined by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Book {
    #[serde(default)]
    pub id: i32,
    pub book_no: String,
    pub title: String,
    #[serde(default)]
    pub publisher_name: String,
    #[serde(default)]
    pub price: i32,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub stock_quantity: i32,
}

/// A registered customer together with the orders placed under its online id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Customer {
    #[serde(default)]
    pub id: i32,
    pub online_id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub account_balance: i32,
    #[serde(default)]
    pub credit_level: i32,
    /// Preloaded join; ignored on insert, filled on every read.
    #[serde(default)]
    pub orders: Vec<CustomerOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CustomerOrder {
    #[serde(default)]
    pub id: i32,
    pub order_date: String,
    pub customer_online_id: String,
    pub book_no: String,
    pub book_count: i32,
    #[serde(default)]
    pub price: i32,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub status: String,
}

/// Searchable string fields of a [`Book`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookField {
    BookNo,
    Title,
    PublisherName,
    Keywords,
    Authors,
}

impl BookField {
    pub const ALL: [BookField; 5] = [
        BookField::BookNo,
        BookField::Title,
        BookField::PublisherName,
        BookField::Keywords,
        BookField::Authors,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BookField::BookNo => "book_no",
            BookField::Title => "title",
            BookField::PublisherName => "publisher_name",
            BookField::Keywords => "keywords",
            BookField::Authors => "authors",
        }
    }

    /// Comma-delimited fields are compared token by token.
    pub fn is_multi_valued(self) -> bool {
        matches!(self, BookField::Keywords | BookField::Authors)
    }

    pub fn value(self, book: &Book) -> &str {
        match self {
            BookField::BookNo => &book.book_no,
            BookField::Title => &book.title,
            BookField::PublisherName => &book.publisher_name,
            BookField::Keywords => &book.keywords,
            BookField::Authors => &book.authors,
        }
    }
}

/// Searchable string fields of a [`Customer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerField {
    OnlineId,
    Name,
    Address,
}

impl CustomerField {
    pub const ALL: [CustomerField; 3] = [
        CustomerField::OnlineId,
        CustomerField::Name,
        CustomerField::Address,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CustomerField::OnlineId => "online_id",
            CustomerField::Name => "name",
            CustomerField::Address => "address",
        }
    }

    pub fn is_multi_valued(self) -> bool {
        false
    }

    pub fn value(self, customer: &Customer) -> &str {
        match self {
            CustomerField::OnlineId => &customer.online_id,
            CustomerField::Name => &customer.name,
            CustomerField::Address => &customer.address,
        }
    }
}

impl std::fmt::Display for BookField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::fmt::Display for CustomerField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
