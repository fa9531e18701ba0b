//! Record inserts for the in-memory store.
//!
//! Validation mirrors the back-office forms: required strings must be
//! non-empty and amounts must be positive. Failures are 400s; duplicate keys
//! are 409s.

use crate::error::{ApiJson, ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use bookstore::{Book, CatalogStore, Customer, CustomerOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub success: bool,
    pub feedback: String,
    pub id: i32,
}

impl CreatedResponse {
    fn new(feedback: &str, id: i32) -> (StatusCode, Json<Self>) {
        (
            StatusCode::CREATED,
            Json(Self {
                success: true,
                feedback: feedback.to_string(),
                id,
            }),
        )
    }
}

fn require(value: &str, message: &str) -> ServerResult<()> {
    if value.is_empty() {
        return Err(ServerError::BadRequest(message.to_string()));
    }
    Ok(())
}

fn require_positive(value: i32, message: &str) -> ServerResult<()> {
    if value <= 0 {
        return Err(ServerError::BadRequest(message.to_string()));
    }
    Ok(())
}

fn validate_book(book: &Book) -> ServerResult<()> {
    require(&book.book_no, "BookNo is required")?;
    require(&book.title, "Title is required")?;
    require(&book.publisher_name, "Publisher name is required")?;
    require_positive(book.price, "Price must be greater than 0")?;
    require_positive(book.stock_quantity, "Stock quantity must be greater than 0")
}

fn validate_customer(customer: &Customer) -> ServerResult<()> {
    require(&customer.online_id, "Online ID is required")?;
    require(&customer.name, "Name is required")?;
    require(&customer.address, "Address is required")
}

fn validate_order(order: &CustomerOrder) -> ServerResult<()> {
    require(&order.order_date, "Order date is required")?;
    require(&order.customer_online_id, "CustomerOnlineId is required")?;
    require(&order.book_no, "Book No is required")?;
    require_positive(order.book_count, "Book count must be greater than 0")?;
    require_positive(order.price, "Price must be greater than 0")?;
    require(&order.address, "Address is required")?;
    require(&order.status, "Status is required")
}

/// `POST /api/v1/books`
pub async fn insert_book(
    State(state): State<Arc<ServerState>>,
    ApiJson(book): ApiJson<Book>,
) -> ServerResult<(StatusCode, Json<CreatedResponse>)> {
    validate_book(&book)?;
    let id = state.lookup.store().insert_book(book)?;
    Ok(CreatedResponse::new("Book created successfully", id))
}

/// `POST /api/v1/customers`
pub async fn insert_customer(
    State(state): State<Arc<ServerState>>,
    ApiJson(customer): ApiJson<Customer>,
) -> ServerResult<(StatusCode, Json<CreatedResponse>)> {
    validate_customer(&customer)?;
    let id = state.lookup.store().insert_customer(customer)?;
    Ok(CreatedResponse::new("Customer created successfully", id))
}

/// `POST /api/v1/orders`; the ordering customer must already exist.
pub async fn insert_order(
    State(state): State<Arc<ServerState>>,
    ApiJson(order): ApiJson<CustomerOrder>,
) -> ServerResult<(StatusCode, Json<CreatedResponse>)> {
    validate_order(&order)?;
    let store = state.lookup.store();
    if store
        .find_customer_by_online_id(&order.customer_online_id)
        .await?
        .is_none()
    {
        return Err(ServerError::BadRequest("Customer not found".to_string()));
    }
    let id = store.insert_order(order)?;
    Ok(CreatedResponse::new("Customer order created successfully", id))
}
