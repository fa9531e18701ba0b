use crate::error::{ApiJson, ServerResult};
use crate::middleware::RequestId;
use crate::state::ServerState;
use axum::extract::State;
use axum::{Extension, Json};
use bookstore::{BookMatch, BookQuery, CustomerMatch, CustomerQuery, LookupResponse};
use std::sync::Arc;

/// Approximate book lookup.
///
/// `POST /api/v1/books/query`
///
/// ```json
/// { "title": "Programming", "authors": "John Doe", "match_threshold": 60 }
/// ```
///
/// Every supplied field must match unless `accept_mode` is `"any"`. An empty
/// result is a 200 with `success: false`.
pub async fn query_books(
    State(state): State<Arc<ServerState>>,
    Extension(request_id): Extension<RequestId>,
    ApiJson(query): ApiJson<BookQuery>,
) -> ServerResult<Json<LookupResponse<BookMatch>>> {
    let response = state.lookup.query_books(&query).await?;
    tracing::debug!(
        request_id = %request_id.0,
        hits = response.results.len(),
        "book query served"
    );
    Ok(Json(response))
}

/// Approximate customer lookup, optionally joined through an order id.
///
/// `POST /api/v1/customers/query`
pub async fn query_customers(
    State(state): State<Arc<ServerState>>,
    Extension(request_id): Extension<RequestId>,
    ApiJson(query): ApiJson<CustomerQuery>,
) -> ServerResult<Json<LookupResponse<CustomerMatch>>> {
    let response = state.lookup.query_customers(&query).await?;
    tracing::debug!(
        request_id = %request_id.0,
        hits = response.results.len(),
        "customer query served"
    );
    Ok(Json(response))
}
