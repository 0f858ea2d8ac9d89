//! Server-rendered HTML pages

use hyper::StatusCode;

use crate::config::AppState;
use crate::error::AppError;
use crate::handler::router::query_param;
use crate::http::{self, HttpResponse};

/// Listing page: every product rendered as a card, newest first
pub async fn overview(state: &AppState) -> Result<HttpResponse, AppError> {
    let products = state.store.list_all().await?;
    let html = state.templates.render_overview(&products);
    Ok(http::build_html_response(StatusCode::OK, html))
}

/// Detail page for `/product?id=<id>`
pub async fn product(query: Option<&str>, state: &AppState) -> Result<HttpResponse, AppError> {
    let id = query_param(query, "id")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Product ID required!".to_string()))?;

    // A malformed id can never match a stored product
    let id: i64 = id
        .parse()
        .map_err(|_| AppError::not_found("Product not found!"))?;

    let product = state
        .store
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found!"))?;

    Ok(http::build_html_response(
        StatusCode::OK,
        state.templates.render_product(&product),
    ))
}

/// Admin form, served as-is
pub fn admin(state: &AppState) -> HttpResponse {
    http::build_html_response(StatusCode::OK, state.templates.admin.clone())
}
