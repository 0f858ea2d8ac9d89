//! JSON product API
//!
//! `GET/POST /api/products` and `GET/PUT/DELETE /api/products/<id>`.

use hyper::body::Bytes;
use hyper::{HeaderMap, Request, StatusCode};
use serde_json::json;

use crate::config::AppState;
use crate::error::AppError;
use crate::handler::router::query_param;
use crate::http::{self, HttpResponse};
use crate::ingest::{SavedImage, Submission};
use crate::logger;

const NOT_FOUND: &str = "Product not found";

/// List every product, or only those matching `?query=`
pub async fn list(query: Option<&str>, state: &AppState) -> Result<HttpResponse, AppError> {
    let search = query_param(query, "query").filter(|q| !q.trim().is_empty());
    let products = match search {
        Some(text) => state.store.search(text.trim()).await?,
        None => state.store.list_all().await?,
    };
    Ok(http::build_json_response(StatusCode::OK, &products))
}

pub async fn get(id: &str, state: &AppState) -> Result<HttpResponse, AppError> {
    let product = state
        .store
        .get_by_id(parse_id(id)?)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    Ok(http::build_json_response(StatusCode::OK, &product))
}

/// Create a product from a multipart submission.
///
/// Answers 201 with JSON when the client accepts JSON, otherwise redirects
/// the browser back to the listing.
pub async fn create(req: &Request<Bytes>, state: &AppState) -> Result<HttpResponse, AppError> {
    let Submission { fields, image } = receive(req, state)
        .await
        .map_err(|e| e.during("adding product"))?;

    let product = fields.into_new_product(image.as_ref().map(|image| image.url.clone()));

    let id = match state.store.insert(&product).await {
        Ok(id) => id,
        Err(e) => {
            discard_image(image.as_ref()).await;
            return Err(AppError::from(e).during("adding product"));
        }
    };
    logger::log_info(&format!("Product {id} created: {}", product.product_name));

    if accepts_json(req.headers()) {
        Ok(http::build_json_response(
            StatusCode::CREATED,
            &json!({
                "success": true,
                "message": "Product added successfully",
                "productId": id,
            }),
        ))
    } else {
        Ok(http::build_redirect_response("/"))
    }
}

/// Replace a product's attributes, keeping its image unless a new one is uploaded
pub async fn update(
    id: &str,
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(id)?;
    let existing = state
        .store
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    let Submission { fields, image } = receive(req, state)
        .await
        .map_err(|e| e.during("updating product"))?;

    let image_url = image
        .as_ref()
        .map(|image| image.url.clone())
        .or(existing.image_url);
    let product = fields.into_new_product(image_url);

    match state.store.update(id, &product).await {
        Ok(true) => {}
        Ok(false) => {
            discard_image(image.as_ref()).await;
            return Err(AppError::not_found(NOT_FOUND));
        }
        Err(e) => {
            discard_image(image.as_ref()).await;
            return Err(AppError::from(e).during("updating product"));
        }
    }
    logger::log_info(&format!("Product {id} updated"));

    Ok(http::build_json_response(
        StatusCode::OK,
        &json!({ "success": true, "message": "Product updated successfully" }),
    ))
}

pub async fn delete(id: &str, state: &AppState) -> Result<HttpResponse, AppError> {
    let id = parse_id(id)?;
    if !state.store.delete(id).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }
    logger::log_info(&format!("Product {id} deleted"));

    Ok(http::build_json_response(
        StatusCode::OK,
        &json!({ "success": true, "message": "Product deleted successfully" }),
    ))
}

async fn receive(req: &Request<Bytes>, state: &AppState) -> Result<Submission, AppError> {
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok());
    Ok(state
        .ingestor
        .ingest(content_type, req.body().clone())
        .await?)
}

/// Remove an image whose product was never stored
async fn discard_image(image: Option<&SavedImage>) {
    if let Some(image) = image {
        image.remove().await;
    }
}

/// Ids that are not integers cannot exist
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| AppError::not_found(NOT_FOUND))
}

fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get_all("accept")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("application/json"))
}
