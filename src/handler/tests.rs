//! End-to-end dispatch tests over an in-memory store and a temporary public directory

use async_trait::async_trait;
use hyper::body::Bytes;
use hyper::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use super::router::respond;
use crate::config::{AppState, Config};
use crate::ingest::multipart_fixtures::{content_type, multipart_body};
use crate::store::memory::MemoryStore;
use crate::store::{NewProduct, Product, ProductStore, StoreError};
use crate::template::Templates;

struct TestApp {
    state: AppState,
    dir: TempDir,
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl Reply {
    fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

fn templates() -> Templates {
    Templates {
        overview: "<main>{%PRODUCT_CARDS%}</main>".to_string(),
        card: "<article class=\"card {%NOT_ECO%}\"><a href=\"/product?id={%ID%}\">{%PRODUCTNAME%}</a> {%PRICE%}</article>"
            .to_string(),
        product: "<h1>{%PRODUCTNAME%}</h1><img src=\"{%IMAGE%}\"><p>{%FROM%}</p>".to_string(),
        admin: "<form action=\"/api/products\" method=\"post\"></form>".to_string(),
    }
}

fn app_with(store: Arc<dyn ProductStore>, max_body_size: u64) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let public = dir.path().join("public");
    let upload_tmp = dir.path().join("tmp");
    std::fs::create_dir_all(public.join("images")).unwrap();
    std::fs::create_dir_all(&upload_tmp).unwrap();

    let mut config = Config::from_defaults().unwrap();
    config.resources.public_dir = public;
    config.resources.upload_temp_dir = Some(upload_tmp);
    config.http.max_body_size = max_body_size;

    TestApp {
        state: AppState::new(&config, store, templates()),
        dir,
    }
}

fn app() -> TestApp {
    app_with(Arc::new(MemoryStore::new()), 10 * 1024 * 1024)
}

impl TestApp {
    fn public(&self) -> PathBuf {
        self.dir.path().join("public")
    }

    fn images(&self) -> Vec<String> {
        std::fs::read_dir(self.public().join("images"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    async fn send(&self, req: Request<Bytes>) -> Reply {
        let response = respond(req, &self.state).await;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        Reply {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    async fn get(&self, uri: &str) -> Reply {
        self.send(Request::get(uri).body(Bytes::new()).unwrap()).await
    }

    async fn submit(
        &self,
        method: Method,
        uri: &str,
        fields: &[(&str, &str)],
        image: Option<(&str, &[u8])>,
        accept_json: bool,
    ) -> Reply {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", content_type());
        if accept_json {
            builder = builder.header("accept", "application/json");
        }
        self.send(builder.body(multipart_body(fields, image)).unwrap())
            .await
    }
}

const SOLAR_LAMP: [(&str, &str); 8] = [
    ("productName", "Solar Lamp"),
    ("from", "EcoCorp"),
    ("specifications", "USB-C, 2000mAh"),
    ("quantity", "1 unit"),
    ("price", "19.99"),
    ("energySavings", "A+"),
    ("description", "Rechargeable"),
    ("eco", "true"),
];

#[tokio::test]
async fn test_solar_lamp_scenario() {
    let app = app();

    let created = app
        .submit(
            Method::POST,
            "/api/products",
            &SOLAR_LAMP,
            Some(("lamp.png", b"\x89PNG")),
            true,
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let created = created.json();
    assert_eq!(created["success"], true);
    assert_eq!(created["message"], "Product added successfully");
    let id = created["productId"].as_i64().unwrap();

    let listing = app.get("/api/products").await;
    assert_eq!(listing.status, StatusCode::OK);
    assert_eq!(listing.headers["content-type"], "application/json");
    let listing = listing.json();
    let first = &listing[0];
    assert_eq!(first["id"], id);
    assert_eq!(first["productName"], "Solar Lamp");
    assert_eq!(first["from"], "EcoCorp");
    assert_eq!(first["price"], "19.99");
    assert_eq!(first["eco"], true);
    let image_url = first["imageURL"].as_str().unwrap().to_string();
    assert!(image_url.starts_with("images/product_"));
    assert!(image_url.ends_with("_lamp.png"));

    // The uploaded file is stored and served back
    assert_eq!(app.images().len(), 1);
    let image = app.get(&format!("/{image_url}")).await;
    assert_eq!(image.status, StatusCode::OK);
    assert_eq!(image.headers["content-type"], "image/png");

    let overview = app.get("/").await;
    assert_eq!(overview.status, StatusCode::OK);
    assert!(overview.body.contains(&format!(
        "<article class=\"card \"><a href=\"/product?id={id}\">Solar Lamp</a> 19.99</article>"
    )));

    let detail = app.get(&format!("/product?id={id}")).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(
        detail.body,
        format!("<h1>Solar Lamp</h1><img src=\"{image_url}\"><p>EcoCorp</p>")
    );
}

#[tokio::test]
async fn test_browser_create_redirects_and_lists_newest_first() {
    let app = app();
    let mut second = SOLAR_LAMP;
    second[0] = ("productName", "Oat Milk");
    second[7] = ("eco", "false");

    let first = app
        .submit(Method::POST, "/api/products", &SOLAR_LAMP, None, false)
        .await;
    assert_eq!(first.status, StatusCode::FOUND);
    assert_eq!(first.headers["location"], "/");
    app.submit(Method::POST, "/api/products", &second, None, false)
        .await;

    let listing = app.get("/api/products").await.json();
    assert_eq!(listing[0]["productName"], "Oat Milk");
    assert_eq!(listing[0]["eco"], false);
    assert_eq!(listing[1]["productName"], "Solar Lamp");
    assert_eq!(
        listing[1]["imageURL"],
        crate::store::PLACEHOLDER_IMAGE_URL
    );

    let overview = app.get("/overview").await.body;
    let oat = overview.find("Oat Milk").unwrap();
    let lamp = overview.find("Solar Lamp").unwrap();
    assert!(oat < lamp);
    assert!(overview.contains("card not-eco"));
}

#[tokio::test]
async fn test_missing_field_creates_nothing() {
    let app = app();
    let fields: Vec<(&str, &str)> = SOLAR_LAMP
        .iter()
        .copied()
        .filter(|(name, _)| *name != "quantity")
        .collect();

    let reply = app
        .submit(
            Method::POST,
            "/api/products",
            &fields,
            Some(("lamp.png", b"png")),
            true,
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        reply.json()["error"],
        "Error adding product: Missing required field: quantity"
    );
    assert_eq!(app.state.store.count().await.unwrap(), 0);
    assert!(app.images().is_empty());
}

#[tokio::test]
async fn test_unstorable_price_is_a_client_error() {
    let app = app();

    for price in ["1e999999999", "1e9"] {
        let mut fields = SOLAR_LAMP;
        fields[4] = ("price", price);
        let reply = app
            .submit(
                Method::POST,
                "/api/products",
                &fields,
                Some(("lamp.png", b"png")),
                true,
            )
            .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "price {price}");
        assert_eq!(
            reply.json()["error"],
            "Error adding product: Price must not exceed 99999999.99"
        );
    }

    assert_eq!(app.state.store.count().await.unwrap(), 0);
    assert!(app.images().is_empty());
    assert_eq!(app.get("/api/products").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = app_with(Arc::new(MemoryStore::new()), 1024);
    let reply = app
        .submit(
            Method::POST,
            "/api/products",
            &SOLAR_LAMP,
            Some(("big.png", &[7u8; 4096])),
            true,
        )
        .await;
    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(reply.json()["error"].as_str().unwrap().contains("1024"));
    assert_eq!(app.state.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_product_page_statuses() {
    let app = app();

    let missing_id = app.get("/product").await;
    assert_eq!(missing_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing_id.body, "<h1>Product ID required!</h1>");

    let unknown = app.get("/product?id=999").await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body, "<h1>Product not found!</h1>");

    let malformed = app.get("/product?id=abc").await;
    assert_eq!(malformed.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_product_api() {
    let app = app();
    let reply = app.get("/api/products/999999").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.headers["content-type"], "application/json");
    assert_eq!(reply.body, r#"{"error":"Product not found"}"#);
}

#[tokio::test]
async fn test_update_keeps_image_and_delete_removes() {
    let app = app();
    let created = app
        .submit(
            Method::POST,
            "/api/products",
            &SOLAR_LAMP,
            Some(("lamp.png", b"png")),
            true,
        )
        .await
        .json();
    let id = created["productId"].as_i64().unwrap();
    let uri = format!("/api/products/{id}");
    let original = app.get(&uri).await.json();

    let mut changed = SOLAR_LAMP;
    changed[0] = ("productName", "Solar Lantern");
    changed[4] = ("price", "24.5");
    let updated = app.submit(Method::PUT, &uri, &changed, None, true).await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json()["message"], "Product updated successfully");

    let product = app.get(&uri).await.json();
    assert_eq!(product["productName"], "Solar Lantern");
    assert_eq!(product["price"], "24.50");
    assert_eq!(product["imageURL"], original["imageURL"]);
    assert_eq!(product["createdAt"], original["createdAt"]);

    let missing = app
        .submit(Method::PUT, "/api/products/424242", &changed, None, true)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let delete = || Request::delete(uri.as_str()).body(Bytes::new()).unwrap();
    let deleted = app.send(delete()).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.json()["message"], "Product deleted successfully");
    assert_eq!(app.get(&uri).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.send(delete()).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_filters_listing() {
    let app = app();
    let mut milk = SOLAR_LAMP;
    milk[0] = ("productName", "Oat Milk");
    milk[1] = ("from", "Nordic Oats");
    milk[6] = ("description", "Organic");
    app.submit(Method::POST, "/api/products", &SOLAR_LAMP, None, true)
        .await;
    app.submit(Method::POST, "/api/products", &milk, None, true)
        .await;

    let hits = app.get("/api/products?query=solar+LAMP").await.json();
    assert_eq!(hits.as_array().unwrap().len(), 1);
    assert_eq!(hits[0]["productName"], "Solar Lamp");

    let everything = app.get("/api/products?query=").await.json();
    assert_eq!(everything.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_store_failure_pages() {
    let app = app_with(Arc::new(MemoryStore::failing()), 1024);

    let overview = app.get("/").await;
    assert_eq!(overview.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(overview.headers["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(overview.body.contains("Database Error"));

    let listing = app.get("/api/products").await;
    assert_eq!(listing.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(listing.json()["error"].is_string());
}

#[tokio::test]
async fn test_failed_insert_removes_saved_image() {
    let app = app_with(Arc::new(MemoryStore::failing()), 10 * 1024 * 1024);

    let reply = app
        .submit(
            Method::POST,
            "/api/products",
            &SOLAR_LAMP,
            Some(("lamp.png", b"png")),
            true,
        )
        .await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(reply.json()["error"]
        .as_str()
        .unwrap()
        .starts_with("Error adding product:"));
    assert!(app.images().is_empty());
}

#[tokio::test]
async fn test_static_routes() {
    let app = app();
    let public = app.public();
    std::fs::create_dir_all(public.join("css")).unwrap();
    std::fs::write(public.join("css/style.css"), "body{}").unwrap();
    std::fs::write(public.join("images/lamp01.png"), "png").unwrap();

    let css = app.get("/css/style.css").await;
    assert_eq!(css.status, StatusCode::OK);
    assert_eq!(css.headers["content-type"], "text/css");
    assert_eq!(css.body, "body{}");

    assert_eq!(app.get("/public/css/style.css").await.body, "body{}");

    let direct = app.get("/lamp01.png").await;
    assert_eq!(direct.status, StatusCode::OK);
    assert_eq!(direct.headers["content-type"], "image/png");

    let missing = app.get("/css/missing.css").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body, "<h1>File not found!</h1>");

    let favicon = app.get("/favicon.ico").await;
    assert_eq!(favicon.status, StatusCode::NOT_FOUND);
    assert!(favicon.body.is_empty());

    std::fs::write(public.join("favicon.ico"), "ico").unwrap();
    let favicon = app.get("/favicon.ico").await;
    assert_eq!(favicon.status, StatusCode::OK);
    assert_eq!(favicon.headers["content-type"], "image/x-icon");
}

#[tokio::test]
async fn test_fallback_and_admin() {
    let app = app();

    let unknown = app.get("/nonexistent").await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body, "<h1>Page not found!</h1>");

    let wrong_method = app
        .send(Request::post("/admin").body(Bytes::new()).unwrap())
        .await;
    assert_eq!(wrong_method.status, StatusCode::NOT_FOUND);

    let admin = app.get("/admin").await;
    assert_eq!(admin.status, StatusCode::OK);
    assert_eq!(admin.body, templates().admin);
}

#[tokio::test]
async fn test_non_multipart_create_fails() {
    let app = app();
    let reply = app
        .send(
            Request::post("/api/products")
                .header("content-type", "application/json")
                .body(Bytes::from_static(b"{}"))
                .unwrap(),
        )
        .await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        reply.json()["error"],
        "Error adding product: Expected a multipart/form-data body"
    );
}

/// Store whose listing panics, standing in for a handler bug
struct PanickingStore;

#[async_trait]
impl ProductStore for PanickingStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }
    async fn list_all(&self) -> Result<Vec<Product>, StoreError> {
        panic!("listing exploded")
    }
    async fn get_by_id(&self, _id: i64) -> Result<Option<Product>, StoreError> {
        Ok(None)
    }
    async fn insert(&self, _product: &NewProduct) -> Result<i64, StoreError> {
        Ok(1)
    }
    async fn update(&self, _id: i64, _product: &NewProduct) -> Result<bool, StoreError> {
        Ok(false)
    }
    async fn delete(&self, _id: i64) -> Result<bool, StoreError> {
        Ok(false)
    }
    async fn search(&self, _text: &str) -> Result<Vec<Product>, StoreError> {
        Ok(Vec::new())
    }
    async fn count(&self) -> Result<i64, StoreError> {
        Ok(0)
    }
}

#[tokio::test]
async fn test_handler_panic_becomes_500_and_server_keeps_serving() {
    let app = app_with(Arc::new(PanickingStore), 1024);

    let reply = app.get("/api/products").await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        reply.json()["error"],
        "Handler panicked: listing exploded"
    );

    let page = app.get("/").await;
    assert_eq!(page.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(page.body.contains("listing exploded"));

    assert_eq!(app.get("/api/products/1").await.status, StatusCode::NOT_FOUND);
}
