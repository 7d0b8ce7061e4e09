//! Catalog endpoint stand-in.

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use serde_json::{Value, json};

/// Catalog body in the wire format, including one item with missing fields.
#[must_use]
pub fn sample_catalog() -> Value {
    json!([
        {
            "stringResourceId": "Banana Robusta",
            "itemCategoryId": "Fresh Fruits",
            "itemQuantity": "1 Kg",
            "item_price": 100,
            "imageResourceId": "https://img.example.com/banana.png"
        },
        {
            "stringResourceId": "Pepsi",
            "itemCategoryId": "Beverages",
            "itemQuantity": "750 ml",
            "item_price": 40,
            "imageResourceId": "https://img.example.com/pepsi.png"
        },
        {
            "stringResourceId": "Shimla Apple",
            "itemCategoryId": "fresh fruits",
            "itemQuantity": "1 Kg",
            "item_price": 250,
            "imageResourceId": "https://img.example.com/apple.png"
        },
        {
            "stringResourceId": "Mystery Item",
            "itemCategoryId": "Munchies"
        }
    ])
}

/// Router serving:
///
/// - `/items.json` - `body`
/// - `/broken.json` - a body that is not JSON
/// - `/error.json` - a 500
#[must_use]
pub fn router(body: Value) -> Router {
    Router::new()
        .route("/items.json", get(move || async move { axum::Json(body) }))
        .route("/broken.json", get(|| async { "<html>maintenance</html>" }))
        .route(
            "/error.json",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream failure") }),
        )
}
