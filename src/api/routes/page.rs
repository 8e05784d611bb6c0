//! Dashboard Page
//!
//! - GET / - The dashboard UI. All data arrives over `/ws`.

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../../assets/index.html");

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
