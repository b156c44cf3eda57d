//! The HTML shell.

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// GET / - Page that fetches the layout and renders it client-side
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}
