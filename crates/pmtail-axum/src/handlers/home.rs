//! Embedded viewer page.

use axum::response::Html;

/// The viewer page, compiled into the binary so the server has no
/// runtime asset dependency. Deployments that want their own frontend
/// use the static-dir router instead.
const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// `GET /` — the log viewer page.
pub async fn page() -> Html<&'static str> {
    Html(INDEX_HTML)
}
