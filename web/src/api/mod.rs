use crate::state::AppState;
use axum::{Router, response::Html, routing::get};

mod sample;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .nest("/samples", sample::router())
}

async fn root() -> Html<String> {
    Html("sampleweb API root here".to_string())
}
