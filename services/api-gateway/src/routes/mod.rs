use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers::*, AppState};

pub fn create_report_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(upload_form))
        .route("/generate_excel/", post(generate_excel))
}
