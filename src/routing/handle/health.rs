use axum::response::IntoResponse;

use dp_api::{Health, Json};

pub async fn get() -> impl IntoResponse {
    Json(Health::ok())
}
