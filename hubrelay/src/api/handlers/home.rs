use axum::response::Json;

use crate::api::models::relay::StatusResponse;

pub async fn home() -> Json<StatusResponse> {
    Json(StatusResponse {
        res: "Hello!".to_string(),
    })
}
