//! REST mirror of the cold-spray fetch, mainly for dashboard
//! development and debugging without a WebSocket client.

use axum::extract::{Query, State};
use axum::{routing::get, Json, Router};
use chrono::NaiveDate;
use remanet_core::protocol::FILTER_DATE_FORMAT;
use remanet_core::telemetry::Reading;
use remanet_core::thresholds::{self, Notification};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Query parameters for `GET /data`.
#[derive(Deserialize)]
pub struct DataQuery {
    /// Optional `MM/DD/YYYY` date filter; absent means the live window.
    pub filter_date: Option<String>,
}

/// Response payload: the batch plus the notifications it produced.
#[derive(Serialize)]
pub struct DataResponse {
    pub data: Vec<Reading>,
    pub notifications: Vec<Notification>,
}

/// GET /data -- fetch a cold-spray batch with optional date filtering.
async fn get_data(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> AppResult<Json<DataResponse>> {
    let filter_date = match query.filter_date {
        Some(raw) => Some(
            NaiveDate::parse_from_str(&raw, FILTER_DATE_FORMAT).map_err(|_| {
                AppError::BadRequest(format!("filter_date {raw:?} does not match MM/DD/YYYY"))
            })?,
        ),
        None => None,
    };

    let data = state.source.fetch_cold_spray(filter_date).await;
    let notifications = thresholds::evaluate(&data, &state.config.alert_thresholds);

    Ok(Json(DataResponse {
        data,
        notifications,
    }))
}

/// Mount data routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/data", get(get_data))
}
