use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use invsync_db::SyncRunRow;
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SyncRunsQuery {
    pub limit: Option<i64>,
}

pub(super) async fn list_sync_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SyncRunsQuery>,
) -> Result<Json<ApiResponse<Vec<SyncRunRow>>>, ApiError> {
    let rows = invsync_db::list_sync_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_sync_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
) -> Result<Json<ApiResponse<SyncRunRow>>, ApiError> {
    let row = invsync_db::get_sync_run(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("sync run {public_id} not found"),
            )
        })?;

    Ok(Json(ApiResponse {
        data: row,
        meta: ResponseMeta::new(req_id.0),
    }))
}
