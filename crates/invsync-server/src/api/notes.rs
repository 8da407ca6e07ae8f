use axum::{
    extract::{Query, State},
    Extension, Json,
};
use invsync_db::ReconciliationNoteRow;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct NotesQuery {
    pub limit: Option<i64>,
}

/// Lists unresolved reconciliation notes, oldest first.
pub(super) async fn list_reconciliation_notes(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<NotesQuery>,
) -> Result<Json<ApiResponse<Vec<ReconciliationNoteRow>>>, ApiError> {
    let rows =
        invsync_db::list_open_reconciliation_notes(&state.pool, normalize_limit(query.limit))
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows,
        meta: ResponseMeta::new(req_id.0),
    }))
}
