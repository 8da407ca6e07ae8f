use axum::{extract::State, Extension, Json};
use invsync_core::{EventKind, TriggerEvent};
use invsync_sync::{run_recorded_trigger, RecordedTrigger};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

const TRIGGER_SOURCE: &str = "api";

#[derive(Debug, Deserialize)]
pub(super) struct TriggerRequest {
    pub record_id: i64,
    pub event_kind: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ItemFailureItem {
    internal_id: i64,
    kind: &'static str,
    remote_id: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
pub(super) struct TriggerResult {
    status: &'static str,
    message: Option<String>,
    run_id: Option<Uuid>,
    items_seen: usize,
    items_created: usize,
    items_updated: usize,
    items_failed: usize,
    failures: Vec<ItemFailureItem>,
}

impl From<RecordedTrigger> for TriggerResult {
    fn from(recorded: RecordedTrigger) -> Self {
        let outcome = &recorded.outcome;
        let report = outcome.report();
        Self {
            status: outcome.status(),
            message: outcome.message(),
            run_id: recorded.run_id,
            items_seen: report.map_or(0, |r| r.seen()),
            items_created: report.map_or(0, |r| r.created()),
            items_updated: report.map_or(0, |r| r.updated()),
            items_failed: report.map_or(0, |r| r.failed()),
            failures: report
                .into_iter()
                .flat_map(|r| r.failures())
                .map(|(internal_id, failure)| ItemFailureItem {
                    internal_id,
                    kind: failure.kind(),
                    remote_id: failure.remote_id().map(ToOwned::to_owned),
                    message: failure.to_string(),
                })
                .collect(),
        }
    }
}

/// Runs a reconciliation pass for a record event.
///
/// Sync problems are reported in the body with a `200`; only a malformed
/// request is rejected.
pub(super) async fn handle_trigger(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<TriggerRequest>,
) -> Result<Json<ApiResponse<TriggerResult>>, ApiError> {
    let kind = body
        .event_kind
        .parse::<EventKind>()
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let event = TriggerEvent {
        record_id: body.record_id,
        kind,
    };
    let recorded =
        run_recorded_trigger(&state.pool, state.reconciler.as_ref(), event, TRIGGER_SOURCE).await;

    Ok(Json(ApiResponse {
        data: TriggerResult::from(recorded),
        meta: ResponseMeta::new(req_id.0),
    }))
}
