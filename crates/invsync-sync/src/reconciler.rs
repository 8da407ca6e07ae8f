//! The reconciliation pass: page through candidates, create or update each
//! one remotely, and link newly created products back to their source item.

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use invsync_core::{
    map_item, AppConfig, CandidateFilter, ExternalProductPayload, ItemRecord, LinkState,
    TriggerEvent,
};
use invsync_shopify::CatalogError;
use tokio::sync::Mutex;

use crate::collaborators::{CatalogClient, ItemSource, LinkWriter};
use crate::error::{ItemFailure, LinkWriteError, SyncError};
use crate::outcome::{ItemAction, ItemOutcome, ReconcileReport, TriggerOutcome};
use crate::pages::CandidatePages;

/// Added on top of the per-request budget so the outer bound never cuts a
/// client retry short.
const CALL_TIMEOUT_SLACK: Duration = Duration::from_secs(30);

/// Tuning for a [`Reconciler`].
#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    pub page_size: u32,
    /// Total attempts for the link write-back, including the first.
    pub link_write_attempts: u32,
    /// Delay before the second link attempt; grows linearly per attempt.
    pub link_retry_delay: Duration,
    /// Items of one page reconciled concurrently. `1` is strictly sequential.
    pub max_concurrent_items: usize,
    /// Upper bound on any single collaborator call.
    pub call_timeout: Duration,
}

impl ReconcilerSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        let request_budget = config
            .request_timeout_secs
            .saturating_mul(u64::from(config.max_retries) + 1);
        Self {
            page_size: config.page_size,
            link_write_attempts: config.link_write_attempts,
            link_retry_delay: Duration::from_millis(config.retry_backoff_base_ms),
            max_concurrent_items: config.max_concurrent_items,
            call_timeout: Duration::from_secs(request_budget) + CALL_TIMEOUT_SLACK,
        }
    }
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            link_write_attempts: 3,
            link_retry_delay: Duration::from_millis(500),
            max_concurrent_items: 1,
            call_timeout: Duration::from_secs(60),
        }
    }
}

/// Drives reconciliation passes over a source, a catalog and a link writer.
///
/// Passes are serialized: a trigger arriving while a pass is running waits
/// for it to finish and then runs its own pass, so two passes never race to
/// create the same unlinked item.
pub struct Reconciler<S, C, L> {
    source: S,
    catalog: C,
    links: L,
    filter: CandidateFilter,
    settings: ReconcilerSettings,
    pass_lock: Mutex<()>,
}

impl<S, C, L> Reconciler<S, C, L>
where
    S: ItemSource,
    C: CatalogClient,
    L: LinkWriter,
{
    pub fn new(source: S, catalog: C, links: L, settings: ReconcilerSettings) -> Self {
        Self {
            source,
            catalog,
            links,
            filter: CandidateFilter::default(),
            settings,
            pass_lock: Mutex::new(()),
        }
    }

    /// Entry point for a record event. Only create and edit events start a
    /// pass. Failures are logged here with the triggering record and
    /// returned as data; this never errors.
    pub async fn handle_trigger(&self, event: TriggerEvent) -> TriggerOutcome {
        let record_id = event.record_id;
        let event_kind = event.kind.as_str();

        if !event.kind.triggers_sync() {
            tracing::debug!(record_id, event_kind, "event kind does not trigger a sync");
            return TriggerOutcome::Skipped { kind: event.kind };
        }

        tracing::info!(record_id, event_kind, "reconciliation pass triggered");

        match self.run_pass().await {
            Ok(report) => {
                for (internal_id, failure) in report.failures() {
                    tracing::error!(
                        record_id,
                        event_kind,
                        internal_id,
                        failure_kind = failure.kind(),
                        remote_id = failure.remote_id(),
                        error = %failure,
                        "item failed to sync"
                    );
                }
                if report.is_clean() {
                    tracing::info!(
                        record_id,
                        event_kind,
                        seen = report.seen(),
                        created = report.created(),
                        updated = report.updated(),
                        "reconciliation pass complete"
                    );
                } else {
                    tracing::warn!(
                        record_id,
                        event_kind,
                        seen = report.seen(),
                        failed = report.failed(),
                        "reconciliation pass complete with failures"
                    );
                }
                TriggerOutcome::Completed(report)
            }
            Err(e) => {
                tracing::error!(record_id, event_kind, error = %e, "reconciliation pass aborted");
                TriggerOutcome::Aborted(e)
            }
        }
    }

    /// Runs one full pass over the candidate set.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] only when candidate selection fails. Outcomes of
    /// items already processed in earlier pages are discarded in that case;
    /// their remote effects and link writes stand.
    pub async fn run_pass(&self) -> Result<ReconcileReport, SyncError> {
        let _pass = self.pass_lock.lock().await;

        let mut pages = CandidatePages::new(
            &self.source,
            &self.filter,
            self.settings.page_size,
            self.settings.call_timeout,
        );
        let concurrency = self.settings.max_concurrent_items.max(1);
        let mut report = ReconcileReport::default();

        while let Some(page) = pages.next_page().await? {
            tracing::debug!(items = page.len(), "reconciling candidate page");
            let outcomes: Vec<ItemOutcome> = stream::iter(page)
                .map(|item| self.reconcile_item(item))
                .buffered(concurrency)
                .collect()
                .await;
            report.outcomes.extend(outcomes);
        }

        report.pages = pages.pages_fetched();
        Ok(report)
    }

    /// Reconciles one item: update when linked, otherwise create and link.
    /// Failures are captured in the returned outcome.
    pub async fn reconcile_item(&self, item: ItemRecord) -> ItemOutcome {
        let payload = map_item(&item);
        let internal_id = item.internal_id;

        let action = match item.link_state() {
            LinkState::Linked(remote_id) => self.update_linked(internal_id, remote_id, &payload).await,
            LinkState::Unlinked => self.create_and_link(internal_id, &payload).await,
        };

        ItemOutcome {
            internal_id,
            action,
        }
    }

    async fn update_linked(
        &self,
        internal_id: i64,
        remote_id: &str,
        payload: &ExternalProductPayload,
    ) -> ItemAction {
        match self
            .call_catalog("update product", self.catalog.update(remote_id, payload))
            .await
        {
            Ok(updated) => {
                tracing::debug!(internal_id, remote_id, "updated remote product");
                ItemAction::Updated {
                    remote_id: updated.remote_id,
                }
            }
            Err(failure) => ItemAction::Failed(failure),
        }
    }

    async fn create_and_link(&self, internal_id: i64, payload: &ExternalProductPayload) -> ItemAction {
        let created = match self
            .call_catalog("create product", self.catalog.create(payload))
            .await
        {
            Ok(created) => created,
            Err(failure) => return ItemAction::Failed(failure),
        };
        let remote_id = created.remote_id;
        tracing::debug!(internal_id, remote_id = %remote_id, "created remote product");

        match self.write_link(internal_id, &remote_id).await {
            Ok(()) => ItemAction::Created { remote_id },
            Err(source) => {
                let note_recorded = self.record_unlinked(internal_id, &remote_id, &source).await;
                ItemAction::Failed(ItemFailure::WriteBack {
                    remote_id,
                    note_recorded,
                    source,
                })
            }
        }
    }

    async fn call_catalog<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, CatalogError>>,
    ) -> Result<T, ItemFailure> {
        match tokio::time::timeout(self.settings.call_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ItemFailure::from_catalog(operation, e)),
            Err(_) => Err(ItemFailure::Timeout {
                operation,
                after: self.settings.call_timeout,
            }),
        }
    }

    async fn write_link(&self, internal_id: i64, remote_id: &str) -> Result<(), LinkWriteError> {
        let attempts = self.settings.link_write_attempts.max(1);
        let mut attempt = 1;
        loop {
            let result = match tokio::time::timeout(
                self.settings.call_timeout,
                self.links.set_external_id(internal_id, remote_id),
            )
            .await
            {
                Ok(write) => write.map_err(LinkWriteError::from),
                Err(_) => Err(LinkWriteError::Timeout(self.settings.call_timeout)),
            };

            match result {
                Ok(()) => return Ok(()),
                Err(e) if attempt < attempts && e.is_retriable() => {
                    tracing::warn!(
                        internal_id,
                        remote_id,
                        attempt,
                        error = %e,
                        "link write failed, retrying"
                    );
                    tokio::time::sleep(self.settings.link_retry_delay * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Keeps the remote id of a product that could not be linked. Returns
    /// whether the note was stored.
    async fn record_unlinked(
        &self,
        internal_id: i64,
        remote_id: &str,
        cause: &LinkWriteError,
    ) -> bool {
        let reason = cause.to_string();
        let stored = tokio::time::timeout(
            self.settings.call_timeout,
            self.links
                .record_unlinked_product(internal_id, remote_id, &reason),
        )
        .await;

        match stored {
            Ok(Ok(())) => {
                tracing::warn!(internal_id, remote_id, "recorded unlinked remote product");
                true
            }
            Ok(Err(e)) => {
                tracing::error!(
                    internal_id,
                    remote_id,
                    error = %e,
                    "could not record unlinked remote product; link it manually"
                );
                false
            }
            Err(_) => {
                tracing::error!(
                    internal_id,
                    remote_id,
                    "recording unlinked remote product timed out; link it manually"
                );
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod tests;
