//! Seams between the reconciler and the systems it talks to.
//!
//! Production uses [`PgItemStore`] as both the item source and the link
//! writer, and [`ShopifyAdminClient`] as the catalog client. Tests substitute
//! in-memory implementations.

use std::future::Future;

use invsync_core::{CandidateFilter, ExternalProductPayload, ItemRecord};
use invsync_db::{DbError, PgItemStore};
use invsync_shopify::{CatalogError, CreatedProduct, ShopifyAdminClient, UpdatedProduct};

/// Paginated read access to candidate items.
pub trait ItemSource: Sync {
    /// Returns up to `limit` items matching `filter` with
    /// `internal_id > after`, ordered by `internal_id`.
    fn fetch_page(
        &self,
        filter: &CandidateFilter,
        after: Option<i64>,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<ItemRecord>, DbError>> + Send;
}

/// Create/update calls against the external catalog.
pub trait CatalogClient: Sync {
    fn create(
        &self,
        payload: &ExternalProductPayload,
    ) -> impl Future<Output = Result<CreatedProduct, CatalogError>> + Send;

    fn update(
        &self,
        remote_id: &str,
        payload: &ExternalProductPayload,
    ) -> impl Future<Output = Result<UpdatedProduct, CatalogError>> + Send;
}

/// Single-field write-back of the external id onto a source item.
pub trait LinkWriter: Sync {
    fn set_external_id(
        &self,
        source_item_id: i64,
        external_id: &str,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Records a remote product that exists but could not be linked, so the
    /// id is kept for follow-up.
    fn record_unlinked_product(
        &self,
        source_item_id: i64,
        external_id: &str,
        reason: &str,
    ) -> impl Future<Output = Result<(), DbError>> + Send;
}

impl ItemSource for PgItemStore {
    async fn fetch_page(
        &self,
        filter: &CandidateFilter,
        after: Option<i64>,
        limit: u32,
    ) -> Result<Vec<ItemRecord>, DbError> {
        self.fetch_candidate_page(filter, after, limit).await
    }
}

impl LinkWriter for PgItemStore {
    async fn set_external_id(&self, source_item_id: i64, external_id: &str) -> Result<(), DbError> {
        self.set_external_product_id(source_item_id, external_id)
            .await
    }

    async fn record_unlinked_product(
        &self,
        source_item_id: i64,
        external_id: &str,
        reason: &str,
    ) -> Result<(), DbError> {
        invsync_db::insert_reconciliation_note(self.pool(), source_item_id, external_id, reason)
            .await
            .map(|_| ())
    }
}

impl CatalogClient for ShopifyAdminClient {
    async fn create(&self, payload: &ExternalProductPayload) -> Result<CreatedProduct, CatalogError> {
        self.create_product(payload).await
    }

    async fn update(
        &self,
        remote_id: &str,
        payload: &ExternalProductPayload,
    ) -> Result<UpdatedProduct, CatalogError> {
        self.update_product(remote_id, payload).await
    }
}
