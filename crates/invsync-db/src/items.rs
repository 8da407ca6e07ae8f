//! Inventory item reads (candidate selection) and the link write-back.
//!
//! The column holding the external product id is configurable
//! ([`LinkField`]); it is validated as an identifier before it is spliced
//! into SQL, and the same name is used for the projection and the update so
//! the two sides can never disagree.

use invsync_core::{CandidateFilter, ItemRecord, LinkField, SourceNumber, NUMERIC_TEXT_PATTERN};
use sqlx::PgPool;

use crate::DbError;

/// A row from `inventory_items`, limited to the projected columns.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    pub internal_id: i64,
    pub item_code: String,
    pub display_name: Option<String>,
    pub sales_description: Option<String>,
    pub quantity_available: Option<String>,
    pub average_cost: Option<String>,
    pub external_product_id: Option<String>,
}

impl From<ItemRow> for ItemRecord {
    fn from(row: ItemRow) -> Self {
        Self {
            internal_id: row.internal_id,
            item_code: row.item_code,
            display_name: row.display_name.unwrap_or_default(),
            sales_description: row.sales_description,
            quantity_available: SourceNumber::parse(row.quantity_available.as_deref()),
            average_cost: SourceNumber::parse(row.average_cost.as_deref()),
            external_product_id: row.external_product_id,
        }
    }
}

/// Postgres-backed item source and link writer.
#[derive(Debug, Clone)]
pub struct PgItemStore {
    pool: PgPool,
    link_field: LinkField,
}

impl PgItemStore {
    #[must_use]
    pub fn new(pool: PgPool, link_field: LinkField) -> Self {
        Self { pool, link_field }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn select_columns(&self) -> String {
        format!(
            "internal_id, item_code, display_name, sales_description, \
             quantity_available, average_cost, {link} AS external_product_id",
            link = self.link_field
        )
    }

    /// Fetches one page of candidate items with `internal_id > after`,
    /// ordered by `internal_id`.
    ///
    /// Keyset pagination: callers pass the last `internal_id` of the previous
    /// page as `after`. A page shorter than `limit` is the last one.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the query fails.
    pub async fn fetch_candidate_page(
        &self,
        filter: &CandidateFilter,
        after: Option<i64>,
        limit: u32,
    ) -> Result<Vec<ItemRecord>, DbError> {
        let sql = format!(
            "SELECT {columns} FROM inventory_items \
             WHERE item_kind = $1 \
               AND (CASE WHEN quantity_available ~ $2 \
                         THEN btrim(quantity_available)::numeric END) > $3 \
               AND (CASE WHEN average_cost ~ $2 \
                         THEN btrim(average_cost)::numeric END) >= $4 \
               AND ($5::bigint IS NULL OR internal_id > $5) \
             ORDER BY internal_id \
             LIMIT $6",
            columns = self.select_columns()
        );

        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(filter.kind.as_str())
            .bind(NUMERIC_TEXT_PATTERN)
            .bind(filter.min_quantity_exclusive)
            .bind(filter.min_cost_inclusive)
            .bind(after)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ItemRecord::from).collect())
    }

    /// Stores `external_id` in the link column of one item. No other column
    /// is touched.
    ///
    /// The update only applies while the link is still empty. Writing the id
    /// the item is already linked to succeeds, so retries are safe.
    ///
    /// # Errors
    ///
    /// - [`DbError::NotFound`] if no item has `internal_id`.
    /// - [`DbError::AlreadyLinked`] if the item is linked to a different id.
    /// - [`DbError::Sqlx`] if a query fails.
    pub async fn set_external_product_id(
        &self,
        internal_id: i64,
        external_id: &str,
    ) -> Result<(), DbError> {
        let link = &self.link_field;
        let sql = format!(
            "UPDATE inventory_items SET {link} = $1 \
             WHERE internal_id = $2 AND COALESCE(btrim({link}), '') = ''"
        );
        let result = sqlx::query(&sql)
            .bind(external_id)
            .bind(internal_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let existing_sql = format!("SELECT {link} FROM inventory_items WHERE internal_id = $1");
        let existing: Option<Option<String>> = sqlx::query_scalar(&existing_sql)
            .bind(internal_id)
            .fetch_optional(&self.pool)
            .await?;

        match existing {
            None => Err(DbError::NotFound),
            Some(Some(current)) if current.trim() == external_id => Ok(()),
            Some(current) => Err(DbError::AlreadyLinked {
                internal_id,
                existing: current.unwrap_or_default(),
            }),
        }
    }
}
