use std::time::Duration;

use invsync_db::DbError;
use invsync_shopify::CatalogError;
use thiserror::Error;

/// Failure that aborts a whole reconciliation pass.
///
/// Only candidate selection can abort a pass; per-item failures are
/// reported through [`ItemFailure`] and never propagate here.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("candidate query failed: {0}")]
    Query(#[from] DbError),

    #[error("candidate query timed out after {0:?}")]
    QueryTimeout(Duration),

    #[error("candidate page after internal_id {after:?} did not advance the cursor")]
    PaginationStalled { after: Option<i64> },
}

/// Failure writing the external id back onto the source item.
#[derive(Debug, Error)]
pub enum LinkWriteError {
    #[error(transparent)]
    Store(#[from] DbError),

    #[error("link write timed out after {0:?}")]
    Timeout(Duration),
}

impl LinkWriteError {
    /// `AlreadyLinked` and `NotFound` will fail the same way on every attempt.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        !matches!(
            self,
            Self::Store(DbError::AlreadyLinked { .. } | DbError::NotFound)
        )
    }
}

/// Why a single candidate item did not sync.
#[derive(Debug, Error)]
pub enum ItemFailure {
    /// The catalog call failed at the transport or status level.
    #[error("{operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: CatalogError,
    },

    /// The catalog answered 2xx but the body carried no usable product id.
    #[error("{operation} returned an unusable response: {source}")]
    ResponseShape {
        operation: &'static str,
        #[source]
        source: CatalogError,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The remote product exists but the source item could not be linked
    /// to it. `note_recorded` tells whether the id was kept in a
    /// reconciliation note.
    #[error("remote product {remote_id} was created but could not be linked: {source}")]
    WriteBack {
        remote_id: String,
        note_recorded: bool,
        #[source]
        source: LinkWriteError,
    },
}

impl ItemFailure {
    pub(crate) fn from_catalog(operation: &'static str, source: CatalogError) -> Self {
        if source.is_response_shape() {
            Self::ResponseShape { operation, source }
        } else {
            Self::Transport { operation, source }
        }
    }

    /// Short label used in logs and API responses.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::ResponseShape { .. } => "response_shape",
            Self::Timeout { .. } => "timeout",
            Self::WriteBack { .. } => "write_back",
        }
    }

    /// The remote product id, when the failure happened after the product
    /// already existed remotely.
    #[must_use]
    pub fn remote_id(&self) -> Option<&str> {
        match self {
            Self::WriteBack { remote_id, .. } => Some(remote_id),
            _ => None,
        }
    }
}
