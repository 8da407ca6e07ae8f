//! Reconciliation of source inventory items into the Shopify catalog.
//!
//! A [`Reconciler`] pages through the items that qualify for sync, updates
//! those already linked to a remote product, creates the rest and writes the
//! new remote id back onto the source item. One item failing never stops the
//! others.

pub mod collaborators;
pub mod error;
pub mod outcome;
pub mod pages;
pub mod reconciler;
pub mod runner;

pub use collaborators::{CatalogClient, ItemSource, LinkWriter};
pub use error::{ItemFailure, LinkWriteError, SyncError};
pub use outcome::{ItemAction, ItemOutcome, ReconcileReport, TriggerOutcome, SUCCESS_MESSAGE};
pub use pages::CandidatePages;
pub use reconciler::{Reconciler, ReconcilerSettings};
pub use runner::{build_reconciler, run_recorded_trigger, PgReconciler, RecordedTrigger};
