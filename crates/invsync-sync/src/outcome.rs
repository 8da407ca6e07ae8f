use invsync_core::EventKind;

use crate::error::{ItemFailure, SyncError};

/// Message reported for a pass in which every candidate synced.
pub const SUCCESS_MESSAGE: &str = "Successfully Updated or Created Products in Shopify.";

#[derive(Debug)]
pub enum ItemAction {
    Created { remote_id: String },
    Updated { remote_id: String },
    Failed(ItemFailure),
}

/// Result of reconciling one candidate item.
#[derive(Debug)]
pub struct ItemOutcome {
    pub internal_id: i64,
    pub action: ItemAction,
}

impl ItemOutcome {
    #[must_use]
    pub fn failure(&self) -> Option<&ItemFailure> {
        match &self.action {
            ItemAction::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Per-item outcomes of one completed pass, in candidate order.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub outcomes: Vec<ItemOutcome>,
    pub pages: usize,
}

impl ReconcileReport {
    #[must_use]
    pub fn seen(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn created(&self) -> usize {
        self.count(|a| matches!(a, ItemAction::Created { .. }))
    }

    #[must_use]
    pub fn updated(&self) -> usize {
        self.count(|a| matches!(a, ItemAction::Updated { .. }))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|a| matches!(a, ItemAction::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (i64, &ItemFailure)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.failure().map(|f| (o.internal_id, f)))
    }

    /// True when no item failed. An empty candidate set is clean.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    #[must_use]
    pub fn message(&self) -> String {
        if self.is_clean() {
            SUCCESS_MESSAGE.to_owned()
        } else {
            format!(
                "Synced {} of {} products in Shopify; {} failed.",
                self.seen() - self.failed(),
                self.seen(),
                self.failed()
            )
        }
    }

    fn count(&self, pred: impl Fn(&ItemAction) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.action)).count()
    }
}

/// What a trigger event led to.
#[derive(Debug)]
pub enum TriggerOutcome {
    /// The event kind does not start a pass.
    Skipped { kind: EventKind },
    Completed(ReconcileReport),
    /// Candidate selection failed; no further items were attempted.
    Aborted(SyncError),
}

impl TriggerOutcome {
    /// `skipped`, `completed`, `partial` or `aborted`.
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            Self::Skipped { .. } => "skipped",
            Self::Completed(report) if report.is_clean() => "completed",
            Self::Completed(_) => "partial",
            Self::Aborted(_) => "aborted",
        }
    }

    /// Human-readable summary. `None` for skipped events.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Skipped { .. } => None,
            Self::Completed(report) => Some(report.message()),
            Self::Aborted(err) => Some(format!("Sync aborted: {err}")),
        }
    }

    #[must_use]
    pub fn report(&self) -> Option<&ReconcileReport> {
        match self {
            Self::Completed(report) => Some(report),
            _ => None,
        }
    }
}
