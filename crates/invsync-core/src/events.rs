use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Kind of change reported by the source-of-record system for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Create,
    Edit,
    Delete,
    /// Inline (list view) edit.
    Xedit,
    Copy,
}

impl EventKind {
    /// Only record creation and full edits start a reconciliation pass.
    #[must_use]
    pub fn triggers_sync(self) -> bool {
        matches!(self, Self::Create | Self::Edit)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Xedit => "xedit",
            Self::Copy => "copy",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = CoreError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "edit" => Ok(Self::Edit),
            "delete" => Ok(Self::Delete),
            "xedit" => Ok(Self::Xedit),
            "copy" => Ok(Self::Copy),
            _ => Err(CoreError::InvalidEventKind(s.to_owned())),
        }
    }
}

/// A change notification for one source record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    pub record_id: i64,
    pub kind: EventKind,
}
