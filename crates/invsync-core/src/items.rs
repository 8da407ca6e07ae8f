//! Source-side inventory data model.
//!
//! Rows arrive from the source-of-record system with loosely typed numeric
//! columns. They are parsed once, at this boundary, into [`SourceNumber`] so
//! that "missing" and "present but not a number" are explicit variants rather
//! than runtime coercions further down the pipeline.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::CoreError;

/// Decimal literal grammar shared by [`SourceNumber::parse`] and the SQL-side
/// numeric cast, so both sides agree on which text is a number.
pub const NUMERIC_TEXT_PATTERN: &str = r"^\s*[-+]?([0-9]+(\.[0-9]*)?|\.[0-9]+)\s*$";

static NUMERIC_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(NUMERIC_TEXT_PATTERN).unwrap_or_else(|e| panic!("invalid numeric regex: {e}"))
});

/// A numeric value read from a loosely typed source column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceNumber {
    /// Column was `NULL` or blank.
    Absent,
    /// Column held text that is not a decimal literal. The raw text is kept
    /// for diagnostics and pass-through.
    Unparsable(String),
    /// Column held a decimal literal. `raw` is the trimmed source text and is
    /// what gets sent downstream; `value` is only used for comparisons.
    Value { value: Decimal, raw: String },
}

impl SourceNumber {
    /// Parses an optional raw column value.
    ///
    /// Surrounding whitespace is ignored; an empty string is [`SourceNumber::Absent`].
    /// Literals too large for [`Decimal`] saturate to its bounds.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::Absent,
            Some(text) if NUMERIC_TEXT_RE.is_match(text) => Self::Value {
                value: parse_literal(text),
                raw: text.to_owned(),
            },
            Some(text) => Self::Unparsable(text.to_owned()),
        }
    }

    /// Returns the decimal when the column held a number.
    #[must_use]
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Self::Value { value, .. } => Some(*value),
            Self::Absent | Self::Unparsable(_) => None,
        }
    }

    /// Returns the source text when the column held a number.
    #[must_use]
    pub fn raw_value(&self) -> Option<&str> {
        match self {
            Self::Value { raw, .. } => Some(raw),
            Self::Absent | Self::Unparsable(_) => None,
        }
    }
}

/// `text` already matches [`NUMERIC_TEXT_PATTERN`].
fn parse_literal(text: &str) -> Decimal {
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let unsigned = unsigned.strip_suffix('.').unwrap_or(unsigned);
    let normalized = if unsigned.starts_with('.') {
        format!("0{unsigned}")
    } else {
        unsigned.to_owned()
    };

    let magnitude = Decimal::from_str(&normalized).unwrap_or_else(|_| {
        if normalized.bytes().all(|b| b == b'0' || b == b'.') {
            Decimal::ZERO
        } else {
            Decimal::MAX
        }
    });
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

impl From<Decimal> for SourceNumber {
    fn from(value: Decimal) -> Self {
        Self::Value {
            raw: value.to_string(),
            value,
        }
    }
}

/// Serializes as the value the source held, without validation:
/// integral values become JSON numbers, anything else the source text,
/// and `Absent` becomes `null`.
impl Serialize for SourceNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent => serializer.serialize_none(),
            Self::Unparsable(raw) => serializer.serialize_str(raw),
            Self::Value { value, raw } => {
                match value.fract().is_zero().then(|| value.to_i64()).flatten() {
                    Some(n) => serializer.serialize_i64(n),
                    None => serializer.serialize_str(raw),
                }
            }
        }
    }
}

/// Item classification in the source-of-record system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Physical, stock-tracked inventory part. The only kind that is synced.
    InventoryPart,
    NonInventoryPart,
    Service,
    Assembly,
}

impl ItemKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InventoryPart => "inventory_part",
            Self::NonInventoryPart => "non_inventory_part",
            Self::Service => "service",
            Self::Assembly => "assembly",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inventory_part" => Ok(Self::InventoryPart),
            "non_inventory_part" => Ok(Self::NonInventoryPart),
            "service" => Ok(Self::Service),
            "assembly" => Ok(Self::Assembly),
            other => Err(CoreError::InvalidItemKind(other.to_owned())),
        }
    }
}

/// One candidate row read from the item source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub internal_id: i64,
    pub item_code: String,
    pub display_name: String,
    pub sales_description: Option<String>,
    pub quantity_available: SourceNumber,
    pub average_cost: SourceNumber,
    /// Remote product id once the item has been linked. Blank strings are
    /// treated the same as `None`.
    pub external_product_id: Option<String>,
}

/// Linkage state of an item. This is the whole state space of the
/// per-item reconciliation: there is no pending or conflict state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState<'a> {
    Unlinked,
    Linked(&'a str),
}

impl ItemRecord {
    #[must_use]
    pub fn link_state(&self) -> LinkState<'_> {
        match self.external_product_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => LinkState::Linked(id),
            _ => LinkState::Unlinked,
        }
    }
}

/// Predicate selecting the items that take part in a reconciliation pass.
///
/// The database applies the same predicate in SQL; [`CandidateFilter::matches`]
/// exists for in-memory sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFilter {
    pub kind: ItemKind,
    /// Quantity must be strictly greater than this.
    pub min_quantity_exclusive: Decimal,
    /// Average cost must be greater than or equal to this.
    pub min_cost_inclusive: Decimal,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self {
            kind: ItemKind::InventoryPart,
            min_quantity_exclusive: Decimal::ZERO,
            min_cost_inclusive: Decimal::new(0, 2),
        }
    }
}

impl CandidateFilter {
    /// Missing or unparsable numbers never satisfy the predicate.
    #[must_use]
    pub fn matches(&self, kind: ItemKind, item: &ItemRecord) -> bool {
        kind == self.kind
            && item
                .quantity_available
                .value()
                .is_some_and(|q| q > self.min_quantity_exclusive)
            && item
                .average_cost
                .value()
                .is_some_and(|c| c >= self.min_cost_inclusive)
    }
}

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").unwrap_or_else(|e| panic!("invalid identifier regex: {e}"))
});

/// Name of the source column that stores the external product id.
///
/// The column name is interpolated into SQL, so construction validates it as
/// a plain lowercase identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkField(String);

impl LinkField {
    pub const DEFAULT: &'static str = "shopify_product_id";

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidLinkField`] if `name` is not a lowercase
    /// identifier of at most 63 characters.
    pub fn new(name: &str) -> Result<Self, CoreError> {
        if IDENTIFIER_RE.is_match(name) {
            Ok(Self(name.to_owned()))
        } else {
            Err(CoreError::InvalidLinkField(name.to_owned()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LinkField {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for LinkField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[path = "items_test.rs"]
mod tests;
