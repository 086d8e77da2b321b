//! Indexed field names and component selectors.
//!
//! A [`FieldName`] names the grain at which typed comparisons run: one column
//! of a resource's denormalized search index. A search parameter may be backed
//! by several fields (a date parameter has a start and an end), and composite
//! fields are addressed per component through a [`ComponentIndex`].

use crate::error::{ExpressionError, Result};
use std::fmt;

/// A searchable field on a resource's indexed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    DateTimeStart,
    DateTimeEnd,
    DateTimeIsLongerThanADay,
    Number,
    Quantity,
    QuantityCode,
    QuantitySystem,
    ReferenceBaseUri,
    ReferenceResourceType,
    ReferenceResourceId,
    ReferenceResourceVersion,
    String,
    TokenCode,
    TokenSystem,
    TokenText,
    Uri,
}

impl FieldName {
    pub const ALL: [FieldName; 16] = [
        Self::DateTimeStart,
        Self::DateTimeEnd,
        Self::DateTimeIsLongerThanADay,
        Self::Number,
        Self::Quantity,
        Self::QuantityCode,
        Self::QuantitySystem,
        Self::ReferenceBaseUri,
        Self::ReferenceResourceType,
        Self::ReferenceResourceId,
        Self::ReferenceResourceVersion,
        Self::String,
        Self::TokenCode,
        Self::TokenSystem,
        Self::TokenText,
        Self::Uri,
    ];

    /// Stable textual code of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DateTimeStart => "date-start",
            Self::DateTimeEnd => "date-end",
            Self::DateTimeIsLongerThanADay => "date-long",
            Self::Number => "number",
            Self::Quantity => "quantity",
            Self::QuantityCode => "quantity-code",
            Self::QuantitySystem => "quantity-system",
            Self::ReferenceBaseUri => "reference-base-uri",
            Self::ReferenceResourceType => "reference-type",
            Self::ReferenceResourceId => "reference-id",
            Self::ReferenceResourceVersion => "reference-version",
            Self::String => "string",
            Self::TokenCode => "token-code",
            Self::TokenSystem => "token-system",
            Self::TokenText => "token-text",
            Self::Uri => "uri",
        }
    }

    /// Parse a field from its textual code.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == s)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selects one component of a composite field (e.g. the low or high part of a
/// range). Always non-negative; absence is expressed as `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentIndex(u32);

impl ComponentIndex {
    /// Build a component index from a signed value supplied by a caller.
    ///
    /// Fails with `InvalidArgument` when the value is negative or does not fit.
    pub fn new(index: i64) -> Result<Self> {
        u32::try_from(index).map(Self).map_err(|_| {
            tracing::debug!(index, "rejected component index");
            ExpressionError::invalid_argument(format!(
                "component index must be a non-negative 32-bit integer, got {index}"
            ))
        })
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for ComponentIndex {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl TryFrom<i64> for ComponentIndex {
    type Error = ExpressionError;

    fn try_from(index: i64) -> Result<Self> {
        Self::new(index)
    }
}

impl fmt::Display for ComponentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
