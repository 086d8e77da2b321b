use std::fmt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Scalar operand of a binary comparison.
///
/// The expression core carries the value opaquely; backends decide how each
/// kind compares against the field's native type.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    DateTime(OffsetDateTime),
    Boolean(bool),
}

impl SearchValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the value kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Decimal(_) => "decimal",
            Self::DateTime(_) => "datetime",
            Self::Boolean(_) => "boolean",
        }
    }
}

impl fmt::Display for SearchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::DateTime(dt) => {
                let formatted = dt.format(&Rfc3339).map_err(|_| fmt::Error)?;
                write!(f, "{formatted}")
            }
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for SearchValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SearchValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SearchValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for SearchValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for SearchValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<OffsetDateTime> for SearchValue {
    fn from(value: OffsetDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<bool> for SearchValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}
