use std::fmt;

/// Comparison operators for typed field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Equal,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl BinaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "Equal",
            Self::GreaterThan => "GreaterThan",
            Self::GreaterThanOrEqual => "GreaterThanOrEqual",
            Self::LessThan => "LessThan",
            Self::LessThanOrEqual => "LessThanOrEqual",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String matching modes.
///
/// The negated modes are first-class operators; there is no separate negation
/// wrapper for string matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringOperator {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    NotContains,
    NotStartsWith,
    NotEndsWith,
}

impl StringOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "Equals",
            Self::Contains => "Contains",
            Self::StartsWith => "StartsWith",
            Self::EndsWith => "EndsWith",
            Self::NotContains => "NotContains",
            Self::NotStartsWith => "NotStartsWith",
            Self::NotEndsWith => "NotEndsWith",
        }
    }

    /// Whether this mode matches values that do NOT satisfy the pattern.
    pub fn is_negated(self) -> bool {
        matches!(
            self,
            Self::NotContains | Self::NotStartsWith | Self::NotEndsWith
        )
    }
}

impl fmt::Display for StringOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean combinators for sibling expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultiaryOperator {
    And,
    Or,
}

impl MultiaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "And",
            Self::Or => "Or",
        }
    }
}

impl fmt::Display for MultiaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
