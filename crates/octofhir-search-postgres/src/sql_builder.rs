//! Parameter accumulation for compiled search conditions.
//!
//! All user-supplied values are bound as `$N` parameters; only validated
//! identifiers are ever interpolated into SQL text.

use crate::error::SqlCompileError;

/// A SQL parameter value with its type information.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(String),
}

impl SqlParam {
    /// Get the value as a string for binding.
    pub fn as_str(&self) -> String {
        match self {
            Self::Text(s) | Self::Timestamp(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Boolean(b) => b.to_string(),
        }
    }

    /// Cast suffix needed for the placeholder, if any.
    pub fn cast(&self) -> &'static str {
        match self {
            Self::Timestamp(_) => "::timestamptz",
            Self::Float(_) => "::numeric",
            _ => "",
        }
    }
}

/// Accumulates bind parameters and hands out their placeholder numbers.
#[derive(Debug, Default)]
pub struct SqlBuilder {
    params: Vec<SqlParam>,
    param_offset: usize,
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the parameter offset for numbering (useful when combining with other queries).
    pub fn with_param_offset(mut self, offset: usize) -> Self {
        self.param_offset = offset;
        self
    }

    /// Add a parameter and return its placeholder number.
    pub fn add_param(&mut self, param: SqlParam) -> usize {
        self.params.push(param);
        self.param_offset + self.params.len()
    }

    /// Add a text parameter and return its placeholder number.
    pub fn add_text_param(&mut self, value: impl Into<String>) -> usize {
        self.add_param(SqlParam::Text(value.into()))
    }

    /// Get the current parameter count.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Get all parameters.
    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    pub fn into_params(self) -> Vec<SqlParam> {
        self.params
    }

    /// Join already-compiled conditions with `AND`/`OR`.
    ///
    /// A single condition is returned unchanged.
    pub fn join_conditions(conditions: &[String], separator: &str) -> String {
        if conditions.len() == 1 {
            conditions[0].clone()
        } else {
            format!("({})", conditions.join(&format!(" {separator} ")))
        }
    }
}

/// Validate an identifier (table name, column name, alias).
///
/// Only allows ASCII alphanumeric characters and underscores.
pub fn validate_identifier(name: &str) -> Result<(), SqlCompileError> {
    if name.is_empty() {
        return Err(SqlCompileError::InvalidIdentifier(
            "Empty identifier".to_string(),
        ));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SqlCompileError::InvalidIdentifier(name.to_string()));
    }

    Ok(())
}

/// Escape special characters in LIKE patterns.
pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
