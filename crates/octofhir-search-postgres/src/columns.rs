//! Mapping of expression fields onto search index tables.

use crate::config::IndexTables;
use octofhir_search::FieldName;

/// A denormalized index table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexTable {
    Date,
    Number,
    Quantity,
    Reference,
    String,
    Token,
    Uri,
}

impl IndexTable {
    /// Configured table name.
    pub fn name(self, tables: &IndexTables) -> &str {
        match self {
            Self::Date => &tables.date,
            Self::Number => &tables.number,
            Self::Quantity => &tables.quantity,
            Self::Reference => &tables.reference,
            Self::String => &tables.string,
            Self::Token => &tables.token,
            Self::Uri => &tables.uri,
        }
    }
}

/// Where a field's indexed values are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldColumn {
    pub table: IndexTable,
    pub column: &'static str,
    /// Pre-normalized (lower-cased) copy of the column, when one is indexed
    pub normalized: Option<&'static str>,
}

impl FieldColumn {
    const fn plain(table: IndexTable, column: &'static str) -> Self {
        Self {
            table,
            column,
            normalized: None,
        }
    }

    /// Column to compare, and whether it still needs `LOWER()` for a
    /// case-insensitive match.
    pub fn match_column(&self, ignore_case: bool) -> (&'static str, bool) {
        match (ignore_case, self.normalized) {
            (true, Some(normalized)) => (normalized, false),
            (true, None) => (self.column, true),
            (false, _) => (self.column, false),
        }
    }
}

/// Resolve the index column backing a field.
pub fn field_column(field: FieldName) -> FieldColumn {
    match field {
        FieldName::DateTimeStart => FieldColumn::plain(IndexTable::Date, "range_start"),
        FieldName::DateTimeEnd => FieldColumn::plain(IndexTable::Date, "range_end"),
        FieldName::DateTimeIsLongerThanADay => FieldColumn::plain(IndexTable::Date, "is_long"),
        FieldName::Number => FieldColumn::plain(IndexTable::Number, "value"),
        FieldName::Quantity => FieldColumn::plain(IndexTable::Quantity, "value"),
        FieldName::QuantityCode => FieldColumn::plain(IndexTable::Quantity, "code"),
        FieldName::QuantitySystem => FieldColumn::plain(IndexTable::Quantity, "system"),
        FieldName::ReferenceBaseUri => FieldColumn::plain(IndexTable::Reference, "target_base"),
        FieldName::ReferenceResourceType => {
            FieldColumn::plain(IndexTable::Reference, "target_type")
        }
        FieldName::ReferenceResourceId => FieldColumn::plain(IndexTable::Reference, "target_id"),
        FieldName::ReferenceResourceVersion => {
            FieldColumn::plain(IndexTable::Reference, "target_version")
        }
        FieldName::String => FieldColumn {
            table: IndexTable::String,
            column: "value_exact",
            normalized: Some("value_normalized"),
        },
        FieldName::TokenCode => FieldColumn::plain(IndexTable::Token, "code"),
        FieldName::TokenSystem => FieldColumn::plain(IndexTable::Token, "system"),
        FieldName::TokenText => FieldColumn::plain(IndexTable::Token, "display"),
        FieldName::Uri => FieldColumn::plain(IndexTable::Uri, "value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_has_a_column() {
        let tables = IndexTables::default();
        for field in FieldName::ALL {
            let column = field_column(field);
            assert!(!column.column.is_empty());
            assert!(column.table.name(&tables).starts_with("search_idx_"));
        }
    }

    #[test]
    fn test_string_field_uses_normalized_column_when_ignoring_case() {
        let column = field_column(FieldName::String);
        assert_eq!(column.match_column(true), ("value_normalized", false));
        assert_eq!(column.match_column(false), ("value_exact", false));

        let token_text = field_column(FieldName::TokenText);
        assert_eq!(token_text.match_column(true), ("display", true));
    }
}
