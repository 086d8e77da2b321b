//! Smart constructors, the only way to build [`Expression`] values.
//!
//! String and comparison operators are fixed by which constructor is called;
//! there is no public entry point taking a free-form operator value.

use super::{
    BinaryExpression, ChainedExpression, Expression, MissingFieldExpression,
    MissingParamExpression, MultiaryExpression, StringExpression,
};
use crate::error::{ExpressionError, Result};
use crate::field::{ComponentIndex, FieldName};
use crate::operator::{BinaryOperator, MultiaryOperator, StringOperator};
use crate::value::SearchValue;

impl Expression {
    /// Conjunction of one or more expressions.
    pub fn and(expressions: impl IntoIterator<Item = Expression>) -> Result<Self> {
        Self::multiary(MultiaryOperator::And, expressions)
    }

    /// Disjunction of one or more expressions.
    pub fn or(expressions: impl IntoIterator<Item = Expression>) -> Result<Self> {
        Self::multiary(MultiaryOperator::Or, expressions)
    }

    /// Combine expressions under `operator`, keeping the given order.
    ///
    /// Fails with `InvalidArgument` when no expression is supplied.
    pub fn multiary(
        operator: MultiaryOperator,
        expressions: impl IntoIterator<Item = Expression>,
    ) -> Result<Self> {
        let expressions: Vec<Expression> = expressions.into_iter().collect();
        if expressions.is_empty() {
            tracing::debug!(%operator, "rejected empty expression combination");
            return Err(ExpressionError::invalid_argument(format!(
                "{operator} requires at least one expression"
            )));
        }

        Ok(Self::Multiary(MultiaryExpression {
            operator,
            expressions,
        }))
    }

    /// Chain from `resource_type` through reference `param_name` into
    /// `target_resource_type`, filtering targets by `expression`.
    pub fn chained(
        resource_type: impl Into<String>,
        param_name: impl Into<String>,
        target_resource_type: impl Into<String>,
        expression: Expression,
    ) -> Result<Self> {
        let resource_type = resource_type.into();
        let param_name = param_name.into();
        let target_resource_type = target_resource_type.into();

        for (argument, value) in [
            ("resource type", &resource_type),
            ("parameter name", &param_name),
            ("target resource type", &target_resource_type),
        ] {
            if value.trim().is_empty() {
                tracing::debug!(argument, "rejected chained expression");
                return Err(ExpressionError::invalid_argument(format!(
                    "chained expression requires a non-empty {argument}"
                )));
            }
        }

        Ok(Self::Chained(ChainedExpression {
            resource_type,
            param_name,
            target_resource_type,
            expression: Box::new(expression),
        }))
    }

    pub fn string_equals(
        field_name: FieldName,
        component_index: Option<ComponentIndex>,
        value: impl Into<String>,
        ignore_case: bool,
    ) -> Self {
        Self::string(StringOperator::Equals, field_name, component_index, value, ignore_case)
    }

    pub fn contains(
        field_name: FieldName,
        component_index: Option<ComponentIndex>,
        value: impl Into<String>,
        ignore_case: bool,
    ) -> Self {
        Self::string(StringOperator::Contains, field_name, component_index, value, ignore_case)
    }

    pub fn starts_with(
        field_name: FieldName,
        component_index: Option<ComponentIndex>,
        value: impl Into<String>,
        ignore_case: bool,
    ) -> Self {
        Self::string(StringOperator::StartsWith, field_name, component_index, value, ignore_case)
    }

    pub fn ends_with(
        field_name: FieldName,
        component_index: Option<ComponentIndex>,
        value: impl Into<String>,
        ignore_case: bool,
    ) -> Self {
        Self::string(StringOperator::EndsWith, field_name, component_index, value, ignore_case)
    }

    pub fn not_contains(
        field_name: FieldName,
        component_index: Option<ComponentIndex>,
        value: impl Into<String>,
        ignore_case: bool,
    ) -> Self {
        Self::string(StringOperator::NotContains, field_name, component_index, value, ignore_case)
    }

    pub fn not_starts_with(
        field_name: FieldName,
        component_index: Option<ComponentIndex>,
        value: impl Into<String>,
        ignore_case: bool,
    ) -> Self {
        Self::string(
            StringOperator::NotStartsWith,
            field_name,
            component_index,
            value,
            ignore_case,
        )
    }

    pub fn not_ends_with(
        field_name: FieldName,
        component_index: Option<ComponentIndex>,
        value: impl Into<String>,
        ignore_case: bool,
    ) -> Self {
        Self::string(StringOperator::NotEndsWith, field_name, component_index, value, ignore_case)
    }

    pub fn equals(
        field_name: FieldName,
        component_index: Option<ComponentIndex>,
        value: impl Into<SearchValue>,
    ) -> Self {
        Self::binary(BinaryOperator::Equal, field_name, component_index, value)
    }

    pub fn greater_than(
        field_name: FieldName,
        component_index: Option<ComponentIndex>,
        value: impl Into<SearchValue>,
    ) -> Self {
        Self::binary(BinaryOperator::GreaterThan, field_name, component_index, value)
    }

    pub fn greater_than_or_equal(
        field_name: FieldName,
        component_index: Option<ComponentIndex>,
        value: impl Into<SearchValue>,
    ) -> Self {
        Self::binary(BinaryOperator::GreaterThanOrEqual, field_name, component_index, value)
    }

    pub fn less_than(
        field_name: FieldName,
        component_index: Option<ComponentIndex>,
        value: impl Into<SearchValue>,
    ) -> Self {
        Self::binary(BinaryOperator::LessThan, field_name, component_index, value)
    }

    pub fn less_than_or_equal(
        field_name: FieldName,
        component_index: Option<ComponentIndex>,
        value: impl Into<SearchValue>,
    ) -> Self {
        Self::binary(BinaryOperator::LessThanOrEqual, field_name, component_index, value)
    }

    /// Field-grain absence: the field (or component) has no indexed value.
    pub fn missing_field(field_name: FieldName, component_index: Option<ComponentIndex>) -> Self {
        Self::MissingField(MissingFieldExpression {
            field_name,
            component_index,
        })
    }

    /// Parameter-grain absence: whether the named search parameter produced no
    /// index entries at all.
    pub fn missing_param(param_name: impl Into<String>, is_missing: bool) -> Self {
        Self::MissingParam(MissingParamExpression {
            param_name: param_name.into(),
            is_missing,
        })
    }

    fn string(
        operator: StringOperator,
        field_name: FieldName,
        component_index: Option<ComponentIndex>,
        value: impl Into<String>,
        ignore_case: bool,
    ) -> Self {
        Self::String(StringExpression {
            field_name,
            component_index,
            operator,
            value: value.into(),
            ignore_case,
        })
    }

    fn binary(
        operator: BinaryOperator,
        field_name: FieldName,
        component_index: Option<ComponentIndex>,
        value: impl Into<SearchValue>,
    ) -> Self {
        Self::Binary(BinaryExpression {
            field_name,
            component_index,
            operator,
            value: value.into(),
        })
    }
}
