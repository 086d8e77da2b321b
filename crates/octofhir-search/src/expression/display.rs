//! Deterministic S-expression rendering for logs and diagnostics.
//!
//! This is not a wire format; nothing parses it back.

use super::{
    BinaryExpression, ChainedExpression, Expression, ExpressionVisitor, MissingFieldExpression,
    MissingParamExpression, MultiaryExpression, StringExpression,
};
use crate::field::{ComponentIndex, FieldName};
use std::fmt::{self, Write};

/// Writes an expression tree as S-expression text.
pub struct ExpressionPrinter<'a> {
    out: &'a mut dyn Write,
}

impl<'a> ExpressionPrinter<'a> {
    pub fn new(out: &'a mut dyn Write) -> Self {
        Self { out }
    }

    fn write_field(&mut self, field: FieldName, component: Option<ComponentIndex>) -> fmt::Result {
        match component {
            Some(index) => write!(self.out, "{field}[{index}]"),
            None => write!(self.out, "{field}"),
        }
    }
}

impl ExpressionVisitor for ExpressionPrinter<'_> {
    type Output = fmt::Result;

    fn visit_binary(&mut self, expr: &BinaryExpression) -> fmt::Result {
        write!(self.out, "({} ", expr.operator())?;
        self.write_field(expr.field_name(), expr.component_index())?;
        write!(self.out, " {})", expr.value())
    }

    fn visit_string(&mut self, expr: &StringExpression) -> fmt::Result {
        write!(self.out, "(String{} ", expr.operator())?;
        if expr.ignore_case() {
            self.out.write_str("IgnoreCase ")?;
        }
        self.write_field(expr.field_name(), expr.component_index())?;
        write!(self.out, " {:?})", expr.value())
    }

    fn visit_missing_field(&mut self, expr: &MissingFieldExpression) -> fmt::Result {
        self.out.write_str("(MissingField ")?;
        self.write_field(expr.field_name(), expr.component_index())?;
        self.out.write_char(')')
    }

    fn visit_missing_param(&mut self, expr: &MissingParamExpression) -> fmt::Result {
        write!(
            self.out,
            "(MissingParam {} {})",
            expr.param_name(),
            expr.is_missing()
        )
    }

    fn visit_chained(&mut self, expr: &ChainedExpression) -> fmt::Result {
        write!(
            self.out,
            "(Chain {}.{}:{} ",
            expr.resource_type(),
            expr.param_name(),
            expr.target_resource_type()
        )?;
        expr.expression().accept(self)?;
        self.out.write_char(')')
    }

    fn visit_multiary(&mut self, expr: &MultiaryExpression) -> fmt::Result {
        write!(self.out, "({}", expr.operator())?;
        for child in expr.expressions() {
            self.out.write_char(' ')?;
            child.accept(self)?;
        }
        self.out.write_char(')')
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.accept(&mut ExpressionPrinter::new(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_scenario() {
        let expr = Expression::and([
            Expression::string_equals(FieldName::String, None, "Smith", true),
            Expression::equals(FieldName::DateTimeStart, None, "2000-01-01"),
        ])
        .unwrap();

        assert_eq!(
            expr.to_string(),
            r#"(And (StringEquals IgnoreCase string "Smith") (Equal date-start "2000-01-01"))"#
        );
    }

    #[test]
    fn test_display_missing_variants() {
        let field = Expression::missing_field(FieldName::TokenCode, Some(ComponentIndex::from(1)));
        assert_eq!(field.to_string(), "(MissingField token-code[1])");

        let param = Expression::missing_param("identifier", true);
        assert_eq!(param.to_string(), "(MissingParam identifier true)");
    }

    #[test]
    fn test_display_chain_and_negated_string() {
        let expr = Expression::chained(
            "Observation",
            "subject",
            "Patient",
            Expression::or([
                Expression::not_contains(FieldName::String, None, "test", false),
                Expression::less_than(FieldName::Number, Some(ComponentIndex::from(0)), 10i64),
            ])
            .unwrap(),
        )
        .unwrap();

        assert_eq!(
            expr.to_string(),
            r#"(Chain Observation.subject:Patient (Or (StringNotContains string "test") (LessThan number[0] 10)))"#
        );
    }

    #[test]
    fn test_printer_writes_into_any_buffer() {
        let mut out = String::new();
        Expression::missing_param("_profile", false)
            .accept(&mut ExpressionPrinter::new(&mut out))
            .unwrap();
        assert_eq!(out, "(MissingParam _profile false)");
    }
}
