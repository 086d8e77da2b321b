//! Visitor contract for compiling expression trees.

use super::{
    BinaryExpression, ChainedExpression, MissingFieldExpression, MissingParamExpression,
    MultiaryExpression, StringExpression,
};

/// One operation per expression variant.
///
/// The trait has no default methods, so adding a variant to
/// [`Expression`](super::Expression) breaks the build of every implementor
/// until it handles the new case. Visitors recurse into children themselves by
/// calling `accept` on them; any state they accumulate lives in `self`.
pub trait ExpressionVisitor {
    /// Result produced for each visited node.
    type Output;

    fn visit_binary(&mut self, expr: &BinaryExpression) -> Self::Output;

    fn visit_string(&mut self, expr: &StringExpression) -> Self::Output;

    fn visit_missing_field(&mut self, expr: &MissingFieldExpression) -> Self::Output;

    fn visit_missing_param(&mut self, expr: &MissingParamExpression) -> Self::Output;

    fn visit_chained(&mut self, expr: &ChainedExpression) -> Self::Output;

    fn visit_multiary(&mut self, expr: &MultiaryExpression) -> Self::Output;
}

/// Counts every node of a tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeCounter;

impl ExpressionVisitor for NodeCounter {
    type Output = usize;

    fn visit_binary(&mut self, _expr: &BinaryExpression) -> usize {
        1
    }

    fn visit_string(&mut self, _expr: &StringExpression) -> usize {
        1
    }

    fn visit_missing_field(&mut self, _expr: &MissingFieldExpression) -> usize {
        1
    }

    fn visit_missing_param(&mut self, _expr: &MissingParamExpression) -> usize {
        1
    }

    fn visit_chained(&mut self, expr: &ChainedExpression) -> usize {
        1 + expr.expression().accept(self)
    }

    fn visit_multiary(&mut self, expr: &MultiaryExpression) -> usize {
        1 + expr
            .expressions()
            .iter()
            .map(|child| child.accept(self))
            .sum::<usize>()
    }
}

/// Measures the deepest nesting of chained expressions.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChainDepth;

impl ExpressionVisitor for ChainDepth {
    type Output = usize;

    fn visit_binary(&mut self, _expr: &BinaryExpression) -> usize {
        0
    }

    fn visit_string(&mut self, _expr: &StringExpression) -> usize {
        0
    }

    fn visit_missing_field(&mut self, _expr: &MissingFieldExpression) -> usize {
        0
    }

    fn visit_missing_param(&mut self, _expr: &MissingParamExpression) -> usize {
        0
    }

    fn visit_chained(&mut self, expr: &ChainedExpression) -> usize {
        1 + expr.expression().accept(self)
    }

    fn visit_multiary(&mut self, expr: &MultiaryExpression) -> usize {
        expr.expressions()
            .iter()
            .map(|child| child.accept(self))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{Expression, ExpressionKind};
    use crate::field::{ComponentIndex, FieldName};
    use crate::operator::{BinaryOperator, MultiaryOperator, StringOperator};
    use crate::ExpressionError;

    /// Records which operation ran for each node, in visiting order.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<ExpressionKind>,
    }

    impl ExpressionVisitor for Recorder {
        type Output = ();

        fn visit_binary(&mut self, _expr: &BinaryExpression) {
            self.calls.push(ExpressionKind::Binary);
        }

        fn visit_string(&mut self, _expr: &StringExpression) {
            self.calls.push(ExpressionKind::String);
        }

        fn visit_missing_field(&mut self, _expr: &MissingFieldExpression) {
            self.calls.push(ExpressionKind::MissingField);
        }

        fn visit_missing_param(&mut self, _expr: &MissingParamExpression) {
            self.calls.push(ExpressionKind::MissingParam);
        }

        fn visit_chained(&mut self, expr: &ChainedExpression) {
            self.calls.push(ExpressionKind::Chained);
            expr.expression().accept(self);
        }

        fn visit_multiary(&mut self, expr: &MultiaryExpression) {
            self.calls.push(ExpressionKind::Multiary);
            for child in expr.expressions() {
                child.accept(self);
            }
        }
    }

    /// Backend stub that rebuilds an equivalent tree from visitor calls.
    struct Rebuilder;

    impl ExpressionVisitor for Rebuilder {
        type Output = Result<Expression, ExpressionError>;

        fn visit_binary(&mut self, expr: &BinaryExpression) -> Self::Output {
            let (field, component, value) =
                (expr.field_name(), expr.component_index(), expr.value().clone());
            Ok(match expr.operator() {
                BinaryOperator::Equal => Expression::equals(field, component, value),
                BinaryOperator::GreaterThan => Expression::greater_than(field, component, value),
                BinaryOperator::GreaterThanOrEqual => {
                    Expression::greater_than_or_equal(field, component, value)
                }
                BinaryOperator::LessThan => Expression::less_than(field, component, value),
                BinaryOperator::LessThanOrEqual => {
                    Expression::less_than_or_equal(field, component, value)
                }
            })
        }

        fn visit_string(&mut self, expr: &StringExpression) -> Self::Output {
            let (field, component, value, ignore_case) = (
                expr.field_name(),
                expr.component_index(),
                expr.value(),
                expr.ignore_case(),
            );
            Ok(match expr.operator() {
                StringOperator::Equals => {
                    Expression::string_equals(field, component, value, ignore_case)
                }
                StringOperator::Contains => {
                    Expression::contains(field, component, value, ignore_case)
                }
                StringOperator::StartsWith => {
                    Expression::starts_with(field, component, value, ignore_case)
                }
                StringOperator::EndsWith => {
                    Expression::ends_with(field, component, value, ignore_case)
                }
                StringOperator::NotContains => {
                    Expression::not_contains(field, component, value, ignore_case)
                }
                StringOperator::NotStartsWith => {
                    Expression::not_starts_with(field, component, value, ignore_case)
                }
                StringOperator::NotEndsWith => {
                    Expression::not_ends_with(field, component, value, ignore_case)
                }
            })
        }

        fn visit_missing_field(&mut self, expr: &MissingFieldExpression) -> Self::Output {
            Ok(Expression::missing_field(
                expr.field_name(),
                expr.component_index(),
            ))
        }

        fn visit_missing_param(&mut self, expr: &MissingParamExpression) -> Self::Output {
            Ok(Expression::missing_param(
                expr.param_name(),
                expr.is_missing(),
            ))
        }

        fn visit_chained(&mut self, expr: &ChainedExpression) -> Self::Output {
            let inner = expr.expression().accept(self)?;
            Expression::chained(
                expr.resource_type(),
                expr.param_name(),
                expr.target_resource_type(),
                inner,
            )
        }

        fn visit_multiary(&mut self, expr: &MultiaryExpression) -> Self::Output {
            let children = expr
                .expressions()
                .iter()
                .map(|child| child.accept(self))
                .collect::<Result<Vec<_>, _>>()?;
            Expression::multiary(expr.operator(), children)
        }
    }

    fn sample_tree() -> Expression {
        Expression::or([
            Expression::and([
                Expression::not_starts_with(FieldName::String, None, "Dr", true),
                Expression::greater_than_or_equal(
                    FieldName::DateTimeStart,
                    Some(ComponentIndex::from(1)),
                    "2020-01-01",
                ),
            ])
            .unwrap(),
            Expression::missing_field(FieldName::TokenSystem, None),
            Expression::chained(
                "Encounter",
                "patient",
                "Patient",
                Expression::missing_param("identifier", false),
            )
            .unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_every_node_visited_once_via_its_operation() {
        let tree = sample_tree();
        let mut recorder = Recorder::default();
        tree.accept(&mut recorder);

        assert_eq!(
            recorder.calls,
            vec![
                ExpressionKind::Multiary,
                ExpressionKind::Multiary,
                ExpressionKind::String,
                ExpressionKind::Binary,
                ExpressionKind::MissingField,
                ExpressionKind::Chained,
                ExpressionKind::MissingParam,
            ]
        );
        assert_eq!(recorder.calls.len(), tree.node_count());
    }

    #[test]
    fn test_variant_accept_dispatches_directly() {
        let Expression::MissingParam(param) = Expression::missing_param("_tag", true) else {
            panic!("expected missing-param expression");
        };
        let mut recorder = Recorder::default();
        param.accept(&mut recorder);
        assert_eq!(recorder.calls, vec![ExpressionKind::MissingParam]);
    }

    #[test]
    fn test_nested_chain_round_trip() {
        let original = Expression::chained(
            "DiagnosticReport",
            "subject",
            "Patient",
            Expression::chained(
                "Patient",
                "organization",
                "Organization",
                Expression::equals(FieldName::String, None, "Acme"),
            )
            .unwrap(),
        )
        .unwrap();

        let rebuilt = original.accept(&mut Rebuilder).unwrap();
        assert_eq!(rebuilt, original);
        assert_eq!(rebuilt.chain_depth(), 2);
    }

    #[test]
    fn test_round_trip_preserves_every_variant() {
        let original = sample_tree();
        let rebuilt = original.accept(&mut Rebuilder).unwrap();
        assert_eq!(rebuilt, original);

        let Expression::Multiary(root) = rebuilt else {
            panic!("expected multiary root");
        };
        assert_eq!(root.operator(), MultiaryOperator::Or);
    }

    #[test]
    fn test_chain_depth_takes_deepest_branch() {
        let shallow = Expression::chained(
            "Observation",
            "performer",
            "Practitioner",
            Expression::missing_param("name", true),
        )
        .unwrap();
        let deep = Expression::chained(
            "Observation",
            "subject",
            "Patient",
            Expression::chained(
                "Patient",
                "general-practitioner",
                "Practitioner",
                Expression::chained(
                    "Practitioner",
                    "organization",
                    "Organization",
                    Expression::contains(FieldName::String, None, "clinic", true),
                )
                .unwrap(),
            )
            .unwrap(),
        )
        .unwrap();

        let tree = Expression::or([shallow, deep]).unwrap();
        assert_eq!(tree.accept(&mut ChainDepth), 3);
    }
}
