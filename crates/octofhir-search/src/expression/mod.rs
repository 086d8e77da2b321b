//! Backend-independent search expression tree.
//!
//! An [`Expression`] is a closed sum type over six node shapes. Nodes are
//! built only through the smart constructors on [`Expression`], are
//! immutable afterwards and own their children exclusively, so a finished
//! tree can be traversed from any number of threads at once.
//!
//! Backends consume trees through the [`ExpressionVisitor`] contract:
//!
//! ```
//! use octofhir_search::{Expression, FieldName};
//!
//! let expr = Expression::and([
//!     Expression::string_equals(FieldName::String, None, "Smith", true),
//!     Expression::equals(FieldName::DateTimeStart, None, "2000-01-01"),
//! ])?;
//! assert_eq!(expr.node_count(), 3);
//! # Ok::<(), octofhir_search::ExpressionError>(())
//! ```

mod display;
mod factory;
mod visitor;

pub use display::ExpressionPrinter;
pub use visitor::{ChainDepth, ExpressionVisitor, NodeCounter};

use crate::field::{ComponentIndex, FieldName};
use crate::operator::{BinaryOperator, MultiaryOperator, StringOperator};
use crate::value::SearchValue;

/// A node of the search expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Binary(BinaryExpression),
    String(StringExpression),
    MissingField(MissingFieldExpression),
    MissingParam(MissingParamExpression),
    Chained(ChainedExpression),
    Multiary(MultiaryExpression),
}

/// Tag naming the active variant of an [`Expression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    Binary,
    String,
    MissingField,
    MissingParam,
    Chained,
    Multiary,
}

impl Expression {
    pub fn kind(&self) -> ExpressionKind {
        match self {
            Self::Binary(_) => ExpressionKind::Binary,
            Self::String(_) => ExpressionKind::String,
            Self::MissingField(_) => ExpressionKind::MissingField,
            Self::MissingParam(_) => ExpressionKind::MissingParam,
            Self::Chained(_) => ExpressionKind::Chained,
            Self::Multiary(_) => ExpressionKind::Multiary,
        }
    }

    /// Dispatch to the visitor operation matching this node's variant.
    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Self::Binary(expr) => expr.accept(visitor),
            Self::String(expr) => expr.accept(visitor),
            Self::MissingField(expr) => expr.accept(visitor),
            Self::MissingParam(expr) => expr.accept(visitor),
            Self::Chained(expr) => expr.accept(visitor),
            Self::Multiary(expr) => expr.accept(visitor),
        }
    }

    /// Total number of nodes in this tree, including the root.
    pub fn node_count(&self) -> usize {
        self.accept(&mut NodeCounter)
    }

    /// Deepest nesting of chained expressions; zero when the tree has no chain.
    pub fn chain_depth(&self) -> usize {
        self.accept(&mut ChainDepth)
    }
}

/// Typed comparison of a field (or one of its components) against a value.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    field_name: FieldName,
    component_index: Option<ComponentIndex>,
    operator: BinaryOperator,
    value: SearchValue,
}

impl BinaryExpression {
    pub fn field_name(&self) -> FieldName {
        self.field_name
    }

    pub fn component_index(&self) -> Option<ComponentIndex> {
        self.component_index
    }

    pub fn operator(&self) -> BinaryOperator {
        self.operator
    }

    pub fn value(&self) -> &SearchValue {
        &self.value
    }

    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_binary(self)
    }
}

/// Text match against a string-valued field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringExpression {
    field_name: FieldName,
    component_index: Option<ComponentIndex>,
    operator: StringOperator,
    value: String,
    ignore_case: bool,
}

impl StringExpression {
    pub fn field_name(&self) -> FieldName {
        self.field_name
    }

    pub fn component_index(&self) -> Option<ComponentIndex> {
        self.component_index
    }

    pub fn operator(&self) -> StringOperator {
        self.operator
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the match ignores case and accents.
    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_string(self)
    }
}

/// Asserts that a field (or one of its components) has no indexed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFieldExpression {
    field_name: FieldName,
    component_index: Option<ComponentIndex>,
}

impl MissingFieldExpression {
    pub fn field_name(&self) -> FieldName {
        self.field_name
    }

    pub fn component_index(&self) -> Option<ComponentIndex> {
        self.component_index
    }

    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_missing_field(self)
    }
}

/// Asserts whether a whole search parameter was absent during indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingParamExpression {
    param_name: String,
    is_missing: bool,
}

impl MissingParamExpression {
    pub fn param_name(&self) -> &str {
        &self.param_name
    }

    pub fn is_missing(&self) -> bool {
        self.is_missing
    }

    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_missing_param(self)
    }
}

/// Resources of `resource_type` whose reference `param_name` points at a
/// `target_resource_type` resource matching the sub-expression.
///
/// The sub-expression is evaluated against the target resource's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainedExpression {
    resource_type: String,
    param_name: String,
    target_resource_type: String,
    expression: Box<Expression>,
}

impl ChainedExpression {
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn param_name(&self) -> &str {
        &self.param_name
    }

    pub fn target_resource_type(&self) -> &str {
        &self.target_resource_type
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_chained(self)
    }
}

/// Boolean combination of one or more sibling expressions.
///
/// Children keep the order they were given in; And/Or are commutative so the
/// order only matters for deterministic output.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiaryExpression {
    operator: MultiaryOperator,
    expressions: Vec<Expression>,
}

impl MultiaryExpression {
    pub fn operator(&self) -> MultiaryOperator {
        self.operator
    }

    /// Never empty.
    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_multiary(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_expression_is_thread_safe() {
        assert_send_sync::<Expression>();
    }

    #[test]
    fn test_kind_tags() {
        let binary = Expression::equals(FieldName::Number, None, 5i64);
        let string = Expression::contains(FieldName::String, None, "mit", true);
        let missing_field = Expression::missing_field(FieldName::TokenCode, None);
        let missing_param = Expression::missing_param("identifier", false);
        let chained =
            Expression::chained("Observation", "subject", "Patient", binary.clone()).unwrap();
        let multiary = Expression::or([string.clone(), missing_field.clone()]).unwrap();

        assert_eq!(binary.kind(), ExpressionKind::Binary);
        assert_eq!(string.kind(), ExpressionKind::String);
        assert_eq!(missing_field.kind(), ExpressionKind::MissingField);
        assert_eq!(missing_param.kind(), ExpressionKind::MissingParam);
        assert_eq!(chained.kind(), ExpressionKind::Chained);
        assert_eq!(multiary.kind(), ExpressionKind::Multiary);
    }

    #[test]
    fn test_structural_equality() {
        let a = Expression::starts_with(FieldName::String, None, "Sm", false);
        let b = Expression::starts_with(FieldName::String, None, "Sm", false);
        let c = Expression::starts_with(FieldName::String, None, "Sm", true);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_node_count_and_chain_depth() {
        let leaf = Expression::equals(FieldName::TokenCode, None, "final");
        assert_eq!(leaf.node_count(), 1);
        assert_eq!(leaf.chain_depth(), 0);

        let inner = Expression::chained("Patient", "organization", "Organization", leaf).unwrap();
        let outer = Expression::chained("Observation", "subject", "Patient", inner).unwrap();
        let tree = Expression::and([outer, Expression::missing_param("status", true)]).unwrap();

        assert_eq!(tree.node_count(), 5);
        assert_eq!(tree.chain_depth(), 2);
    }

    #[test]
    fn test_concurrent_traversal() {
        let tree = Expression::or([
            Expression::greater_than(FieldName::Quantity, None, 5.4),
            Expression::less_than(FieldName::Quantity, None, 1.0),
            Expression::missing_field(FieldName::Quantity, None),
        ])
        .unwrap();

        let counts: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| tree.node_count()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(counts.iter().all(|&count| count == 4));
    }
}
