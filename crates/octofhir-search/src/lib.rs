//! Backend-independent search expressions for the OctoFHIR server.
//!
//! The parameter parser builds [`Expression`] trees through the smart
//! constructors on [`Expression`]; storage backends compile them by
//! implementing [`ExpressionVisitor`].

pub mod error;
pub mod expression;
pub mod field;
pub mod operator;
pub mod value;

pub use error::{ErrorCategory, ExpressionError, Result};
pub use expression::{
    BinaryExpression, ChainDepth, ChainedExpression, Expression, ExpressionKind,
    ExpressionPrinter, ExpressionVisitor, MissingFieldExpression, MissingParamExpression,
    MultiaryExpression, NodeCounter, StringExpression,
};
pub use field::{ComponentIndex, FieldName};
pub use operator::{BinaryOperator, MultiaryOperator, StringOperator};
pub use value::SearchValue;
