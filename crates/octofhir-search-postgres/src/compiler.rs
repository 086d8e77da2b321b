//! Compiles search expression trees into parameterized PostgreSQL conditions.
//!
//! Every field comparison becomes an `EXISTS` probe into the field's search
//! index table, correlated with the resource currently in scope. Chains open
//! a new scope by joining `search_idx_reference` to the target resource table,
//! so the sub-expression is evaluated against the referenced resource.
//!
//! ```
//! use octofhir_search::{Expression, FieldName};
//! use octofhir_search_postgres::{SqlCompilerConfig, compile};
//!
//! let expr = Expression::chained(
//!     "Observation",
//!     "subject",
//!     "Patient",
//!     Expression::starts_with(FieldName::String, None, "Smi", true),
//! )?;
//! let query = compile(&SqlCompilerConfig::default(), "Observation", &expr)?;
//! assert!(query.condition.contains("JOIN public.patient"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::columns::{IndexTable, field_column};
use crate::config::SqlCompilerConfig;
use crate::error::{Result, SqlCompileError};
use crate::sql_builder::{SqlBuilder, SqlParam, escape_like_pattern, validate_identifier};
use octofhir_search::{
    BinaryExpression, BinaryOperator, ChainedExpression, ComponentIndex, Expression,
    ExpressionVisitor, MissingFieldExpression, MissingParamExpression, MultiaryExpression,
    MultiaryOperator, SearchValue, StringExpression, StringOperator,
};
use std::fmt;
use time::format_description::well_known::Rfc3339;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Prefixes of the aliases generated for index probes and chain joins.
pub(crate) const GENERATED_ALIAS_PREFIXES: [&str; 4] = ["idx", "param", "sir", "chain"];

/// Chain joins only follow references resolved to a resource on this server.
const LOCAL_REFERENCE_KIND: i32 = 1;

/// A compiled search condition with its bind parameters.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    /// Schema-qualified table of the searched resource type
    pub table: String,
    /// Alias the condition uses for the searched resource
    pub alias: String,
    pub condition: String,
    pub params: Vec<SqlParam>,
}

impl CompiledQuery {
    /// Wrap the condition into a query selecting matching resource ids.
    pub fn to_select(&self) -> String {
        format!(
            "SELECT {alias}.id FROM {table} {alias} WHERE {condition}",
            alias = self.alias,
            table = self.table,
            condition = self.condition
        )
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.condition)
    }
}

/// Compile `expr` as a search over `resource_type`.
pub fn compile(
    config: &SqlCompilerConfig,
    resource_type: &str,
    expr: &Expression,
) -> Result<CompiledQuery> {
    config.validate()?;

    let depth = expr.chain_depth();
    if depth > config.max_chain_depth {
        tracing::warn!(
            resource_type,
            depth,
            max = config.max_chain_depth,
            "Rejected search expression with too many chained hops"
        );
        return Err(SqlCompileError::ChainTooDeep {
            depth,
            max: config.max_chain_depth,
        });
    }

    let mut compiler = SqlCompiler::new(config, resource_type)?;
    let condition = expr.accept(&mut compiler)?;
    let table = compiler.resource_table(resource_type)?;
    let params = compiler.finish();

    tracing::debug!(
        resource_type,
        nodes = expr.node_count(),
        params = params.len(),
        "Compiled search expression"
    );

    Ok(CompiledQuery {
        table,
        alias: config.resource_alias.clone(),
        condition,
        params,
    })
}

/// Resource in scope while compiling: the searched resource at the root, the
/// referenced resource inside a chain.
#[derive(Debug, Clone)]
struct Scope {
    resource_type: String,
    alias: String,
}

/// An opened `EXISTS` probe into an index table, awaiting its predicate.
struct IndexScan {
    alias: String,
    sql: String,
}

impl IndexScan {
    fn finish(mut self, predicate: Option<&str>) -> String {
        if let Some(predicate) = predicate {
            self.sql.push_str(" AND ");
            self.sql.push_str(predicate);
        }
        self.sql.push(')');
        self.sql
    }
}

/// Visitor compiling one expression tree.
///
/// Holds the bind parameters and alias counter for a single traversal; create
/// a new compiler per query.
pub struct SqlCompiler<'a> {
    config: &'a SqlCompilerConfig,
    builder: SqlBuilder,
    root: Scope,
    chain: Vec<Scope>,
    next_alias: usize,
}

impl<'a> SqlCompiler<'a> {
    pub fn new(config: &'a SqlCompilerConfig, resource_type: &str) -> Result<Self> {
        config.validate()?;
        validate_identifier(resource_type)?;
        Ok(Self {
            config,
            builder: SqlBuilder::new(),
            root: Scope {
                resource_type: resource_type.to_string(),
                alias: config.resource_alias.clone(),
            },
            chain: Vec::new(),
            next_alias: 0,
        })
    }

    /// Start placeholder numbering after `offset` existing parameters.
    pub fn with_param_offset(mut self, offset: usize) -> Self {
        self.builder = std::mem::take(&mut self.builder).with_param_offset(offset);
        self
    }

    /// Consume the compiler, returning the parameters bound so far.
    pub fn finish(self) -> Vec<SqlParam> {
        self.builder.into_params()
    }

    fn scope(&self) -> &Scope {
        self.chain.last().unwrap_or(&self.root)
    }

    fn alias(&mut self, prefix: &str) -> String {
        let alias = format!("{prefix}{}", self.next_alias);
        self.next_alias += 1;
        alias
    }

    fn qualified(&self, table: &str) -> String {
        format!("{}.{}", self.config.schema, table)
    }

    fn resource_table(&self, resource_type: &str) -> Result<String> {
        let table = resource_type.to_lowercase();
        validate_identifier(&table)?;
        Ok(self.qualified(&table))
    }

    fn index_scan(&mut self, table: IndexTable, component: Option<ComponentIndex>) -> IndexScan {
        let alias = self.alias("idx");
        let Scope {
            resource_type,
            alias: owner,
        } = self.scope().clone();
        let table = self.qualified(table.name(&self.config.tables));

        let rt = self.builder.add_text_param(resource_type);
        let mut sql = format!(
            "EXISTS (SELECT 1 FROM {table} {alias} \
             WHERE {alias}.resource_type = ${rt} AND {alias}.resource_id = {owner}.id"
        );
        if let Some(index) = component {
            let p = self
                .builder
                .add_param(SqlParam::Integer(i64::from(index.get())));
            sql.push_str(&format!(" AND {alias}.component = ${p}"));
        }

        IndexScan { alias, sql }
    }
}

impl ExpressionVisitor for SqlCompiler<'_> {
    type Output = Result<String>;

    fn visit_binary(&mut self, expr: &BinaryExpression) -> Result<String> {
        let column = field_column(expr.field_name());
        let param = bind_value(expr.value())?;
        let scan = self.index_scan(column.table, expr.component_index());

        let cast = param.cast();
        let p = self.builder.add_param(param);
        let predicate = format!(
            "{}.{} {} ${p}{cast}",
            scan.alias,
            column.column,
            binary_sql(expr.operator())
        );

        tracing::trace!(
            field = %expr.field_name(),
            operator = %expr.operator(),
            "Compiled binary expression"
        );
        Ok(scan.finish(Some(&predicate)))
    }

    fn visit_string(&mut self, expr: &StringExpression) -> Result<String> {
        let column = field_column(expr.field_name());
        let scan = self.index_scan(column.table, expr.component_index());

        let (match_column, needs_lower) = column.match_column(expr.ignore_case());
        let target = if needs_lower {
            format!("LOWER({}.{match_column})", scan.alias)
        } else {
            format!("{}.{match_column}", scan.alias)
        };

        let value = if expr.ignore_case() {
            normalize_string(expr.value())
        } else {
            expr.value().to_string()
        };

        // Negated modes probe for a matching value and negate the probe, so
        // "not contains" means no indexed value contains the text.
        let (op, pattern) = match expr.operator() {
            StringOperator::Equals => ("=", value),
            StringOperator::Contains | StringOperator::NotContains => {
                ("LIKE", format!("%{}%", escape_like_pattern(&value)))
            }
            StringOperator::StartsWith | StringOperator::NotStartsWith => {
                ("LIKE", format!("{}%", escape_like_pattern(&value)))
            }
            StringOperator::EndsWith | StringOperator::NotEndsWith => {
                ("LIKE", format!("%{}", escape_like_pattern(&value)))
            }
        };
        let p = self.builder.add_text_param(pattern);
        let probe = scan.finish(Some(&format!("{target} {op} ${p}")));

        tracing::trace!(
            field = %expr.field_name(),
            operator = %expr.operator(),
            ignore_case = expr.ignore_case(),
            "Compiled string expression"
        );
        if expr.operator().is_negated() {
            Ok(format!("NOT {probe}"))
        } else {
            Ok(probe)
        }
    }

    fn visit_missing_field(&mut self, expr: &MissingFieldExpression) -> Result<String> {
        let column = field_column(expr.field_name());
        let scan = self.index_scan(column.table, expr.component_index());
        let predicate = format!("{}.{} IS NOT NULL", scan.alias, column.column);
        let probe = scan.finish(Some(&predicate));
        Ok(format!("NOT {probe}"))
    }

    fn visit_missing_param(&mut self, expr: &MissingParamExpression) -> Result<String> {
        let alias = self.alias("param");
        let Scope {
            resource_type,
            alias: owner,
        } = self.scope().clone();
        let table = self.qualified(&self.config.tables.presence);

        let rt = self.builder.add_text_param(resource_type);
        let pc = self.builder.add_text_param(expr.param_name());
        let probe = format!(
            "EXISTS (SELECT 1 FROM {table} {alias} \
             WHERE {alias}.resource_type = ${rt} AND {alias}.resource_id = {owner}.id \
             AND {alias}.param_code = ${pc})"
        );

        if expr.is_missing() {
            Ok(format!("NOT {probe}"))
        } else {
            Ok(probe)
        }
    }

    fn visit_chained(&mut self, expr: &ChainedExpression) -> Result<String> {
        let depth = self.chain.len() + 1;
        if depth > self.config.max_chain_depth {
            tracing::warn!(
                depth,
                max = self.config.max_chain_depth,
                "Chained search exceeds maximum depth"
            );
            return Err(SqlCompileError::ChainTooDeep {
                depth,
                max: self.config.max_chain_depth,
            });
        }

        let Scope {
            resource_type,
            alias: owner,
        } = self.scope().clone();
        if expr.resource_type() != resource_type {
            return Err(SqlCompileError::ChainTypeMismatch {
                expected: resource_type,
                found: expr.resource_type().to_string(),
            });
        }

        let target_table = self.resource_table(expr.target_resource_type())?;
        let reference_table = self.qualified(&self.config.tables.reference);
        let sir = self.alias("sir");
        let target = self.alias("chain");

        let rt = self.builder.add_text_param(expr.resource_type());
        let pc = self.builder.add_text_param(expr.param_name());
        let tt = self.builder.add_text_param(expr.target_resource_type());

        self.chain.push(Scope {
            resource_type: expr.target_resource_type().to_string(),
            alias: target.clone(),
        });
        let inner = expr.expression().accept(self);
        self.chain.pop();
        let inner = inner?;

        tracing::trace!(
            param = expr.param_name(),
            target = expr.target_resource_type(),
            depth,
            "Compiled chained expression"
        );
        Ok(format!(
            "EXISTS (SELECT 1 FROM {reference_table} {sir} \
             JOIN {target_table} {target} ON {target}.id = {sir}.target_id \
             AND {target}.status != 'deleted' \
             WHERE {sir}.resource_type = ${rt} AND {sir}.resource_id = {owner}.id \
             AND {sir}.param_code = ${pc} AND {sir}.ref_kind = {LOCAL_REFERENCE_KIND} \
             AND {sir}.target_type = ${tt} \
             AND {inner})"
        ))
    }

    fn visit_multiary(&mut self, expr: &MultiaryExpression) -> Result<String> {
        let conditions = expr
            .expressions()
            .iter()
            .map(|child| child.accept(self))
            .collect::<Result<Vec<_>>>()?;

        let separator = match expr.operator() {
            MultiaryOperator::And => "AND",
            MultiaryOperator::Or => "OR",
        };
        Ok(SqlBuilder::join_conditions(&conditions, separator))
    }
}

fn binary_sql(op: BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::Equal => "=",
        BinaryOperator::GreaterThan => ">",
        BinaryOperator::GreaterThanOrEqual => ">=",
        BinaryOperator::LessThan => "<",
        BinaryOperator::LessThanOrEqual => "<=",
    }
}

fn bind_value(value: &SearchValue) -> Result<SqlParam> {
    match value {
        SearchValue::Text(s) => Ok(SqlParam::Text(s.clone())),
        SearchValue::Integer(i) => Ok(SqlParam::Integer(*i)),
        SearchValue::Decimal(d) if d.is_finite() => Ok(SqlParam::Float(*d)),
        SearchValue::Decimal(d) => Err(SqlCompileError::InvalidValue(format!(
            "decimal value {d} is not comparable"
        ))),
        SearchValue::DateTime(dt) => dt
            .format(&Rfc3339)
            .map(SqlParam::Timestamp)
            .map_err(|e| SqlCompileError::InvalidValue(e.to_string())),
        SearchValue::Boolean(b) => Ok(SqlParam::Boolean(*b)),
    }
}

/// Case and accent folding: NFKD decomposition with combining marks dropped,
/// then lower-cased.
///
/// Matches the folding expected of `value_normalized`. Fields compared through
/// `LOWER()` only fold case on the column side, so accent-insensitive matches
/// on them depend on how the index stores the value.
fn normalize_string(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
