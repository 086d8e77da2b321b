//! Compiler configuration.
//!
//! Loaded from TOML, either as a bare table or from a `[search_sql]` section
//! of a larger server config:
//!
//! ```toml
//! [search_sql]
//! schema = "fhir"
//! max_chain_depth = 3
//!
//! [search_sql.tables]
//! string = "idx_string"
//! ```

use crate::compiler::GENERATED_ALIAS_PREFIXES;
use crate::error::{Result, SqlCompileError};
use crate::sql_builder::validate_identifier;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the config section read by [`SqlCompilerConfig::from_toml_str`].
pub const CONFIG_SECTION: &str = "search_sql";

const DEFAULT_MAX_CHAIN_DEPTH: usize = 4;

/// Settings for [`SqlCompiler`](crate::SqlCompiler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlCompilerConfig {
    /// Schema holding resource and index tables
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Alias of the searched resource table in the outer query
    #[serde(default = "default_resource_alias")]
    pub resource_alias: String,

    /// Maximum nesting of chained searches
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: usize,

    #[serde(default)]
    pub tables: IndexTables,
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_resource_alias() -> String {
    "r".to_string()
}

fn default_max_chain_depth() -> usize {
    DEFAULT_MAX_CHAIN_DEPTH
}

impl Default for SqlCompilerConfig {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            resource_alias: default_resource_alias(),
            max_chain_depth: default_max_chain_depth(),
            tables: IndexTables::default(),
        }
    }
}

/// Names of the denormalized search index tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexTables {
    pub date: String,
    pub number: String,
    pub quantity: String,
    pub reference: String,
    pub string: String,
    pub token: String,
    pub uri: String,
    /// One row per (resource, search parameter) that produced index entries
    pub presence: String,
}

impl Default for IndexTables {
    fn default() -> Self {
        Self {
            date: "search_idx_date".to_string(),
            number: "search_idx_number".to_string(),
            quantity: "search_idx_quantity".to_string(),
            reference: "search_idx_reference".to_string(),
            string: "search_idx_string".to_string(),
            token: "search_idx_token".to_string(),
            uri: "search_idx_uri".to_string(),
            presence: "search_idx_param".to_string(),
        }
    }
}

impl IndexTables {
    fn names(&self) -> [&str; 8] {
        [
            self.date.as_str(),
            self.number.as_str(),
            self.quantity.as_str(),
            self.reference.as_str(),
            self.string.as_str(),
            self.token.as_str(),
            self.uri.as_str(),
            self.presence.as_str(),
        ]
    }
}

impl SqlCompilerConfig {
    /// Set the schema.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Set the maximum chain depth.
    #[must_use]
    pub fn with_max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = depth;
        self
    }

    /// Check that every configured name is a safe SQL identifier.
    pub fn validate(&self) -> Result<()> {
        if self.max_chain_depth == 0 {
            return Err(SqlCompileError::config("max_chain_depth must be at least 1"));
        }

        for name in [self.schema.as_str(), self.resource_alias.as_str()]
            .into_iter()
            .chain(self.tables.names())
        {
            validate_identifier(name)
                .map_err(|_| SqlCompileError::config(format!("invalid identifier '{name}'")))?;
        }

        if is_generated_alias(&self.resource_alias) {
            return Err(SqlCompileError::config(format!(
                "resource_alias '{}' collides with generated subquery aliases",
                self.resource_alias
            )));
        }

        Ok(())
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let value: toml::Value =
            toml::from_str(content).map_err(|e| SqlCompileError::config(e.to_string()))?;

        let config = match value.get(CONFIG_SECTION) {
            Some(section) => section.clone().try_into::<Self>(),
            None => value.try_into::<Self>(),
        }
        .map_err(|e| SqlCompileError::config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }
}

/// Whether `name` has the shape of a compiler-generated alias such as `idx0`.
///
/// PostgreSQL folds unquoted identifiers to lower case, so `IDX0` collides too.
fn is_generated_alias(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    GENERATED_ALIAS_PREFIXES.iter().any(|prefix| {
        name.strip_prefix(prefix)
            .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
    })
}

/// Load compiler configuration from a TOML file.
pub async fn load_config(path: impl AsRef<Path>) -> Result<SqlCompilerConfig> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await?;
    let config = SqlCompilerConfig::from_toml_str(&content)?;
    tracing::debug!(
        path = %path.display(),
        schema = %config.schema,
        max_chain_depth = config.max_chain_depth,
        "Loaded search SQL compiler config"
    );
    Ok(config)
}
