//! PostgreSQL backend for OctoFHIR search expressions.
//!
//! [`compile`] turns an [`octofhir_search::Expression`] into a parameterized
//! `WHERE` condition over the denormalized `search_idx_*` tables.

pub mod columns;
pub mod compiler;
pub mod config;
pub mod error;
pub mod sql_builder;

pub use columns::{FieldColumn, IndexTable, field_column};
pub use compiler::{CompiledQuery, SqlCompiler, compile};
pub use config::{CONFIG_SECTION, IndexTables, SqlCompilerConfig, load_config};
pub use error::{Result, SqlCompileError};
pub use sql_builder::{SqlBuilder, SqlParam, escape_like_pattern, validate_identifier};
