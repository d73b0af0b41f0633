//! Filter grammar -> parameterized store query.
//!
//! The compiler is stateless and shared read-only across concurrent runs.
//! Its one hard guarantee: a caller-supplied value never appears as a
//! literal substring of the query text. Values travel in the parameter map
//! under synthetic names; only schema-validated column names and the closed
//! operator enumeration are interpolated.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::filter::{FilterValue, QuerySpec};
use crate::schema;

/// Hard ceiling on rows per query. Caller limits above this are clamped,
/// not rejected.
pub const LIMIT_CEILING: u32 = 100;

/// Row limit applied when the caller specifies none.
pub const DEFAULT_LIMIT: u32 = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("unknown column `{0}` is not in the meet-results schema")]
    UnknownColumn(String),
}

/// Store-side type a parameter is declared as in its placeholder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Text,
    Numeric,
}

impl ParamKind {
    fn store_type(self) -> &'static str {
        match self {
            Self::Text => "String",
            Self::Numeric => "Float64",
        }
    }
}

/// One bound value: rendered text plus its declared store type.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundParam {
    pub value: String,
    pub kind: ParamKind,
}

/// Query text with named placeholders plus the values to bind.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: BTreeMap<String, BoundParam>,
}

/// Compiles [`QuerySpec`]s against one source table.
#[derive(Clone, Debug)]
pub struct QueryCompiler {
    table: String,
}

impl QueryCompiler {
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into() }
    }

    /// Compile a spec into query text and a parameter map.
    ///
    /// Unknown columns fail the whole compilation. A clause whose operator
    /// requires a value but has none is dropped as a no-op filter, never
    /// miscompiled. An empty filter set compiles to an unfiltered, fully
    /// ordered, limited query.
    pub fn compile(&self, spec: &QuerySpec) -> Result<CompiledQuery, CompileError> {
        for clause in &spec.filters {
            if !schema::contains(&clause.column) {
                return Err(CompileError::UnknownColumn(clause.column.clone()));
            }
        }
        if let Some(order_column) = &spec.order_by {
            if !schema::contains(order_column) {
                return Err(CompileError::UnknownColumn(order_column.clone()));
            }
        }

        let mut params = BTreeMap::new();
        let mut where_clauses = Vec::new();
        // Parameter numbering restarts per compile call so identical specs
        // compile to identical text.
        let mut param_index = 0usize;

        for clause in &spec.filters {
            if !clause.operator.requires_value() {
                where_clauses.push(format!("{} {}", clause.column, clause.operator.as_sql()));
                continue;
            }

            let Some(value) = &clause.value else {
                // Missing required value: no-op filter, skip the clause.
                continue;
            };

            let name = format!("param{param_index}");
            param_index += 1;

            let bound = if clause.operator.is_pattern() {
                BoundParam { value: format!("%{}%", value.render()), kind: ParamKind::Text }
            } else {
                let kind = match value {
                    FilterValue::Number(_) => ParamKind::Numeric,
                    FilterValue::Text(_) => ParamKind::Text,
                };
                BoundParam { value: value.render(), kind }
            };

            where_clauses.push(format!(
                "{} {} {{{}:{}}}",
                clause.column,
                clause.operator.as_sql(),
                name,
                bound.kind.store_type()
            ));
            params.insert(name, bound);
        }

        let mut sql = format!("SELECT {} FROM '{}'", schema::select_list(), self.table);
        if !where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clauses.join(" AND "));
        }

        match &spec.order_by {
            Some(column) => {
                let direction = spec.sort_direction.unwrap_or_default();
                sql.push_str(&format!(" ORDER BY {} {}", column, direction.as_sql()));
            }
            // Stable two-key fallback keeps unordered requests deterministic.
            None => sql.push_str(" ORDER BY Name, Date DESC"),
        }

        let limit = spec.limit.unwrap_or(DEFAULT_LIMIT).min(LIMIT_CEILING);
        sql.push_str(&format!(" LIMIT {limit}"));

        Ok(CompiledQuery { sql, params })
    }
}
