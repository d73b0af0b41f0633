//! Domain core for liftline - schema, query compilation, and run state.
//!
//! This crate holds the pure, I/O-free pieces of the system:
//! - **Schema registry** (`schema`) - the closed set of meet-result columns
//! - **Filter grammar** (`filter`) - the structured filter/sort/limit types
//!   an agent tool call deserializes into
//! - **Query compiler** (`compiler`) - filter grammar -> parameterized SQL,
//!   injection-safe by construction
//! - **Run state** (`state`) - the mutable record threaded through one
//!   orchestration run
//! - **Configuration** (`config`) - file + env + override layering
//!
//! # Safety principle
//!
//! The LLM is strictly a translator. Every value it supplies is bound as a
//! named query parameter; only column names and operators - both closed
//! enumerations validated here - are ever interpolated into query text.

pub mod compiler;
pub mod config;
pub mod filter;
pub mod schema;
pub mod state;

pub use compiler::{CompileError, CompiledQuery, QueryCompiler, DEFAULT_LIMIT, LIMIT_CEILING};
pub use filter::{FilterClause, FilterOperator, FilterValue, QuerySpec, SortDirection};
pub use schema::ColumnKind;
pub use state::{AgentId, Row, RunState, StateSnapshot, TriggerInput};
