//! Core contracts for dbscope.
//!
//! This crate defines the engine-neutral schema model produced by the
//! introspection drivers, together with the error type and the validation
//! and relation-graph helpers used by downstream tooling.

pub mod constraints;
pub mod error;
pub mod graph;
pub mod schema;
pub mod types;
pub mod validation;

pub use constraints::{Constraint, ConstraintKind, FkAction, ForeignKeyTarget, Index, Trigger};
pub use error::{BoxError, Error, Result};
pub use graph::{
    RelationGraphReport, RelationGraphSummary, build_relation_graph, relations_from_tables,
};
pub use schema::{Column, Relation, Schema, Table, TableInfo, TableReference};
pub use types::{DriverInfo, Engine, ServerVersion, TableKind};
pub use validation::{UnresolvedReference, unresolved_references, validate_schema};
