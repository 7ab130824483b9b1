//! Bulk insert, update and delete operations that bypass a host ORM's
//! change tracker.
//!
//! The entry point is [`BatchOperation::for_set`], scoped to one entity set
//! of a [`HostContext`]. Each operation resolves a dialect provider from the
//! live connection and runs the database's native bulk path; when no
//! registered provider recognizes the connection, the operation falls back
//! to the host's ordinary per-item save semantics.

mod config;
pub use config::BatchConfig;

mod context;
pub use context::HostContext;

mod operation;
pub use operation::{BatchOperation, BatchOptions, FilteredBatchOperation};

pub use drover_core::{
    Capability, ColumnMapping, Connection, Dialect, Entity, Error, FieldAccessor, MappingCatalog,
    MappingSource, Provider, QueryInfo, Result, RowReader, TypeKey, UpdateSpec, Value,
};
pub use drover_sql::{Expr, IntoExpr};
