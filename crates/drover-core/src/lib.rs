mod dialect;
pub use dialect::Dialect;

mod error;
pub use error::{Error, Result};

pub mod driver;
pub use driver::{Capability, Connection, Provider};

pub mod entity;
pub use entity::{Entity, FieldAccessor, TypeKey};

pub mod query;
pub use query::{QueryInfo, UpdateSpec};

pub mod reader;
pub use reader::{RecordReader, RowReader};

pub mod schema;
pub use schema::{
    ColumnMapping, ContextMapping, MappingCatalog, MappingSource, TableMapping, TypeMapping,
};

mod value;
pub use value::Value;
