mod catalog;
pub use catalog::MappingCatalog;

mod mapping;
pub use mapping::{ColumnMapping, ContextMapping, PropertyMapping, TableMapping, TphMapping, TypeMapping};

pub mod source;
pub use source::{DbType, MappingSource};
