//! The narrow boundary between the mapping catalog and a host ORM.
//!
//! A `MappingSource` exposes just enough of the host's metadata to build the
//! mapping model: entity sets, their storage fragments, and key properties.
//! Production code provides one implementation backed by the real host
//! metadata; tests build the definitions by hand.

use crate::entity::TypeKey;

/// Read-only access to the host's relational mapping metadata.
pub trait MappingSource: Send + Sync {
    fn entity_sets(&self) -> Vec<EntitySetDef>;
}

/// One mapped entity set: a root entity type plus the storage fragments that
/// describe where its hierarchy lands in the database.
#[derive(Debug, Clone)]
pub struct EntitySetDef {
    pub name: String,
    pub entity: TypeKey,
    /// Declared key property paths, in key order.
    pub key_properties: Vec<String>,
    pub fragments: Vec<FragmentDef>,
}

/// A storage-layer description of how one entity/table pairing's columns
/// correspond to object properties.
#[derive(Debug, Clone)]
pub struct FragmentDef {
    pub schema: String,
    pub table: String,
    /// The concrete type whose properties this fragment declares.
    pub declared_by: TypeKey,
    /// Distance of `declared_by` from the hierarchy root. Zero outside
    /// inheritance chains.
    pub depth: usize,
    /// True for the fragment covering a whole table-per-hierarchy group.
    pub is_hierarchy: bool,
    /// Discriminator condition for table-per-hierarchy subtypes.
    pub condition: Option<DiscriminatorCondition>,
    pub properties: Vec<PropertyDef>,
}

#[derive(Debug, Clone)]
pub struct DiscriminatorCondition {
    pub column: String,
    pub value: String,
}

/// A property as the storage fragment sees it. Complex properties nest;
/// flattening into dot-separated paths happens in the catalog.
#[derive(Debug, Clone)]
pub enum PropertyDef {
    Scalar(ScalarProperty),
    Complex(ComplexProperty),
}

#[derive(Debug, Clone)]
pub struct ScalarProperty {
    pub name: String,
    pub column: String,
    pub db_type: DbType,
}

#[derive(Debug, Clone)]
pub struct ComplexProperty {
    pub name: String,
    pub properties: Vec<PropertyDef>,
}

impl PropertyDef {
    pub fn scalar(name: impl Into<String>, column: impl Into<String>, db_type: DbType) -> Self {
        Self::Scalar(ScalarProperty {
            name: name.into(),
            column: column.into(),
            db_type,
        })
    }

    pub fn complex(name: impl Into<String>, properties: Vec<PropertyDef>) -> Self {
        Self::Complex(ComplexProperty {
            name: name.into(),
            properties,
        })
    }
}

/// A database storage type, with the facets needed to render the full type
/// name in DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbType {
    pub name: String,
    pub max_length: Option<u32>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
}

impl DbType {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_length: None,
            precision: None,
            scale: None,
        }
    }

    pub fn with_max_length(name: impl Into<String>, max_length: u32) -> Self {
        Self {
            max_length: Some(max_length),
            ..Self::named(name)
        }
    }

    pub fn with_precision(name: impl Into<String>, precision: u8, scale: u8) -> Self {
        Self {
            precision: Some(precision),
            scale: Some(scale),
            ..Self::named(name)
        }
    }

    /// The full type name as it appears in DDL. Character types render their
    /// length and exact numerics their precision and scale; everything else
    /// renders unqualified.
    pub fn full(&self) -> String {
        match self.name.as_str() {
            "varchar" | "nvarchar" => match self.max_length {
                Some(len) => format!("{}({})", self.name, len),
                None => self.name.clone(),
            },
            "decimal" | "numeric" => match (self.precision, self.scale) {
                (Some(p), Some(s)) => format!("{}({},{})", self.name, p, s),
                _ => self.name.clone(),
            },
            _ => self.name.clone(),
        }
    }
}
