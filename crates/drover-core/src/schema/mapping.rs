use super::source::{DbType, FragmentDef, MappingSource, PropertyDef};
use crate::entity::TypeKey;
use crate::{Error, Result};

use indexmap::IndexMap;

/// Mapping information for every entity type reachable from one host context.
#[derive(Debug)]
pub struct ContextMapping {
    /// Per-entity mappings, keyed by the hierarchy root type.
    pub type_mappings: IndexMap<TypeKey, TypeMapping>,
}

/// Mapping information for a single entity type.
#[derive(Debug)]
pub struct TypeMapping {
    pub entity: TypeKey,
    /// The tables this entity maps to. The first entry is the operative one
    /// for bulk operations.
    pub table_mappings: Vec<TableMapping>,
}

/// The mapping of an entity (or hierarchy of entities) to one table.
#[derive(Debug)]
pub struct TableMapping {
    pub schema: String,
    pub table: String,
    /// Ordered property-to-column mappings, deduplicated so that inherited
    /// properties keep only the most-derived declaration.
    pub property_mappings: Vec<PropertyMapping>,
    /// Present only for table-per-hierarchy groups.
    pub tph: Option<TphMapping>,
}

/// A single property-to-column mapping, as seen by one concrete type.
#[derive(Debug, Clone)]
pub struct PropertyMapping {
    pub column_name: String,
    pub db_type: DbType,
    /// Dot-separated path on the object, e.g. `Address.ZipCode`.
    pub property_path: String,
    /// The concrete type that declares this property.
    pub owner: TypeKey,
    pub is_primary_key: bool,
}

/// Discriminator configuration for a table shared by several concrete types.
#[derive(Debug)]
pub struct TphMapping {
    pub column_name: String,
    /// Concrete type to discriminator literal.
    pub discriminators: IndexMap<TypeKey, String>,
}

impl TphMapping {
    pub fn discriminator_for(&self, entity: TypeKey) -> Option<&str> {
        self.discriminators.get(&entity).map(String::as_str)
    }
}

/// A flattened per-call column view handed to providers.
///
/// `static_value` is set only for discriminator columns and overrides any
/// property read.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pub name_in_database: String,
    pub name_on_object: String,
    pub data_type: String,
    pub is_primary_key: bool,
    pub static_value: Option<String>,
}

impl ContextMapping {
    /// Builds the mapping model for every entity set the source exposes.
    ///
    /// An entity set without a resolvable storage fragment is a fatal
    /// configuration error, never silently skipped.
    pub fn from_source(source: &dyn MappingSource) -> Result<Self> {
        let mut type_mappings = IndexMap::new();

        for set in source.entity_sets() {
            let primary = set
                .fragments
                .iter()
                .find(|f| f.is_hierarchy)
                .or_else(|| set.fragments.first())
                .ok_or_else(|| {
                    Error::configuration(format!(
                        "no storage fragment could be resolved for entity set `{}`",
                        set.name
                    ))
                })?;

            let mut table = TableMapping {
                schema: primary.schema.clone(),
                table: primary.table.clone(),
                property_mappings: Vec::new(),
                tph: build_tph(&set.fragments),
            };

            // Flatten every fragment's property tree, then keep one entry per
            // path: hierarchy fragments repeat inherited properties (keys in
            // particular) for every level, and the most-derived declaration
            // wins.
            let mut merged: IndexMap<String, (usize, PropertyMapping)> = IndexMap::new();

            for fragment in &set.fragments {
                let mut flat = Vec::new();
                flatten(&fragment.properties, "", &mut flat);

                for (path, column, db_type) in flat {
                    if column.is_empty() {
                        return Err(Error::configuration(format!(
                            "property `{}` of entity set `{}` maps to an empty column name",
                            path, set.name
                        )));
                    }

                    let candidate = PropertyMapping {
                        column_name: column,
                        db_type,
                        property_path: path.clone(),
                        owner: fragment.declared_by,
                        is_primary_key: false,
                    };

                    match merged.get_mut(&path) {
                        Some((depth, existing)) => {
                            if fragment.depth > *depth {
                                *depth = fragment.depth;
                                *existing = candidate;
                            }
                        }
                        None => {
                            merged.insert(path, (fragment.depth, candidate));
                        }
                    }
                }
            }

            let mut properties: Vec<PropertyMapping> =
                merged.into_values().map(|(_, p)| p).collect();

            for property in &mut properties {
                if set
                    .key_properties
                    .iter()
                    .any(|key| key == &property.property_path)
                {
                    property.is_primary_key = true;
                }
            }

            table.property_mappings = properties;

            type_mappings.insert(
                set.entity,
                TypeMapping {
                    entity: set.entity,
                    table_mappings: vec![table],
                },
            );
        }

        Ok(Self { type_mappings })
    }

    pub fn type_mapping(&self, entity: TypeKey) -> Result<&TypeMapping> {
        self.type_mappings.get(&entity).ok_or_else(|| {
            Error::configuration(format!("no mapping registered for entity `{}`", entity.name()))
        })
    }
}

impl TypeMapping {
    pub fn table(&self) -> &TableMapping {
        // `from_source` always produces at least one table mapping.
        &self.table_mappings[0]
    }
}

fn build_tph(fragments: &[FragmentDef]) -> Option<TphMapping> {
    if !fragments.iter().any(|f| f.is_hierarchy) {
        return None;
    }

    let with_conditions: Vec<_> = fragments
        .iter()
        .filter_map(|f| f.condition.as_ref().map(|c| (f.declared_by, c)))
        .collect();

    // A discriminator only means anything when the table is actually shared.
    if with_conditions.len() < 2 {
        return None;
    }

    let column_name = with_conditions[0].1.column.clone();
    let mut discriminators = IndexMap::new();
    for (declared_by, condition) in with_conditions {
        discriminators.insert(declared_by, condition.value.clone());
    }

    Some(TphMapping {
        column_name,
        discriminators,
    })
}

fn flatten(properties: &[PropertyDef], prefix: &str, out: &mut Vec<(String, String, DbType)>) {
    for property in properties {
        match property {
            PropertyDef::Scalar(scalar) => {
                out.push((
                    format!("{prefix}{}", scalar.name),
                    scalar.column.clone(),
                    scalar.db_type.clone(),
                ));
            }
            PropertyDef::Complex(complex) => {
                let prefix = format!("{prefix}{}.", complex.name);
                flatten(&complex.properties, &prefix, out);
            }
        }
    }
}
