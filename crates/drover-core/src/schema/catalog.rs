use super::mapping::ContextMapping;
use super::source::MappingSource;
use crate::entity::TypeKey;
use crate::Result;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Process-lifetime cache of mapping models, keyed by host-context type.
///
/// The catalog is an explicit object rather than ambient global state so
/// tests can construct isolated instances. Entries are built lazily on first
/// use and never invalidated; the host schema is assumed immutable for the
/// life of the process.
#[derive(Debug, Default)]
pub struct MappingCatalog {
    cache: Mutex<HashMap<TypeKey, Arc<ContextMapping>>>,
}

impl MappingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mapping model for a host context, extracting it from the
    /// source on first use.
    ///
    /// Concurrent first-time callers may both build the model; the first
    /// insert wins and the duplicate is discarded, so a race can only cost
    /// redundant work, never expose a partial entry.
    pub fn mapping_for(
        &self,
        context: TypeKey,
        source: &dyn MappingSource,
    ) -> Result<Arc<ContextMapping>> {
        if let Some(mapping) = self.lock().get(&context) {
            return Ok(mapping.clone());
        }

        let built = Arc::new(ContextMapping::from_source(source)?);

        let mut cache = self.lock();
        Ok(cache.entry(context).or_insert(built).clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TypeKey, Arc<ContextMapping>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::source::{
        DbType, DiscriminatorCondition, EntitySetDef, FragmentDef, PropertyDef,
    };
    use crate::Error;

    struct Ctx;
    struct Person;
    struct Contact;
    struct Employee;
    struct Manager;

    fn ctx_key() -> TypeKey {
        TypeKey::of::<Ctx>("Ctx")
    }

    fn scalar_int(name: &str, column: &str) -> PropertyDef {
        PropertyDef::scalar(name, column, DbType::named("int"))
    }

    /// Three-level hierarchy sharing one table. Every level re-declares the
    /// key property, as hierarchy fragments do.
    struct HierarchySource;

    impl MappingSource for HierarchySource {
        fn entity_sets(&self) -> Vec<EntitySetDef> {
            let contact = TypeKey::of::<Contact>("Contact");
            let employee = TypeKey::of::<Employee>("Employee");
            let manager = TypeKey::of::<Manager>("Manager");

            vec![EntitySetDef {
                name: "Contacts".to_string(),
                entity: contact,
                key_properties: vec!["Id".to_string()],
                fragments: vec![
                    FragmentDef {
                        schema: "dbo".to_string(),
                        table: "People".to_string(),
                        declared_by: contact,
                        depth: 0,
                        is_hierarchy: true,
                        condition: None,
                        properties: vec![
                            scalar_int("Id", "Id"),
                            PropertyDef::scalar(
                                "Name",
                                "Name",
                                DbType::with_max_length("nvarchar", 50),
                            ),
                        ],
                    },
                    FragmentDef {
                        schema: "dbo".to_string(),
                        table: "People".to_string(),
                        declared_by: contact,
                        depth: 0,
                        is_hierarchy: false,
                        condition: Some(DiscriminatorCondition {
                            column: "Discriminator".to_string(),
                            value: "Contact".to_string(),
                        }),
                        properties: vec![scalar_int("Id", "Id")],
                    },
                    FragmentDef {
                        schema: "dbo".to_string(),
                        table: "People".to_string(),
                        declared_by: employee,
                        depth: 1,
                        is_hierarchy: false,
                        condition: Some(DiscriminatorCondition {
                            column: "Discriminator".to_string(),
                            value: "Employee".to_string(),
                        }),
                        properties: vec![scalar_int("Id", "Id"), scalar_int("Salary", "Salary")],
                    },
                    FragmentDef {
                        schema: "dbo".to_string(),
                        table: "People".to_string(),
                        declared_by: manager,
                        depth: 2,
                        is_hierarchy: false,
                        condition: Some(DiscriminatorCondition {
                            column: "Discriminator".to_string(),
                            value: "Manager".to_string(),
                        }),
                        properties: vec![scalar_int("Id", "Id"), scalar_int("Reports", "Reports")],
                    },
                ],
            }]
        }
    }

    #[test]
    fn hierarchy_dedup_keeps_most_derived_owner() {
        let catalog = MappingCatalog::new();
        let mapping = catalog.mapping_for(ctx_key(), &HierarchySource).unwrap();

        let table = mapping
            .type_mapping(TypeKey::of::<Contact>("Contact"))
            .unwrap()
            .table();

        let ids: Vec<_> = table
            .property_mappings
            .iter()
            .filter(|p| p.property_path == "Id")
            .collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].owner.name(), "Manager");
        assert!(ids[0].is_primary_key);

        let paths: Vec<_> = table
            .property_mappings
            .iter()
            .map(|p| p.property_path.as_str())
            .collect();
        assert_eq!(paths, vec!["Id", "Name", "Salary", "Reports"]);
    }

    #[test]
    fn tph_discriminators_round_trip() {
        let catalog = MappingCatalog::new();
        let mapping = catalog.mapping_for(ctx_key(), &HierarchySource).unwrap();

        let table = mapping
            .type_mapping(TypeKey::of::<Contact>("Contact"))
            .unwrap()
            .table();

        let tph = table.tph.as_ref().unwrap();
        assert_eq!(tph.column_name, "Discriminator");
        assert_eq!(
            tph.discriminator_for(TypeKey::of::<Contact>("Contact")),
            Some("Contact")
        );
        assert_eq!(
            tph.discriminator_for(TypeKey::of::<Employee>("Employee")),
            Some("Employee")
        );
        assert_eq!(
            tph.discriminator_for(TypeKey::of::<Manager>("Manager")),
            Some("Manager")
        );
    }

    #[test]
    fn mapping_is_cached_per_context() {
        let catalog = MappingCatalog::new();
        let first = catalog.mapping_for(ctx_key(), &HierarchySource).unwrap();
        let second = catalog.mapping_for(ctx_key(), &HierarchySource).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn complex_properties_flatten_with_dotted_paths() {
        struct NestedSource;

        impl MappingSource for NestedSource {
            fn entity_sets(&self) -> Vec<EntitySetDef> {
                let person = TypeKey::of::<Person>("Person");
                vec![EntitySetDef {
                    name: "People".to_string(),
                    entity: person,
                    key_properties: vec!["Id".to_string()],
                    fragments: vec![FragmentDef {
                        schema: "dbo".to_string(),
                        table: "People".to_string(),
                        declared_by: person,
                        depth: 0,
                        is_hierarchy: false,
                        condition: None,
                        properties: vec![
                            scalar_int("Id", "Id"),
                            PropertyDef::complex(
                                "Address",
                                vec![
                                    PropertyDef::scalar(
                                        "Street",
                                        "Address_Street",
                                        DbType::with_max_length("nvarchar", 100),
                                    ),
                                    PropertyDef::complex(
                                        "Geo",
                                        vec![scalar_int("Lat", "Address_Geo_Lat")],
                                    ),
                                ],
                            ),
                        ],
                    }],
                }]
            }
        }

        let catalog = MappingCatalog::new();
        let mapping = catalog.mapping_for(ctx_key(), &NestedSource).unwrap();
        let table = mapping
            .type_mapping(TypeKey::of::<Person>("Person"))
            .unwrap()
            .table();

        let paths: Vec<_> = table
            .property_mappings
            .iter()
            .map(|p| (p.property_path.as_str(), p.column_name.as_str()))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("Id", "Id"),
                ("Address.Street", "Address_Street"),
                ("Address.Geo.Lat", "Address_Geo_Lat"),
            ]
        );
        assert!(table.tph.is_none());
    }

    #[test]
    fn missing_fragment_is_a_configuration_error() {
        struct EmptySource;

        impl MappingSource for EmptySource {
            fn entity_sets(&self) -> Vec<EntitySetDef> {
                vec![EntitySetDef {
                    name: "Orphans".to_string(),
                    entity: TypeKey::of::<Person>("Person"),
                    key_properties: vec![],
                    fragments: vec![],
                }]
            }
        }

        let catalog = MappingCatalog::new();
        let err = catalog.mapping_for(ctx_key(), &EmptySource).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
