use crate::Value;

use std::any::{Any, TypeId};
use std::fmt;

/// Identifies an entity type or host-context type.
///
/// The name travels with the `TypeId` so that mapping sources can describe
/// types declaratively and diagnostics stay readable.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>(name: &'static str) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "TypeKey({})", self.name)
    }
}

/// A registration-time property accessor.
///
/// One entry per readable scalar property, keyed by its dot-separated path.
/// The getter receives the entity as `&dyn Any` and downcasts internally,
/// which keeps the hot insert loop free of runtime type inspection.
#[derive(Clone, Copy)]
pub struct FieldAccessor {
    pub path: &'static str,
    pub get: fn(&dyn Any) -> Value,
}

impl fmt::Debug for FieldAccessor {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("FieldAccessor")
            .field("path", &self.path)
            .finish()
    }
}

/// A type whose instances can be streamed through bulk operations.
///
/// Implementations declare their identity, their place in a mapped
/// inheritance chain (for table-per-hierarchy models), and an accessor table
/// covering every mapped property path.
pub trait Entity: fmt::Debug + Send + Sync + 'static {
    /// Name used to match this type against the mapping source.
    fn type_name() -> &'static str
    where
        Self: Sized;

    fn key() -> TypeKey
    where
        Self: Sized,
    {
        TypeKey::of::<Self>(Self::type_name())
    }

    /// Base types this entity derives from, nearest first. Empty for types
    /// outside an inheritance chain.
    fn base_types() -> Vec<TypeKey>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Accessor table for every mapped property path of this type,
    /// including properties declared by base types.
    fn accessors() -> &'static [FieldAccessor]
    where
        Self: Sized;

    fn as_any(&self) -> &dyn Any;
}

/// Looks up the accessor for a dot-separated property path.
pub fn accessor_for<E: Entity>(path: &str) -> Option<FieldAccessor> {
    E::accessors().iter().find(|a| a.path == path).copied()
}
