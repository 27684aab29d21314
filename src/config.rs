// ==============================================================================
// Schema Compiler Configuration
// ==============================================================================
//
// The scalar table and the skip set are plain data handed to the compiler at
// construction. Nothing is global: two compilers with different tables can run
// side by side.

use indexmap::{IndexMap, IndexSet};

use crate::model::catalog::{Builtin, TypeCatalog};
use crate::model::proto::ScalarType;
use crate::model::types::TypeHandle;

/// Prefix of every generated message and enum name.
pub const DEFAULT_NAME_PREFIX: &str = "Grpc";

/// Value of the `java_package` file option when none is configured.
pub const DEFAULT_JAVA_PACKAGE: &str = "proto.generated";

/// Immutable inputs of one schema compilation.
///
/// Uses the non-consuming builder style: setters take `&mut self` and return
/// `&mut Self`, so both chained and multi-step configuration read naturally.
#[derive(Debug, Clone)]
pub struct SchemaConfig {
    pub(crate) scalars: IndexMap<TypeHandle, ScalarType>,
    pub(crate) skip: IndexSet<TypeHandle>,
    pub(crate) name_prefix: String,
    pub(crate) java_package: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaConfig {
    /// An empty configuration: no scalars, nothing skipped.
    pub fn new() -> Self {
        SchemaConfig {
            scalars: IndexMap::new(),
            skip: IndexSet::new(),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            java_package: DEFAULT_JAVA_PACKAGE.to_string(),
        }
    }

    /// Seed the scalar table from every scalar type in `catalog` and the skip
    /// set from every opaque type.
    pub fn from_catalog(catalog: &TypeCatalog) -> Self {
        let mut config = Self::new();
        for (handle, def) in catalog.iter() {
            match def.builtin {
                Some(Builtin::Scalar(scalar)) => {
                    config.scalar(handle, scalar);
                }
                Some(Builtin::Opaque) => {
                    config.skip(handle);
                }
                None => {}
            }
        }
        config
    }

    /// Map `ty` straight to an IDL scalar.
    pub fn scalar(&mut self, ty: TypeHandle, scalar: ScalarType) -> &mut Self {
        self.scalars.insert(ty, scalar);
        self
    }

    /// Never traverse `ty`; fields of this type are dropped and element
    /// positions become `google.protobuf.Any`.
    pub fn skip(&mut self, ty: TypeHandle) -> &mut Self {
        self.skip.insert(ty);
        self
    }

    pub fn name_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.name_prefix = prefix.into();
        self
    }

    pub fn java_package(&mut self, package: impl Into<String>) -> &mut Self {
        self.java_package = package.into();
        self
    }

    pub fn is_skipped(&self, ty: TypeHandle) -> bool {
        self.skip.contains(&ty)
    }

    pub fn scalar_for(&self, ty: TypeHandle) -> Option<ScalarType> {
        self.scalars.get(&ty).copied()
    }
}
