// ==============================================================================
// In-Memory Type Catalog
// ==============================================================================
//
// `TypeCatalog` is an arena of type definitions indexed by qualified name. A
// `TypeHandle` is the definition's position in the arena, so handle equality
// is type identity. Every catalog starts out seeded with the builtin scalar,
// opaque, collection and map types; user types are declared on top.
//
// Declaration and definition are split so that recursive and mutually
// recursive types can be described: declare every type first, then attach
// fields, parents and nested types by handle.
//
// Array types are interned by component: asking twice for `int[]` yields the
// same handle, which is what lets the compiler treat "same array shape" as
// "same type".

use indexmap::IndexMap;

use super::proto::ScalarType;
use super::types::{FieldDescriptor, NestedType, TypeHandle, TypeIntrospectionProvider, TypeKind};

/// How a builtin participates in schema generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// Mapped straight to an IDL scalar.
    Scalar(ScalarType),
    /// Never traversed; rendered as the `Any` placeholder.
    Opaque,
}

/// Name of the universal base type every class implicitly extends.
pub const OBJECT_TYPE: &str = "object";
/// Name of the runtime type-handle type.
pub const TYPE_TYPE: &str = "type";

const BUILTIN_SCALARS: &[(&str, ScalarType)] = &[
    ("boolean", ScalarType::Bool),
    ("byte", ScalarType::Bytes),
    ("short", ScalarType::Sint32),
    ("int", ScalarType::Sint32),
    ("long", ScalarType::Sint64),
    ("float", ScalarType::Float),
    ("double", ScalarType::Double),
    ("char", ScalarType::Sint32),
    ("string", ScalarType::String),
    ("bytes", ScalarType::Bytes),
    // Dates and timestamps travel as epoch milliseconds.
    ("date", ScalarType::Sint64),
    ("timestamp", ScalarType::Sint64),
];

const BUILTIN_COLLECTIONS: &[&str] = &["list", "set", "collection"];
const BUILTIN_MAPS: &[&str] = &["map"];

/// A type definition stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub name: String,
    pub simple_name: String,
    pub kind: TypeKind,
    pub builtin: Option<Builtin>,
    pub superclass: Option<TypeHandle>,
    pub fields: Vec<FieldDescriptor>,
    pub constants: Vec<String>,
    pub nested: Vec<NestedType>,
    pub component: Option<TypeHandle>,
}

impl TypeDef {
    fn new(name: &str, kind: TypeKind) -> Self {
        TypeDef {
            name: name.to_string(),
            simple_name: simple_name_of(name).to_string(),
            kind,
            builtin: None,
            superclass: None,
            fields: Vec::new(),
            constants: Vec::new(),
            nested: Vec::new(),
            component: None,
        }
    }
}

/// Strip the qualifier from a type name: `shop.Order.Status` -> `Status`.
///
/// Both `.` and `$` act as separators so that binary-style nested names
/// (`Outer$Inner`) resolve the same way as source-style ones.
pub fn simple_name_of(name: &str) -> &str {
    match name.rfind(['.', '$']) {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Arena of type definitions; the crate's own [`TypeIntrospectionProvider`].
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    types: IndexMap<String, TypeDef>,
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCatalog {
    /// Create a catalog holding only the builtin types.
    pub fn new() -> Self {
        let mut catalog = TypeCatalog {
            types: IndexMap::new(),
        };
        for &(name, scalar) in BUILTIN_SCALARS {
            let mut def = TypeDef::new(name, TypeKind::Class { is_abstract: false });
            def.builtin = Some(Builtin::Scalar(scalar));
            catalog.types.insert(name.to_string(), def);
        }
        for name in [OBJECT_TYPE, TYPE_TYPE] {
            let mut def = TypeDef::new(name, TypeKind::Class { is_abstract: false });
            def.builtin = Some(Builtin::Opaque);
            catalog.types.insert(name.to_string(), def);
        }
        for &name in BUILTIN_COLLECTIONS {
            let def = TypeDef::new(name, TypeKind::Collection);
            catalog.types.insert(name.to_string(), def);
        }
        for &name in BUILTIN_MAPS {
            let def = TypeDef::new(name, TypeKind::Map);
            catalog.types.insert(name.to_string(), def);
        }
        catalog
    }

    /// Number of definitions, builtins and interned arrays included.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Look up a type by qualified name.
    pub fn handle(&self, name: &str) -> Option<TypeHandle> {
        self.types.get_index_of(name).map(handle_at)
    }

    pub fn get(&self, ty: TypeHandle) -> &TypeDef {
        &self.types[ty.index()]
    }

    fn get_mut(&mut self, ty: TypeHandle) -> &mut TypeDef {
        &mut self.types[ty.index()]
    }

    /// All definitions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeHandle, &TypeDef)> {
        self.types
            .values()
            .enumerate()
            .map(|(i, def)| (handle_at(i), def))
    }

    /// All qualified names, in declaration order. Used to suggest similar
    /// names for typos.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(|k| k.as_str())
    }

    /// Declare a new type of the given kind. Returns an error if the name is
    /// already taken.
    pub fn declare(&mut self, name: &str, kind: TypeKind) -> Result<TypeHandle, String> {
        if name.is_empty() {
            return Err("type name must not be empty".to_string());
        }
        // `[]` suffixes are reserved for interned array types.
        if name.contains(['[', ']']) {
            return Err(format!("type name must not contain `[` or `]`: {name}"));
        }
        if self.types.contains_key(name) {
            return Err(format!("duplicate type name: {name}"));
        }
        let (index, _) = self
            .types
            .insert_full(name.to_string(), TypeDef::new(name, kind));
        Ok(handle_at(index))
    }

    pub fn declare_class(&mut self, name: &str) -> Result<TypeHandle, String> {
        self.declare(name, TypeKind::Class { is_abstract: false })
    }

    /// Declare an enumeration with its constants in declaration order.
    pub fn declare_enum<I, S>(&mut self, name: &str, constants: I) -> Result<TypeHandle, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let handle = self.declare(name, TypeKind::Enum)?;
        self.get_mut(handle).constants = constants.into_iter().map(Into::into).collect();
        Ok(handle)
    }

    /// Declare a user-defined scalar, e.g. a money type carried as `sint64`.
    pub fn declare_scalar(&mut self, name: &str, scalar: ScalarType) -> Result<TypeHandle, String> {
        let handle = self.declare(name, TypeKind::Class { is_abstract: false })?;
        self.get_mut(handle).builtin = Some(Builtin::Scalar(scalar));
        Ok(handle)
    }

    /// Declare a type that must never be traversed into.
    pub fn declare_opaque(&mut self, name: &str) -> Result<TypeHandle, String> {
        let handle = self.declare(name, TypeKind::Class { is_abstract: false })?;
        self.get_mut(handle).builtin = Some(Builtin::Opaque);
        Ok(handle)
    }

    /// Return the array type whose component is `component`, creating it on
    /// first use.
    pub fn array_of(&mut self, component: TypeHandle) -> TypeHandle {
        let component_def = self.get(component);
        let name = format!("{}[]", component_def.name);
        if let Some(existing) = self.handle(&name) {
            return existing;
        }
        let mut def = TypeDef::new(&name, TypeKind::Array);
        def.simple_name = format!("{}[]", component_def.simple_name);
        def.component = Some(component);
        let (index, _) = self.types.insert_full(name, def);
        handle_at(index)
    }

    /// Append a field to `owner`'s declared field list and return it for
    /// further adjustment (generic arguments, modifiers).
    pub fn add_field(
        &mut self,
        owner: TypeHandle,
        name: impl Into<String>,
        declared_type: TypeHandle,
    ) -> &mut FieldDescriptor {
        let fields = &mut self.get_mut(owner).fields;
        fields.push(FieldDescriptor {
            name: name.into(),
            declared_type,
            generic_arguments: Vec::new(),
            is_static: false,
            is_transient: false,
            declaring_type: owner,
        });
        fields.last_mut().expect("field was just pushed")
    }

    pub fn set_superclass(&mut self, ty: TypeHandle, parent: TypeHandle) {
        self.get_mut(ty).superclass = Some(parent);
    }

    pub fn set_abstract(&mut self, ty: TypeHandle) {
        self.get_mut(ty).kind = TypeKind::Class { is_abstract: true };
    }

    pub fn add_nested(&mut self, owner: TypeHandle, nested: TypeHandle, is_private: bool) {
        self.get_mut(owner).nested.push(NestedType {
            handle: nested,
            is_private,
        });
    }
}

fn handle_at(index: usize) -> TypeHandle {
    TypeHandle(u32::try_from(index).expect("type catalog exceeds u32::MAX entries"))
}

impl TypeIntrospectionProvider for TypeCatalog {
    fn simple_name(&self, ty: TypeHandle) -> &str {
        &self.get(ty).simple_name
    }

    fn qualified_name(&self, ty: TypeHandle) -> &str {
        &self.get(ty).name
    }

    fn kind(&self, ty: TypeHandle) -> TypeKind {
        self.get(ty).kind
    }

    fn declared_fields(&self, ty: TypeHandle) -> &[FieldDescriptor] {
        &self.get(ty).fields
    }

    fn superclass(&self, ty: TypeHandle) -> Option<TypeHandle> {
        self.get(ty).superclass
    }

    fn enum_constants(&self, ty: TypeHandle) -> &[String] {
        &self.get(ty).constants
    }

    fn nested_types(&self, ty: TypeHandle) -> &[NestedType] {
        &self.get(ty).nested
    }

    fn component_type(&self, ty: TypeHandle) -> Option<TypeHandle> {
        self.get(ty).component
    }
}
