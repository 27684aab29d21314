// ==============================================================================
// Object-Model Type Descriptors and the Introspection Capability
// ==============================================================================
//
// The schema compiler never looks at concrete Rust types. It walks an abstract
// type graph through the `TypeIntrospectionProvider` trait, which answers the
// handful of questions the traversal needs: what fields does a type declare,
// what is its parent, is it an enum (and with which constants), which types
// are nested inside it, and what is the component of an array type.
//
// `TypeCatalog` (in catalog.rs) is the in-crate implementation. Anything that
// can answer these questions (a compiler plugin, a database of class files)
// can drive the compiler equally well.

/// Opaque identity of a type in the source model.
///
/// Two handles are equal exactly when they denote the same type; structural
/// similarity (same simple name, same fields) never makes two handles equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHandle(pub(crate) u32);

impl TypeHandle {
    /// Wrap a provider-assigned identifier. Providers other than
    /// [`TypeCatalog`](crate::TypeCatalog) mint their handles with this.
    pub fn new(raw: u32) -> Self {
        TypeHandle(raw)
    }

    /// Position of this handle in its provider's arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Shape of a type as far as schema generation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// A concrete or abstract record-like type with fields.
    Class { is_abstract: bool },
    /// A pure interface; never instantiable, never rendered.
    Interface,
    /// An enumeration with ordered constants.
    Enum,
    /// An array; see [`TypeIntrospectionProvider::component_type`].
    Array,
    /// A single-parameter collection (list, set, ...).
    Collection,
    /// A two-parameter key/value map.
    Map,
}

impl TypeKind {
    /// True for interfaces and abstract classes.
    pub fn is_abstract(self) -> bool {
        matches!(
            self,
            TypeKind::Interface | TypeKind::Class { is_abstract: true }
        )
    }
}

/// One actual argument of a parameterized field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericArg {
    /// A concrete type.
    Type(TypeHandle),
    /// `?` or a bounded wildcard.
    Wildcard,
    /// A type parameter that never got bound to a concrete type.
    Variable(String),
}

impl GenericArg {
    pub fn as_type(&self) -> Option<TypeHandle> {
        match self {
            GenericArg::Type(handle) => Some(*handle),
            GenericArg::Wildcard | GenericArg::Variable(_) => None,
        }
    }
}

/// A field as declared on a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub declared_type: TypeHandle,
    /// Actual type arguments of `declared_type` (zero for plain types, one for
    /// collections, two for maps).
    pub generic_arguments: Vec<GenericArg>,
    pub is_static: bool,
    pub is_transient: bool,
    /// The type whose body declares this field. Differs from the type being
    /// rendered for fields inherited from an ancestor.
    pub declaring_type: TypeHandle,
}

impl FieldDescriptor {
    /// Static and transient fields take no part in schema generation.
    pub fn is_eligible(&self) -> bool {
        !self.is_static && !self.is_transient
    }
}

/// A type declared inside another type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestedType {
    pub handle: TypeHandle,
    pub is_private: bool,
}

/// Read-only view over a source type model.
///
/// All methods take a handle previously produced by the same provider.
/// Implementations may panic on foreign handles.
pub trait TypeIntrospectionProvider {
    /// Unqualified name, e.g. `Order` for `shop.Order`.
    fn simple_name(&self, ty: TypeHandle) -> &str;

    /// Fully qualified name, unique within the provider.
    fn qualified_name(&self, ty: TypeHandle) -> &str;

    fn kind(&self, ty: TypeHandle) -> TypeKind;

    /// Fields declared directly on `ty`, in declaration order. Inherited
    /// fields are not included.
    fn declared_fields(&self, ty: TypeHandle) -> &[FieldDescriptor];

    /// Direct parent type, if any.
    fn superclass(&self, ty: TypeHandle) -> Option<TypeHandle>;

    /// Constant names in declaration order. Empty for non-enums.
    fn enum_constants(&self, ty: TypeHandle) -> &[String];

    fn nested_types(&self, ty: TypeHandle) -> &[NestedType];

    /// Element type of an array type. `None` for anything that isn't an array.
    fn component_type(&self, ty: TypeHandle) -> Option<TypeHandle>;

    fn is_enum(&self, ty: TypeHandle) -> bool {
        self.kind(ty) == TypeKind::Enum
    }

    fn is_array(&self, ty: TypeHandle) -> bool {
        self.kind(ty) == TypeKind::Array
    }
}
