// ==============================================================================
// Type Table, Reference Resolution and Enum Discovery
// ==============================================================================
//
// Three read-mostly pieces of the traversal live here:
//
// - `TypeTable`: the combined "is this a scalar / is this already named"
//   lookup. Scalars come from the configuration; generated names are
//   allocated on first request and become lookups once their type has been
//   rendered.
// - `references`: the set of composite types a type points at through its
//   fields (unwrapping collections, maps and arrays) and its nested types.
// - `collect_all_enums`: a breadth-first pre-pass that finds every enum
//   reachable from the roots, so enums can be emitted ahead of messages.
//
// All containers are insertion ordered, which makes the discovery order, and
// therefore the output order, a pure function of the input.

use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};

use crate::config::SchemaConfig;
use crate::error::GeneratorWarning;
use crate::model::proto::ProtoType;
use crate::model::types::{
    FieldDescriptor, GenericArg, TypeHandle, TypeIntrospectionProvider, TypeKind,
};

// ==============================================================================
// Type Table
// ==============================================================================

/// Scalar mapping plus generated-name registry for one compilation.
#[derive(Debug)]
pub(crate) struct TypeTable<'c> {
    config: &'c SchemaConfig,
    /// Generated names by type, in allocation order.
    names: IndexMap<TypeHandle, String>,
    /// Every name handed out so far, including array wrapper names.
    taken: IndexSet<String>,
    /// Types whose definition has been rendered; their names resolve through
    /// `lookup` from then on.
    registered: IndexSet<TypeHandle>,
}

impl<'c> TypeTable<'c> {
    pub(crate) fn new(config: &'c SchemaConfig) -> Self {
        TypeTable {
            config,
            names: IndexMap::new(),
            taken: IndexSet::new(),
            registered: IndexSet::new(),
        }
    }

    /// Resolve `ty` if it is a scalar or an already rendered type.
    pub(crate) fn lookup(&self, ty: TypeHandle) -> Option<ProtoType> {
        if let Some(scalar) = self.config.scalar_for(ty) {
            return Some(ProtoType::Scalar(scalar));
        }
        if self.registered.contains(&ty) {
            return self.names.get(&ty).cloned().map(ProtoType::Named);
        }
        None
    }

    pub(crate) fn is_scalar(&self, ty: TypeHandle) -> bool {
        self.config.scalar_for(ty).is_some()
    }

    /// Make `ty`'s generated name resolvable through [`lookup`](Self::lookup).
    pub(crate) fn register(&mut self, ty: TypeHandle) {
        debug_assert!(self.names.contains_key(&ty), "register before naming");
        self.registered.insert(ty);
    }

    /// The generated name of `ty`, allocating it on first request.
    ///
    /// The name is `prefix + simple name`. If a different type already owns
    /// that name, the later type is qualified instead (`prefix + qualified
    /// name` with every character outside `[A-Za-z0-9_]` turned into `_`) and
    /// a warning is recorded.
    pub(crate) fn generated_name<P>(
        &mut self,
        provider: &P,
        ty: TypeHandle,
        warnings: &mut Vec<GeneratorWarning>,
    ) -> String
    where
        P: TypeIntrospectionProvider + ?Sized,
    {
        if let Some(name) = self.names.get(&ty) {
            return name.clone();
        }

        let config = self.config;
        let prefix = &config.name_prefix;
        let preferred = format!("{prefix}{}", provider.simple_name(ty));
        let name = if self.taken.contains(&preferred) {
            let qualified: String = provider
                .qualified_name(ty)
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect();
            let name = self.claim(format!("{prefix}{qualified}"));
            let owner = self
                .names
                .iter()
                .find(|(_, n)| **n == preferred)
                .map(|(other, _)| provider.qualified_name(*other).to_string())
                .unwrap_or_else(|| "an array wrapper".to_string());
            warnings.push(
                GeneratorWarning::new(format!(
                    "generated name `{preferred}` is already used by `{owner}`; \
                     `{}` is emitted as `{name}`",
                    provider.qualified_name(ty)
                ))
                .with_help("rename one of the types to keep the short name"),
            );
            name
        } else {
            self.claim(preferred)
        };
        self.names.insert(ty, name.clone());
        name
    }

    /// Reserve `base`, or `base` followed by the smallest free numeric suffix.
    pub(crate) fn claim(&mut self, base: String) -> String {
        if self.taken.insert(base.clone()) {
            return base;
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{base}{n}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

// ==============================================================================
// Field Walk
// ==============================================================================

/// Fields that take part in schema generation, in output order: the type's
/// own declared fields first, then each ancestor's, nearest first. The walk
/// stops at the first ancestor in the skip set (the universal base type).
/// Static and transient fields are left out.
pub(crate) fn eligible_fields<'p, P>(
    provider: &'p P,
    config: &SchemaConfig,
    ty: TypeHandle,
) -> Vec<&'p FieldDescriptor>
where
    P: TypeIntrospectionProvider + ?Sized,
{
    let mut fields = Vec::new();
    // Guards against malformed inputs with a cyclic parent chain.
    let mut seen = IndexSet::new();
    let mut current = Some(ty);
    while let Some(owner) = current {
        if config.is_skipped(owner) || !seen.insert(owner) {
            break;
        }
        fields.extend(
            provider
                .declared_fields(owner)
                .iter()
                .filter(|f| f.is_eligible()),
        );
        current = provider.superclass(owner);
    }
    fields
}

/// Strip every array layer: `Foo[][]` -> `Foo`.
pub(crate) fn innermost_component<P>(provider: &P, ty: TypeHandle) -> TypeHandle
where
    P: TypeIntrospectionProvider + ?Sized,
{
    let mut current = ty;
    while let Some(component) = provider.component_type(current) {
        current = component;
    }
    current
}

// ==============================================================================
// Reference Resolver
// ==============================================================================

/// Composite types referenced by `ty`.
///
/// - collection fields contribute their single concrete element type;
/// - map fields contribute their concrete key and value types;
/// - array fields contribute their innermost non-array component;
/// - other fields contribute their declared type;
/// - non-private nested types are always included.
///
/// Scalars, skip-set types and container types themselves never appear.
/// Interfaces and abstract classes reference nothing, since they are never
/// rendered. Pure function of its inputs.
pub(crate) fn references<P>(
    provider: &P,
    config: &SchemaConfig,
    ty: TypeHandle,
) -> IndexSet<TypeHandle>
where
    P: TypeIntrospectionProvider + ?Sized,
{
    let mut found = IndexSet::new();
    let kind = provider.kind(ty);
    if config.is_skipped(ty)
        || config.scalar_for(ty).is_some()
        || kind.is_abstract()
        || is_container(kind)
    {
        return found;
    }

    for field in eligible_fields(provider, config, ty) {
        let declared = field.declared_type;
        if config.is_skipped(declared) {
            continue;
        }
        match provider.kind(declared) {
            TypeKind::Collection => {
                if let [GenericArg::Type(element)] = field.generic_arguments.as_slice() {
                    add_reference(provider, config, &mut found, *element);
                }
            }
            TypeKind::Map => {
                if let [key, value] = field.generic_arguments.as_slice() {
                    for arg in [key, value] {
                        if let Some(arg) = arg.as_type() {
                            add_reference(provider, config, &mut found, arg);
                        }
                    }
                }
            }
            _ => add_reference(provider, config, &mut found, declared),
        }
    }

    for nested in provider.nested_types(ty) {
        if !nested.is_private {
            add_reference(provider, config, &mut found, nested.handle);
        }
    }

    found
}

fn add_reference<P>(
    provider: &P,
    config: &SchemaConfig,
    found: &mut IndexSet<TypeHandle>,
    ty: TypeHandle,
) where
    P: TypeIntrospectionProvider + ?Sized,
{
    let leaf = innermost_component(provider, ty);
    if config.is_skipped(leaf) || config.scalar_for(leaf).is_some() {
        return;
    }
    if is_container(provider.kind(leaf)) {
        return;
    }
    found.insert(leaf);
}

fn is_container(kind: TypeKind) -> bool {
    matches!(
        kind,
        TypeKind::Array | TypeKind::Collection | TypeKind::Map
    )
}

// ==============================================================================
// Enum Collector
// ==============================================================================

/// Every enum reachable from `roots`, in discovery order.
///
/// Breadth-first over [`references`]. A dequeued type contributes itself if it
/// is an enum, plus the enum types of its fields and the enum element types of
/// its collection fields.
pub(crate) fn collect_all_enums<P>(
    provider: &P,
    config: &SchemaConfig,
    roots: &IndexSet<TypeHandle>,
) -> IndexSet<TypeHandle>
where
    P: TypeIntrospectionProvider + ?Sized,
{
    let mut enums = IndexSet::new();
    let mut visited = IndexSet::new();
    let mut queue: VecDeque<TypeHandle> = roots.iter().copied().collect();

    while let Some(ty) = queue.pop_front() {
        if config.is_skipped(ty) || !visited.insert(ty) {
            continue;
        }
        if provider.is_enum(ty) {
            enums.insert(ty);
        }

        for field in eligible_fields(provider, config, ty) {
            let declared = field.declared_type;
            if provider.is_enum(declared) {
                enums.insert(declared);
            }
            if provider.kind(declared) == TypeKind::Collection
                && let Some(element) = field.generic_arguments.first().and_then(GenericArg::as_type)
                && provider.is_enum(element)
            {
                enums.insert(element);
            }
        }

        for referenced in references(provider, config, ty) {
            if !visited.contains(&referenced) {
                queue.push_back(referenced);
            }
        }
    }

    enums
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::{OBJECT_TYPE, TypeCatalog};
    use crate::model::proto::ScalarType;
    use pretty_assertions::assert_eq;

    struct Fixture {
        catalog: TypeCatalog,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                catalog: TypeCatalog::new(),
            }
        }

        fn builtin(&self, name: &str) -> TypeHandle {
            self.catalog.handle(name).expect("builtin type")
        }

        fn class(&mut self, name: &str) -> TypeHandle {
            self.catalog.declare_class(name).expect("declare class")
        }

        fn config(&self) -> SchemaConfig {
            SchemaConfig::from_catalog(&self.catalog)
        }

        fn names(&self, set: &IndexSet<TypeHandle>) -> Vec<&str> {
            set.iter()
                .map(|h| self.catalog.qualified_name(*h))
                .collect()
        }
    }

    // =========================================================================
    // Field walk
    // =========================================================================

    #[test]
    fn own_fields_come_before_inherited_ones() {
        let mut fx = Fixture::new();
        let int = fx.builtin("int");
        let base = fx.class("shop.Base");
        let order = fx.class("shop.Order");
        fx.catalog.set_superclass(order, base);
        fx.catalog.add_field(base, "id", int);
        fx.catalog.add_field(order, "count", int);
        fx.catalog.add_field(order, "VERSION", int).is_static = true;
        fx.catalog.add_field(order, "scratch", int).is_transient = true;

        let config = fx.config();
        let names: Vec<&str> = eligible_fields(&fx.catalog, &config, order)
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["count", "id"]);
    }

    #[test]
    fn walk_stops_at_the_universal_base() {
        let mut fx = Fixture::new();
        let object = fx.builtin(OBJECT_TYPE);
        let int = fx.builtin("int");
        let order = fx.class("shop.Order");
        fx.catalog.set_superclass(order, object);
        fx.catalog.add_field(object, "hash", int);
        fx.catalog.add_field(order, "count", int);

        let config = fx.config();
        let fields = eligible_fields(&fx.catalog, &config, order);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "count");
    }

    // =========================================================================
    // Reference resolver
    // =========================================================================

    #[test]
    fn references_unwrap_containers() {
        let mut fx = Fixture::new();
        let string = fx.builtin("string");
        let list = fx.builtin("list");
        let map = fx.builtin("map");
        let order = fx.class("shop.Order");
        let line = fx.class("shop.Line");
        let customer = fx.class("shop.Customer");
        let region = fx.class("shop.Region");
        let cell = fx.class("shop.Cell");
        let status = fx
            .catalog
            .declare_enum("shop.Status", ["OPEN"])
            .expect("declare enum");
        let row = fx.catalog.array_of(cell);
        let grid = fx.catalog.array_of(row);

        fx.catalog.add_field(order, "note", string);
        fx.catalog.add_field(order, "lines", list).generic_arguments =
            vec![GenericArg::Type(line)];
        fx.catalog.add_field(order, "byRegion", map).generic_arguments =
            vec![GenericArg::Type(region), GenericArg::Type(customer)];
        fx.catalog.add_field(order, "grid", grid);
        fx.catalog.add_field(order, "status", status);

        let config = fx.config();
        let refs = references(&fx.catalog, &config, order);
        assert_eq!(
            fx.names(&refs),
            vec![
                "shop.Line",
                "shop.Region",
                "shop.Customer",
                "shop.Cell",
                "shop.Status"
            ]
        );
    }

    #[test]
    fn references_skip_opaque_and_unresolved_arguments() {
        let mut fx = Fixture::new();
        let object = fx.builtin(OBJECT_TYPE);
        let list = fx.builtin("list");
        let map = fx.builtin("map");
        let order = fx.class("shop.Order");

        fx.catalog.add_field(order, "payload", object);
        fx.catalog.add_field(order, "anything", list).generic_arguments =
            vec![GenericArg::Wildcard];
        fx.catalog.add_field(order, "generic", list).generic_arguments =
            vec![GenericArg::Variable("T".to_string())];
        fx.catalog.add_field(order, "raw", list);
        fx.catalog.add_field(order, "objects", list).generic_arguments =
            vec![GenericArg::Type(object)];
        fx.catalog.add_field(order, "bag", map).generic_arguments =
            vec![GenericArg::Type(object), GenericArg::Type(object)];

        let config = fx.config();
        assert!(references(&fx.catalog, &config, order).is_empty());
    }

    #[test]
    fn references_include_public_nested_types_only() {
        let mut fx = Fixture::new();
        let order = fx.class("shop.Order");
        let public = fx.class("shop.Order.Receipt");
        let private = fx.class("shop.Order.Scratch");
        fx.catalog.add_nested(order, public, false);
        fx.catalog.add_nested(order, private, true);

        let config = fx.config();
        let refs = references(&fx.catalog, &config, order);
        assert_eq!(fx.names(&refs), vec!["shop.Order.Receipt"]);
    }

    #[test]
    fn abstract_types_reference_nothing() {
        let mut fx = Fixture::new();
        let shape = fx.class("geo.Shape");
        let point = fx.class("geo.Point");
        fx.catalog.set_abstract(shape);
        fx.catalog.add_field(shape, "origin", point);

        let config = fx.config();
        assert!(references(&fx.catalog, &config, shape).is_empty());
    }

    #[test]
    fn references_are_idempotent() {
        let mut fx = Fixture::new();
        let node = fx.class("graph.Node");
        fx.catalog.add_field(node, "next", node);

        let config = fx.config();
        let first = references(&fx.catalog, &config, node);
        let second = references(&fx.catalog, &config, node);
        assert_eq!(first, second);
        assert_eq!(fx.names(&first), vec!["graph.Node"]);
    }

    // =========================================================================
    // Enum collector
    // =========================================================================

    #[test]
    fn enums_are_found_transitively() {
        let mut fx = Fixture::new();
        let list = fx.builtin("list");
        let map = fx.builtin("map");
        let string = fx.builtin("string");
        let order = fx.class("shop.Order");
        let line = fx.class("shop.Line");
        let status = fx
            .catalog
            .declare_enum("shop.Status", ["OPEN", "CLOSED"])
            .expect("declare");
        let unit = fx
            .catalog
            .declare_enum("shop.Unit", ["KG", "PIECE"])
            .expect("declare");
        let tag = fx
            .catalog
            .declare_enum("shop.Tag", ["NEW"])
            .expect("declare");
        let flag = fx
            .catalog
            .declare_enum("shop.Order.Flag", ["RUSH"])
            .expect("declare");

        fx.catalog.add_field(order, "status", status);
        fx.catalog.add_field(order, "lines", list).generic_arguments =
            vec![GenericArg::Type(line)];
        fx.catalog.add_field(line, "units", list).generic_arguments =
            vec![GenericArg::Type(unit)];
        fx.catalog.add_field(line, "tags", map).generic_arguments =
            vec![GenericArg::Type(string), GenericArg::Type(tag)];
        fx.catalog.add_nested(order, flag, false);

        let config = fx.config();
        let roots = IndexSet::from([order]);
        let enums = collect_all_enums(&fx.catalog, &config, &roots);
        assert_eq!(
            fx.names(&enums),
            vec!["shop.Status", "shop.Unit", "shop.Order.Flag", "shop.Tag"]
        );
    }

    #[test]
    fn enum_collection_survives_cycles() {
        let mut fx = Fixture::new();
        let a = fx.class("cyc.A");
        let b = fx.class("cyc.B");
        let mood = fx
            .catalog
            .declare_enum("cyc.Mood", ["HAPPY"])
            .expect("declare");
        fx.catalog.add_field(a, "b", b);
        fx.catalog.add_field(b, "a", a);
        fx.catalog.add_field(b, "mood", mood);

        let config = fx.config();
        let enums = collect_all_enums(&fx.catalog, &config, &IndexSet::from([a]));
        assert_eq!(fx.names(&enums), vec!["cyc.Mood"]);
    }

    // =========================================================================
    // Type table
    // =========================================================================

    #[test]
    fn scalars_resolve_before_any_registration() {
        let fx = Fixture::new();
        let config = fx.config();
        let table = TypeTable::new(&config);
        assert_eq!(
            table.lookup(fx.builtin("date")),
            Some(ProtoType::Scalar(ScalarType::Sint64))
        );
        assert!(table.is_scalar(fx.builtin("boolean")));
    }

    #[test]
    fn generated_names_resolve_only_once_registered() {
        let mut fx = Fixture::new();
        let order = fx.class("shop.Order");
        let config = fx.config();
        let mut table = TypeTable::new(&config);
        let mut warnings = Vec::new();

        let name = table.generated_name(&fx.catalog, order, &mut warnings);
        assert_eq!(name, "GrpcOrder");
        assert_eq!(table.lookup(order), None);

        table.register(order);
        assert_eq!(
            table.lookup(order),
            Some(ProtoType::Named("GrpcOrder".to_string()))
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn colliding_simple_names_are_qualified() {
        let mut fx = Fixture::new();
        let first = fx.class("billing.Account");
        let second = fx.class("crm.Account");
        let config = fx.config();
        let mut table = TypeTable::new(&config);
        let mut warnings = Vec::new();

        assert_eq!(
            table.generated_name(&fx.catalog, first, &mut warnings),
            "GrpcAccount"
        );
        assert_eq!(
            table.generated_name(&fx.catalog, second, &mut warnings),
            "Grpccrm_Account"
        );
        // Stable on repeat requests.
        assert_eq!(
            table.generated_name(&fx.catalog, second, &mut warnings),
            "Grpccrm_Account"
        );
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("billing.Account"));
    }

    #[test]
    fn qualified_names_are_valid_identifiers() {
        let mut fx = Fixture::new();
        let first = fx.class("x.Item");
        let second = fx.class("my-lib.Item");
        let third = fx.class("my_lib.Item");
        let config = fx.config();
        let mut table = TypeTable::new(&config);
        let mut warnings = Vec::new();

        assert_eq!(table.generated_name(&fx.catalog, first, &mut warnings), "GrpcItem");
        assert_eq!(
            table.generated_name(&fx.catalog, second, &mut warnings),
            "Grpcmy_lib_Item"
        );
        // Sanitizing can clash again; the numeric suffix takes over.
        assert_eq!(
            table.generated_name(&fx.catalog, third, &mut warnings),
            "Grpcmy_lib_Item2"
        );
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn claim_appends_a_numeric_suffix() {
        let config = SchemaConfig::new();
        let mut table = TypeTable::new(&config);
        assert_eq!(table.claim("Array_A_x".to_string()), "Array_A_x");
        assert_eq!(table.claim("Array_A_x".to_string()), "Array_A_x2");
        assert_eq!(table.claim("Array_A_x".to_string()), "Array_A_x3");
    }
}
