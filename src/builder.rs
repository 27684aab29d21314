// ==============================================================================
// Message and Enum Builder
// ==============================================================================
//
// Turns one type at a time into a schema definition and appends it to the
// `ProtoFile` under construction. Field lines follow a first-match-wins rule
// list:
//
//   1. the declared type resolves through the type table (scalars, dates,
//      already rendered messages and enums) -> `optional <mapped>`
//   2. collection -> `repeated <element>`
//   3. map        -> `map<key, value>`, or `optional Any` when either side is
//                    opaque
//   4. array      -> `repeated <component>`, with a synthesized wrapper
//                    message per extra dimension
//   5. anything else is a composite reached later by the worklist ->
//      `optional <generated name>` (forward references are legal)
//
// Field numbers count emitted lines only; a dropped field never consumes a
// number.

use indexmap::{IndexMap, IndexSet};

use crate::config::SchemaConfig;
use crate::error::GeneratorWarning;
use crate::model::proto::{
    EnumDef, EnumValue, FieldDef, FieldKind, FileHeader, MessageDef, ProtoFile, ProtoType,
};
use crate::model::types::{FieldDescriptor, GenericArg, TypeHandle, TypeIntrospectionProvider, TypeKind};
use crate::resolve::{TypeTable, eligible_fields};

/// Name of the single field of every array wrapper message.
const WRAPPER_ITEMS_FIELD: &str = "items";

pub(crate) struct SchemaBuilder<'a, P: ?Sized> {
    provider: &'a P,
    config: &'a SchemaConfig,
    table: TypeTable<'a>,
    processed: IndexSet<TypeHandle>,
    /// Wrapper message name by the array type it wraps.
    wrappers: IndexMap<TypeHandle, String>,
    file: ProtoFile,
    warnings: Vec<GeneratorWarning>,
}

impl<'a, P> SchemaBuilder<'a, P>
where
    P: TypeIntrospectionProvider + ?Sized,
{
    pub(crate) fn new(provider: &'a P, config: &'a SchemaConfig) -> Self {
        SchemaBuilder {
            provider,
            config,
            table: TypeTable::new(config),
            processed: IndexSet::new(),
            wrappers: IndexMap::new(),
            file: ProtoFile::new(FileHeader {
                java_package: config.java_package.clone(),
            }),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn is_processed(&self, ty: TypeHandle) -> bool {
        self.processed.contains(&ty)
    }

    pub(crate) fn is_scalar(&self, ty: TypeHandle) -> bool {
        self.table.is_scalar(ty)
    }

    pub(crate) fn finish(self) -> (ProtoFile, Vec<GeneratorWarning>) {
        (self.file, self.warnings)
    }

    // ==========================================================================
    // Enums
    // ==========================================================================

    /// Emit an enum block numbering constants from 0 in declaration order.
    /// Does nothing for a type that was already rendered.
    pub(crate) fn render_enum(&mut self, ty: TypeHandle) {
        if !self.processed.insert(ty) {
            return;
        }
        let name = self
            .table
            .generated_name(self.provider, ty, &mut self.warnings);
        self.table.register(ty);

        let values = (0u32..)
            .zip(self.provider.enum_constants(ty))
            .map(|(number, constant)| EnumValue {
                name: constant.clone(),
                number,
            })
            .collect();
        self.file.enums.push(EnumDef { name, values });
    }

    // ==========================================================================
    // Messages
    // ==========================================================================

    /// Emit a message block for `ty` and return its name.
    ///
    /// Returns `None` for types that never get a body: interfaces, abstract
    /// classes, skip-set types, scalars and container types. A type that was
    /// already rendered is not rendered again; its existing name is returned.
    pub(crate) fn render_message(&mut self, ty: TypeHandle) -> Option<String> {
        let provider = self.provider;
        let config = self.config;
        if config.is_skipped(ty)
            || self.table.is_scalar(ty)
            || provider.kind(ty) != (TypeKind::Class { is_abstract: false })
        {
            return None;
        }
        if self.processed.contains(&ty) {
            return Some(self.table.generated_name(provider, ty, &mut self.warnings));
        }

        self.processed.insert(ty);
        let name = self
            .table
            .generated_name(provider, ty, &mut self.warnings);
        self.table.register(ty);

        let mut fields = Vec::new();
        let mut number = 1u32;
        for field in eligible_fields(provider, config, ty) {
            if let Some(kind) = self.field_kind(field) {
                fields.push(FieldDef {
                    name: field.name.clone(),
                    number,
                    kind,
                });
                number += 1;
            }
        }

        self.file.messages.push(MessageDef {
            name: name.clone(),
            fields,
        });
        Some(name)
    }

    /// Shape of one field line, or `None` when the field is dropped.
    fn field_kind(&mut self, field: &FieldDescriptor) -> Option<FieldKind> {
        let declared = field.declared_type;
        if self.config.is_skipped(declared) {
            return None;
        }
        if let Some(mapped) = self.table.lookup(declared) {
            return Some(FieldKind::Singular(mapped));
        }
        let kind = match self.provider.kind(declared) {
            TypeKind::Collection => self.collection_field(field),
            TypeKind::Map => self.map_field(field),
            TypeKind::Array => self.array_field(field),
            TypeKind::Class { .. } | TypeKind::Interface | TypeKind::Enum => {
                let name = self
                    .table
                    .generated_name(self.provider, declared, &mut self.warnings);
                FieldKind::Singular(ProtoType::Named(name))
            }
        };
        Some(kind)
    }

    fn collection_field(&mut self, field: &FieldDescriptor) -> FieldKind {
        let element = match field.generic_arguments.as_slice() {
            [GenericArg::Type(element)] => self.element_type(*element, field),
            [GenericArg::Wildcard] => ProtoType::Any,
            [GenericArg::Variable(var)] => {
                self.warn_degraded(field, format!("unsupported generic type `{var}`"));
                ProtoType::Any
            }
            args => {
                self.warn_degraded(
                    field,
                    format!("unsupported number of generic type arguments: {}", args.len()),
                );
                ProtoType::Any
            }
        };
        FieldKind::Repeated(element)
    }

    fn map_field(&mut self, field: &FieldDescriptor) -> FieldKind {
        let (key, value) = match field.generic_arguments.as_slice() {
            [GenericArg::Type(key), GenericArg::Type(value)] => (*key, *value),
            args => {
                let message = if args.len() == 2 {
                    "map key or value is not a concrete type".to_string()
                } else {
                    format!("unsupported number of map type arguments: {}", args.len())
                };
                self.warn_degraded(field, message);
                return FieldKind::Singular(ProtoType::Any);
            }
        };

        let key = self.element_type(key, field);
        let value = self.element_type(value, field);
        if key.is_any() || value.is_any() {
            // A map cannot carry an opaque side.
            return FieldKind::Singular(ProtoType::Any);
        }
        FieldKind::Map { key, value }
    }

    fn array_field(&mut self, field: &FieldDescriptor) -> FieldKind {
        let Some(component) = self.provider.component_type(field.declared_type) else {
            return FieldKind::Repeated(ProtoType::Any);
        };
        if self.config.is_skipped(component) {
            return FieldKind::Repeated(ProtoType::Any);
        }
        if self.provider.is_array(component) {
            let owner = self.provider.simple_name(field.declaring_type);
            let base = format!("Array_{owner}_{}", field.name);
            let wrapper = self.wrapper_for(base, component);
            return FieldKind::Repeated(ProtoType::Named(wrapper));
        }
        FieldKind::Repeated(self.element_type(component, field))
    }

    /// Type name for an element position: a collection element, a map side,
    /// or an array component.
    fn element_type(&mut self, ty: TypeHandle, field: &FieldDescriptor) -> ProtoType {
        if self.config.is_skipped(ty) {
            return ProtoType::Any;
        }
        if let Some(mapped) = self.table.lookup(ty) {
            return mapped;
        }
        match self.provider.kind(ty) {
            TypeKind::Collection | TypeKind::Map | TypeKind::Array => {
                let nested = self.provider.qualified_name(ty).to_string();
                self.warn_degraded(field, format!("nested container type `{nested}`"));
                ProtoType::Any
            }
            TypeKind::Class { .. } | TypeKind::Interface | TypeKind::Enum => ProtoType::Named(
                self.table
                    .generated_name(self.provider, ty, &mut self.warnings),
            ),
        }
    }

    // ==========================================================================
    // Multi-dimensional array wrappers
    // ==========================================================================

    /// Name of the wrapper message standing for one row of `array_ty`,
    /// synthesizing it (and any deeper wrappers) on first use.
    ///
    /// Wrappers are keyed by array type, so every field with the same shape
    /// shares the first wrapper built for it.
    fn wrapper_for(&mut self, base: String, array_ty: TypeHandle) -> String {
        if let Some(existing) = self.wrappers.get(&array_ty) {
            return existing.clone();
        }
        let name = self.table.claim(base);
        self.wrappers.insert(array_ty, name.clone());

        // Reserve the slot first so outer wrappers precede inner ones.
        let slot = self.file.wrappers.len();
        self.file.wrappers.push(MessageDef {
            name: name.clone(),
            fields: Vec::new(),
        });

        let items = match self.provider.component_type(array_ty) {
            Some(component) if self.config.is_skipped(component) => ProtoType::Any,
            Some(component) if self.provider.is_array(component) => {
                ProtoType::Named(self.wrapper_for(format!("{name}_Row"), component))
            }
            Some(component) => self.leaf_type(component),
            None => ProtoType::Any,
        };
        self.file.wrappers[slot].fields.push(FieldDef {
            name: WRAPPER_ITEMS_FIELD.to_string(),
            number: 1,
            kind: FieldKind::Repeated(items),
        });
        name
    }

    /// Leaf type of a wrapper's `items` field. Containers can't appear here
    /// meaningfully and fall back to `Any`.
    fn leaf_type(&mut self, ty: TypeHandle) -> ProtoType {
        if let Some(mapped) = self.table.lookup(ty) {
            return mapped;
        }
        match self.provider.kind(ty) {
            TypeKind::Collection | TypeKind::Map | TypeKind::Array => ProtoType::Any,
            TypeKind::Class { .. } | TypeKind::Interface | TypeKind::Enum => ProtoType::Named(
                self.table
                    .generated_name(self.provider, ty, &mut self.warnings),
            ),
        }
    }

    fn warn_degraded(&mut self, field: &FieldDescriptor, reason: String) {
        let owner = self.provider.qualified_name(field.declaring_type);
        self.warnings.push(
            GeneratorWarning::new(format!("{reason} on field `{owner}.{}`", field.name))
                .with_help("the field is emitted as `google.protobuf.Any`"),
        );
    }
}
