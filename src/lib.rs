//! Object-model to proto3 schema compiler: walk a type graph from a set of
//! root types and emit one `.proto` document describing every reachable
//! message and enum.
//!
//! The type graph is read through the [`TypeIntrospectionProvider`] trait.
//! [`TypeCatalog`] is the in-crate implementation; it can be built in code or
//! loaded from JSON catalog files with [`load_catalog`].
//!
//! # Compiling from a catalog file
//!
//! ```no_run
//! use protoschema::{SchemaCompiler, SchemaConfig, load_catalog, resolve_roots};
//!
//! let loaded = load_catalog("schemas/shop.json")?;
//! let roots = resolve_roots(&loaded.catalog, &loaded.roots)?;
//! let mut config = SchemaConfig::from_catalog(&loaded.catalog);
//! if let Some(package) = &loaded.package {
//!     config.java_package(package.as_str());
//! }
//!
//! let compiler = SchemaCompiler::with_roots(&loaded.catalog, config, roots)?;
//! std::fs::write("shop.proto", compiler.text())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Building a catalog in code
//!
//! ```
//! use protoschema::{GenericArg, SchemaCompiler, SchemaConfig, TypeCatalog};
//!
//! let mut catalog = TypeCatalog::new();
//! let list = catalog.handle("list").unwrap();
//! let string = catalog.handle("string").unwrap();
//! let tag = catalog.declare_class("blog.Tag").unwrap();
//! let post = catalog.declare_class("blog.Post").unwrap();
//! catalog.add_field(tag, "label", string);
//! catalog.add_field(post, "tags", list).generic_arguments = vec![GenericArg::Type(tag)];
//!
//! let config = SchemaConfig::from_catalog(&catalog);
//! let compiler = SchemaCompiler::new(&catalog, config, post);
//! assert!(compiler.text().contains("repeated GrpcTag tags = 1;"));
//! assert!(compiler.schema().message("GrpcTag").is_some());
//! ```
//!
//! # Error handling
//!
//! Construction errors are [`ProtoError`]s; catalog loading returns
//! [`miette::Result`], whose reports carry source spans into the offending
//! JSON file when printed with `{:?}`. Unsupported field shapes never fail a
//! compilation: the field degrades to `google.protobuf.Any` and a
//! [`GeneratorWarning`] is recorded on the output.

pub(crate) mod builder;
pub(crate) mod compiler;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod import;
pub(crate) mod model;
pub(crate) mod resolve;
pub(crate) mod suggest;

pub use compiler::{SchemaCompiler, SchemaOutput, resolve_roots};
pub use config::{DEFAULT_JAVA_PACKAGE, DEFAULT_NAME_PREFIX, SchemaConfig};
pub use error::{CatalogDiagnostic, GeneratorWarning, ProtoError};
pub use import::{LoadedCatalog, load_catalog, parse_catalog_str, parse_catalogs};
pub use model::catalog::{Builtin, OBJECT_TYPE, TYPE_TYPE, TypeCatalog, TypeDef, simple_name_of};
pub use model::proto::{
    ANY_TYPE, EnumDef, EnumValue, FieldDef, FieldKind, FileHeader, MessageDef, ProtoFile,
    ProtoType, ScalarType,
};
pub use model::text::proto_to_text;
pub use model::types::{
    FieldDescriptor, GenericArg, NestedType, TypeHandle, TypeIntrospectionProvider, TypeKind,
};
