// ==============================================================================
// Library API: The Schema Compiler
// ==============================================================================
//
// `SchemaCompiler` owns one run of the two-phase worklist algorithm:
//
//   1. Discover every enum reachable from the roots and render them all, so
//      that the document lists every enum before any message.
//   2. Drain a FIFO queue seeded with the roots. Each dequeued composite type
//      is rendered as a message, and the types it references are queued
//      unless they are scalars, enums, skipped or already rendered.
//
// The run happens lazily on the first request for output and is cached, so
// repeated requests return the same text without walking the graph again.
// All state (processed set, type table, output) lives inside one run and is
// dropped with the compiler.

use std::cell::OnceCell;
use std::collections::VecDeque;
use std::fmt;

use indexmap::IndexSet;

use crate::builder::SchemaBuilder;
use crate::config::SchemaConfig;
use crate::error::{GeneratorWarning, ProtoError};
use crate::model::catalog::TypeCatalog;
use crate::model::proto::ProtoFile;
use crate::model::text::proto_to_text;
use crate::model::types::{TypeHandle, TypeIntrospectionProvider};
use crate::resolve::{collect_all_enums, references};
use crate::suggest::similar_names;

/// Result of one compilation.
pub struct SchemaOutput {
    /// Structured form of the document.
    pub schema: ProtoFile,
    /// The document as IDL text.
    pub text: String,
    /// Non-fatal diagnostics. Each warning marks a field that was degraded or
    /// a generated name that had to be qualified.
    ///
    /// Convert with `miette::Report::new(warning.clone())` for rich output.
    pub warnings: Vec<GeneratorWarning>,
}

/// Shows the block names and warning count rather than the full text.
impl fmt::Debug for SchemaOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let blocks: Vec<&str> = self.schema.block_names().collect();
        f.debug_struct("SchemaOutput")
            .field("blocks", &blocks)
            .field(
                "warnings",
                &format_args!("[{} warnings]", self.warnings.len()),
            )
            .finish()
    }
}

/// Compiles the types reachable from a root set into one proto3 document.
///
/// # Examples
///
/// ```
/// use protoschema::{SchemaCompiler, SchemaConfig, TypeCatalog};
///
/// let mut catalog = TypeCatalog::new();
/// let int = catalog.handle("int").unwrap();
/// let foo = catalog.declare_class("demo.Foo").unwrap();
/// catalog.add_field(foo, "count", int);
///
/// let config = SchemaConfig::from_catalog(&catalog);
/// let compiler = SchemaCompiler::new(&catalog, config, foo);
/// assert!(compiler.text().contains("optional sint32 count = 1;"));
/// ```
pub struct SchemaCompiler<'p, P: TypeIntrospectionProvider + ?Sized> {
    provider: &'p P,
    config: SchemaConfig,
    roots: IndexSet<TypeHandle>,
    output: OnceCell<SchemaOutput>,
}

impl<'p, P> SchemaCompiler<'p, P>
where
    P: TypeIntrospectionProvider + ?Sized,
{
    /// Compile everything reachable from a single root type.
    pub fn new(provider: &'p P, config: SchemaConfig, root: TypeHandle) -> Self {
        SchemaCompiler {
            provider,
            config,
            roots: IndexSet::from([root]),
            output: OnceCell::new(),
        }
    }

    /// Compile everything reachable from a set of root types. Roots are
    /// processed in iteration order; duplicates are ignored.
    ///
    /// Fails with [`ProtoError::NoRootTypes`] when `roots` is empty, before
    /// any traversal happens.
    pub fn with_roots(
        provider: &'p P,
        config: SchemaConfig,
        roots: impl IntoIterator<Item = TypeHandle>,
    ) -> Result<Self, ProtoError> {
        let roots: IndexSet<TypeHandle> = roots.into_iter().collect();
        if roots.is_empty() {
            return Err(ProtoError::NoRootTypes);
        }
        Ok(SchemaCompiler {
            provider,
            config,
            roots,
            output: OnceCell::new(),
        })
    }

    pub fn roots(&self) -> impl Iterator<Item = TypeHandle> + '_ {
        self.roots.iter().copied()
    }

    /// Run the compilation on first call; later calls return the cached
    /// result.
    pub fn output(&self) -> &SchemaOutput {
        self.output.get_or_init(|| self.compile())
    }

    /// The rendered document.
    pub fn text(&self) -> &str {
        &self.output().text
    }

    pub fn schema(&self) -> &ProtoFile {
        &self.output().schema
    }

    pub fn warnings(&self) -> &[GeneratorWarning] {
        &self.output().warnings
    }

    /// Consume the compiler, compiling first if nothing was requested yet.
    pub fn into_output(mut self) -> SchemaOutput {
        match self.output.take() {
            Some(output) => output,
            None => self.compile(),
        }
    }

    fn compile(&self) -> SchemaOutput {
        let provider = self.provider;
        let config = &self.config;
        let mut builder = SchemaBuilder::new(provider, config);

        for ty in collect_all_enums(provider, config, &self.roots) {
            builder.render_enum(ty);
        }

        let mut queue: VecDeque<TypeHandle> = self.roots.iter().copied().collect();
        while let Some(ty) = queue.pop_front() {
            if builder.is_processed(ty) || provider.is_enum(ty) || config.is_skipped(ty) {
                continue;
            }
            builder.render_message(ty);

            for referenced in references(provider, config, ty) {
                if !builder.is_scalar(referenced)
                    && !provider.is_enum(referenced)
                    && !config.is_skipped(referenced)
                    && !builder.is_processed(referenced)
                {
                    queue.push_back(referenced);
                }
            }
        }

        let (schema, warnings) = builder.finish();
        let text = proto_to_text(&schema);
        SchemaOutput {
            schema,
            text,
            warnings,
        }
    }
}

impl<P> fmt::Display for SchemaCompiler<'_, P>
where
    P: TypeIntrospectionProvider + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Resolve root names against `catalog`. Unknown names fail with
/// [`ProtoError::UnknownRoot`], carrying suggestions for near misses.
pub fn resolve_roots<S: AsRef<str>>(
    catalog: &TypeCatalog,
    names: &[S],
) -> Result<Vec<TypeHandle>, ProtoError> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            catalog.handle(name).ok_or_else(|| ProtoError::UnknownRoot {
                name: name.to_string(),
                suggestions: similar_names(name, catalog.names()),
            })
        })
        .collect()
}
