// ==============================================================================
// JSON Type Catalogs
// ==============================================================================
//
// Catalog files describe a type model as JSON:
//
//   {
//     "package": "com.acme.proto",
//     "roots": ["shop.Order"],
//     "types": [
//       {"name": "shop.Order", "kind": "class", "extends": "shop.Base",
//        "fields": [{"name": "lines", "type": "list", "args": ["shop.Line"]}],
//        "nested": ["shop.Order.Status"]},
//       {"name": "shop.Order.Status", "kind": "enum", "constants": ["OPEN"]}
//     ]
//   }
//
// Loading happens in two passes over every input file: first every type is
// declared, then fields, parents and nested types are attached. This lets any
// type refer to any other, across files and regardless of order.
//
// Errors carry the offending file as a miette source. `serde_json::Value` has
// no position information, so semantic errors point at the first quoted
// occurrence of the offending name.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use miette::{NamedSource, Result, SourceSpan};
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{CatalogDiagnostic, quote_list};
use crate::model::catalog::TypeCatalog;
use crate::model::proto::ScalarType;
use crate::model::types::{GenericArg, TypeHandle, TypeKind};
use crate::suggest::similar_names;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid"));

/// A catalog assembled from one or more JSON files.
#[derive(Debug)]
pub struct LoadedCatalog {
    pub catalog: TypeCatalog,
    /// Root type names, in file order then listing order.
    pub roots: Vec<String>,
    /// First `package` found, if any.
    pub package: Option<String>,
}

/// Parse JSON with C-style comment stripping (`//` and `/* */`), so catalogs
/// can be annotated by hand.
fn parse_json_with_comments(input: &str) -> std::result::Result<Value, serde_json::Error> {
    serde_json::from_reader(
        json_comments::CommentSettings::c_style().strip_comments(input.as_bytes()),
    )
}

/// Load a catalog file, or every `*.json` file below a directory (walked in
/// file-name order).
pub fn load_catalog(path: impl AsRef<Path>) -> Result<LoadedCatalog> {
    let path = path.as_ref();
    let paths = if path.is_dir() {
        let mut json_paths: Vec<PathBuf> = Vec::new();
        for entry in walkdir::WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let entry_path = entry.path();
            if entry.file_type().is_file()
                && entry_path.extension().and_then(|e| e.to_str()) == Some("json")
            {
                json_paths.push(entry_path.to_path_buf());
            }
        }
        if json_paths.is_empty() {
            return Err(miette::miette!(
                "no `.json` catalog files found under {}",
                path.display()
            ));
        }
        json_paths
    } else {
        vec![path.to_path_buf()]
    };

    let mut sources = Vec::with_capacity(paths.len());
    for p in paths {
        let text = fs::read_to_string(&p)
            .map_err(|e| miette::miette!("read catalog `{}`: {e}", p.display()))?;
        sources.push((p.display().to_string(), text));
    }
    parse_catalogs(sources)
}

/// Parse a single catalog held in memory. `name` labels diagnostics.
pub fn parse_catalog_str(source: &str, name: &str) -> Result<LoadedCatalog> {
    parse_catalogs(vec![(name.to_string(), source.to_string())])
}

/// Parse and merge several `(name, source)` catalogs.
pub fn parse_catalogs(sources: Vec<(String, String)>) -> Result<LoadedCatalog> {
    let mut files = Vec::with_capacity(sources.len());
    for (name, text) in sources {
        let json = match parse_json_with_comments(&text) {
            Ok(json) => json,
            Err(e) => {
                let offset = offset_of(&text, e.line(), e.column());
                return Err(CatalogDiagnostic {
                    span: (offset, 0).into(),
                    src: NamedSource::new(name, text),
                    message: format!("invalid JSON: {e}"),
                    label: Some("here".to_string()),
                    help: None,
                }
                .into());
            }
        };
        files.push(CatalogSource { name, text, json });
    }

    let mut loaded = LoadedCatalog {
        catalog: TypeCatalog::new(),
        roots: Vec::new(),
        package: None,
    };

    // Pass 1: shape of the document, roots, package, and every type name.
    let mut declared: Vec<(usize, &Map<String, Value>, TypeHandle)> = Vec::new();
    for (index, file) in files.iter().enumerate() {
        let top = file
            .json
            .as_object()
            .ok_or_else(|| file.error_at_start("catalog must be a JSON object"))?;

        if let Some(package) = top.get("package") {
            let package = package
                .as_str()
                .ok_or_else(|| file.error("package", "`package` must be a string", None))?;
            loaded.package.get_or_insert_with(|| package.to_string());
        }

        if let Some(roots) = top.get("roots") {
            for root in file.array(roots, "roots")? {
                let root = root
                    .as_str()
                    .ok_or_else(|| file.error("roots", "root entries must be type names", None))?;
                loaded.roots.push(root.to_string());
            }
        }

        if let Some(types) = top.get("types") {
            for def in file.array(types, "types")? {
                let def = def
                    .as_object()
                    .ok_or_else(|| file.error("types", "type entries must be objects", None))?;
                let handle = file.declare(&mut loaded.catalog, def)?;
                declared.push((index, def, handle));
            }
        }
    }

    // Pass 2: parents, fields and nested types, now that every name exists.
    for (index, def, handle) in declared {
        files[index].define(&mut loaded.catalog, def, handle)?;
    }

    Ok(loaded)
}

/// Convert serde_json's 1-based line/column into a byte offset.
fn offset_of(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len())
}

struct CatalogSource {
    name: String,
    text: String,
    json: Value,
}

impl CatalogSource {
    /// Span of the first `"needle"` in the source, or an empty span at the
    /// start when it can't be found.
    fn span_of(&self, needle: &str) -> SourceSpan {
        let quoted = format!("\"{needle}\"");
        match self.text.find(&quoted) {
            Some(offset) => (offset, quoted.len()).into(),
            None => (0, 0).into(),
        }
    }

    fn error(&self, needle: &str, message: impl Into<String>, help: Option<String>) -> miette::Report {
        CatalogDiagnostic {
            src: NamedSource::new(self.name.clone(), self.text.clone()),
            span: self.span_of(needle),
            message: message.into(),
            label: None,
            help,
        }
        .into()
    }

    fn error_at_start(&self, message: &str) -> miette::Report {
        CatalogDiagnostic {
            src: NamedSource::new(self.name.clone(), self.text.clone()),
            span: (0, 0).into(),
            message: message.to_string(),
            label: None,
            help: None,
        }
        .into()
    }

    fn array<'v>(&self, value: &'v Value, key: &str) -> Result<&'v Vec<Value>> {
        value
            .as_array()
            .ok_or_else(|| self.error(key, format!("`{key}` must be an array"), None))
    }

    fn string<'v>(&self, obj: &'v Map<String, Value>, key: &str, owner: &str) -> Result<&'v str> {
        obj.get(key).and_then(Value::as_str).ok_or_else(|| {
            self.error(
                owner,
                format!("`{owner}` needs a string `{key}`"),
                None,
            )
        })
    }

    fn flag(&self, obj: &Map<String, Value>, key: &str, owner: &str) -> Result<bool> {
        match obj.get(key) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(self.error(owner, format!("`{key}` of `{owner}` must be a boolean"), None)),
        }
    }

    fn check_identifier(&self, ident: &str, what: &str) -> Result<()> {
        if IDENTIFIER.is_match(ident) {
            Ok(())
        } else {
            Err(self.error(
                ident,
                format!("invalid {what} `{ident}`"),
                Some(
                    "identifiers must start with a letter or underscore, \
                     followed by letters, digits, or underscores"
                        .to_string(),
                ),
            ))
        }
    }

    // ==========================================================================
    // Pass 1: declarations
    // ==========================================================================

    fn declare(&self, catalog: &mut TypeCatalog, def: &Map<String, Value>) -> Result<TypeHandle> {
        let name = def
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| self.error("types", "type entry needs a string `name`", None))?;
        let kind = self.string(def, "kind", name)?;
        let simple = crate::model::catalog::simple_name_of(name);
        self.check_identifier(simple, "type name")?;

        let declared = match kind {
            "class" => {
                let is_abstract = self.flag(def, "abstract", name)?;
                catalog.declare(name, TypeKind::Class { is_abstract })
            }
            "interface" => catalog.declare(name, TypeKind::Interface),
            "collection" => catalog.declare(name, TypeKind::Collection),
            "map" => catalog.declare(name, TypeKind::Map),
            "opaque" => catalog.declare_opaque(name),
            "enum" => {
                let mut constants = Vec::new();
                if let Some(list) = def.get("constants") {
                    for constant in self.array(list, "constants")? {
                        let constant = constant.as_str().ok_or_else(|| {
                            self.error(name, format!("constants of `{name}` must be strings"), None)
                        })?;
                        self.check_identifier(constant, "enum constant")?;
                        constants.push(constant.to_string());
                    }
                }
                catalog.declare_enum(name, constants)
            }
            "scalar" => {
                let keyword = self.string(def, "proto", name)?;
                let scalar = ScalarType::from_keyword(keyword).ok_or_else(|| {
                    self.error(
                        keyword,
                        format!("unknown proto scalar `{keyword}`"),
                        Some(
                            "expected one of double, float, sint32, sint64, bool, string, bytes"
                                .to_string(),
                        ),
                    )
                })?;
                catalog.declare_scalar(name, scalar)
            }
            other => {
                return Err(self.error(
                    other,
                    format!("unknown kind `{other}` for type `{name}`"),
                    Some(
                        "expected one of class, interface, enum, collection, map, scalar, opaque"
                            .to_string(),
                    ),
                ));
            }
        };
        declared.map_err(|msg| self.error(name, msg, None))
    }

    // ==========================================================================
    // Pass 2: definitions
    // ==========================================================================

    fn define(
        &self,
        catalog: &mut TypeCatalog,
        def: &Map<String, Value>,
        handle: TypeHandle,
    ) -> Result<()> {
        let owner = catalog.get(handle).name.clone();

        if let Some(parent) = def.get("extends") {
            let parent = parent
                .as_str()
                .ok_or_else(|| self.error(&owner, format!("`extends` of `{owner}` must be a string"), None))?;
            let parent = self.resolve_type(catalog, parent)?;
            catalog.set_superclass(handle, parent);
        }

        if let Some(fields) = def.get("fields") {
            for field in self.array(fields, "fields")? {
                let field = field.as_object().ok_or_else(|| {
                    self.error(&owner, format!("fields of `{owner}` must be objects"), None)
                })?;
                self.define_field(catalog, handle, &owner, field)?;
            }
        }

        if let Some(nested) = def.get("nested") {
            for entry in self.array(nested, "nested")? {
                let (name, is_private) = match entry {
                    Value::String(name) => (name.as_str(), false),
                    Value::Object(obj) => (
                        self.string(obj, "name", &owner)?,
                        self.flag(obj, "private", &owner)?,
                    ),
                    _ => {
                        return Err(self.error(
                            &owner,
                            format!("nested entries of `{owner}` must be names or objects"),
                            None,
                        ));
                    }
                };
                let nested = self.resolve_type(catalog, name)?;
                catalog.add_nested(handle, nested, is_private);
            }
        }

        Ok(())
    }

    fn define_field(
        &self,
        catalog: &mut TypeCatalog,
        owner: TypeHandle,
        owner_name: &str,
        field: &Map<String, Value>,
    ) -> Result<()> {
        let name = self.string(field, "name", owner_name)?;
        self.check_identifier(name, "field name")?;
        let type_name = self.string(field, "type", name)?;
        let declared = self.resolve_type(catalog, type_name)?;

        let mut generic_arguments = Vec::new();
        if let Some(args) = field.get("args") {
            for arg in self.array(args, "args")? {
                generic_arguments.push(self.generic_arg(catalog, arg, name)?);
            }
        }
        let is_static = self.flag(field, "static", name)?;
        let is_transient = self.flag(field, "transient", name)?;

        let descriptor = catalog.add_field(owner, name, declared);
        descriptor.generic_arguments = generic_arguments;
        descriptor.is_static = is_static;
        descriptor.is_transient = is_transient;
        Ok(())
    }

    fn generic_arg(&self, catalog: &mut TypeCatalog, arg: &Value, field: &str) -> Result<GenericArg> {
        match arg {
            Value::String(s) if s == "?" || s.starts_with("? ") => Ok(GenericArg::Wildcard),
            Value::String(s) => Ok(GenericArg::Type(self.resolve_type(catalog, s)?)),
            Value::Object(obj) => {
                let var = self.string(obj, "variable", field)?;
                Ok(GenericArg::Variable(var.to_string()))
            }
            _ => Err(self.error(
                field,
                format!("type arguments of `{field}` must be type names, `?`, or {{\"variable\": ...}}"),
                None,
            )),
        }
    }

    /// Resolve a type string. Each trailing `[]` adds one array dimension.
    fn resolve_type(&self, catalog: &mut TypeCatalog, type_name: &str) -> Result<TypeHandle> {
        let base = type_name.trim_end_matches("[]");
        let dimensions = (type_name.len() - base.len()) / 2;
        let mut handle = match catalog.handle(base) {
            Some(handle) => handle,
            None => {
                let suggestions = similar_names(base, catalog.names());
                let help = if suggestions.is_empty() {
                    format!("declare `{base}` under `types`")
                } else {
                    format!("did you mean {}?", quote_list(&suggestions))
                };
                return Err(CatalogDiagnostic {
                    src: NamedSource::new(self.name.clone(), self.text.clone()),
                    span: self.span_of(type_name),
                    message: format!("unknown type `{base}`"),
                    label: Some("not declared in any catalog".to_string()),
                    help: Some(help),
                }
                .into());
            }
        };
        for _ in 0..dimensions {
            handle = catalog.array_of(handle);
        }
        Ok(handle)
    }
}
