use std::fmt;
use std::path::PathBuf;

use miette::{LabeledSpan, NamedSource, Severity, SourceSpan};

/// Errors raised by the schema compiler and its CLI.
#[derive(Debug)]
pub enum ProtoError {
    /// The compiler was constructed without any root type.
    NoRootTypes,
    /// A requested root name does not exist in the catalog.
    UnknownRoot {
        name: String,
        suggestions: Vec<String>,
    },
    Io {
        path: Option<PathBuf>,
        source: std::io::Error,
    },
}

impl fmt::Display for ProtoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtoError::NoRootTypes => write!(f, "no root type provided for processing"),
            ProtoError::UnknownRoot { name, .. } => write!(f, "unknown root type `{name}`"),
            ProtoError::Io {
                path: Some(path),
                source,
            } => write!(f, "{}: {source}", path.display()),
            ProtoError::Io { path: None, source } => write!(f, "{source}"),
        }
    }
}

impl std::error::Error for ProtoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtoError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl miette::Diagnostic for ProtoError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self {
            ProtoError::NoRootTypes => "protoschema::no_roots",
            ProtoError::UnknownRoot { .. } => "protoschema::unknown_root",
            ProtoError::Io { .. } => "protoschema::io",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            ProtoError::NoRootTypes => Some(Box::new(
                "list at least one type under `roots` in the catalog or pass `--root <NAME>`",
            )),
            ProtoError::UnknownRoot { suggestions, .. } if !suggestions.is_empty() => {
                Some(Box::new(format!("did you mean {}?", quote_list(suggestions))))
            }
            _ => None,
        }
    }
}

/// Format `["a", "b"]` as "`a` or `b`".
pub(crate) fn quote_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("`{n}`"))
        .collect::<Vec<_>>()
        .join(" or ")
}

/// An error in a catalog file, with source location for rich diagnostics.
#[derive(Debug)]
pub struct CatalogDiagnostic {
    pub src: NamedSource<String>,
    pub span: SourceSpan,
    pub message: String,
    pub label: Option<String>,
    pub help: Option<String>,
}

impl fmt::Display for CatalogDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CatalogDiagnostic {}

impl miette::Diagnostic for CatalogDiagnostic {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = self.label.clone().unwrap_or_else(|| self.message.clone());
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(label),
            self.span,
        ))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }
}

/// A non-fatal condition met while generating a schema. The affected field is
/// degraded (usually to `google.protobuf.Any`) and generation carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorWarning {
    pub message: String,
    pub help: Option<String>,
}

impl GeneratorWarning {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        GeneratorWarning {
            message: message.into(),
            help: None,
        }
    }

    pub(crate) fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for GeneratorWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for GeneratorWarning {}

impl miette::Diagnostic for GeneratorWarning {
    fn severity(&self) -> Option<Severity> {
        Some(Severity::Warning)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }
}

/// Render a diagnostic without colors at a fixed width, for stable test
/// assertions.
#[cfg(test)]
pub(crate) fn render_diagnostic(diagnostic: &dyn miette::Diagnostic) -> String {
    use miette::{GraphicalReportHandler, GraphicalTheme};

    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::none()).with_width(80);
    let mut buf = String::new();
    handler
        .render_report(&mut buf, diagnostic)
        .expect("render to String is infallible");
    buf
}
