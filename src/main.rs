// ==============================================================================
// CLI for the Proto Schema Compiler
// ==============================================================================
//
//   protoschema [OPTIONS] <CATALOG> [OUTPUT]
//
// Loads a JSON type catalog (a file or a directory of them), compiles every
// type reachable from the root set, and writes the `.proto` document to
// OUTPUT or stdout. Warnings go to stderr as miette reports.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use miette::{Context, IntoDiagnostic};

use protoschema::{ProtoError, SchemaCompiler, SchemaConfig, load_catalog, resolve_roots};

const USAGE: &str = "\
Usage: protoschema [OPTIONS] <CATALOG> [OUTPUT]

Compile a JSON type catalog into a proto3 schema.

Arguments:
  <CATALOG>  JSON catalog file, or a directory of `.json` catalogs
  [OUTPUT]   Output `.proto` file (writes to stdout if omitted or `-`)

Options:
      --root <NAME>          Root type to compile; may be repeated (overrides the catalog's roots)
      --java-package <PKG>   Value of the `java_package` option (overrides the catalog's package)
      --prefix <PREFIX>      Prefix of generated message and enum names [default: Grpc]
  -h, --help                 Print help
  -V, --version              Print version";

// ==============================================================================
// Argument Parsing
// ==============================================================================

#[derive(Debug)]
struct Cli {
    catalog: PathBuf,
    output: Option<String>,
    roots: Vec<String>,
    java_package: Option<String>,
    prefix: Option<String>,
}

enum Action {
    Run(Cli),
    Help,
    Version,
}

fn parse_args() -> Result<Action, lexopt::Error> {
    use lexopt::prelude::*;

    let mut catalog: Option<PathBuf> = None;
    let mut output: Option<String> = None;
    let mut roots = Vec::new();
    let mut java_package = None;
    let mut prefix = None;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Long("root") => roots.push(parser.value()?.string()?),
            Long("java-package") => java_package = Some(parser.value()?.string()?),
            Long("prefix") => prefix = Some(parser.value()?.string()?),
            Short('h') | Long("help") => return Ok(Action::Help),
            Short('V') | Long("version") => return Ok(Action::Version),
            Value(value) if catalog.is_none() => catalog = Some(PathBuf::from(value)),
            Value(value) if output.is_none() => output = Some(value.string()?),
            _ => return Err(arg.unexpected()),
        }
    }

    let catalog = catalog.ok_or("missing required argument <CATALOG>")?;
    Ok(Action::Run(Cli {
        catalog,
        output,
        roots,
        java_package,
        prefix,
    }))
}

// ==============================================================================
// Entry Point
// ==============================================================================

fn main() -> miette::Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().build())
    }))?;

    let action = parse_args()
        .into_diagnostic()
        .wrap_err("invalid arguments (see `protoschema --help`)")?;
    match action {
        Action::Help => {
            println!("{USAGE}");
            Ok(())
        }
        Action::Version => {
            println!("protoschema {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Action::Run(cli) => run(cli),
    }
}

fn run(cli: Cli) -> miette::Result<()> {
    let loaded = load_catalog(&cli.catalog)?;

    // Roots given on the command line replace the catalog's own list.
    let root_names = if cli.roots.is_empty() {
        loaded.roots
    } else {
        cli.roots
    };
    let roots = resolve_roots(&loaded.catalog, &root_names)?;

    let mut config = SchemaConfig::from_catalog(&loaded.catalog);
    if let Some(package) = cli.java_package.or(loaded.package) {
        config.java_package(package);
    }
    if let Some(prefix) = cli.prefix {
        config.name_prefix(prefix);
    }

    let compiler = SchemaCompiler::with_roots(&loaded.catalog, config, roots)?;
    for warning in compiler.warnings() {
        eprintln!("{:?}", miette::Report::new(warning.clone()));
    }

    write_output(cli.output.as_deref(), compiler.text())
}

/// Write output to a file or stdout. Parent directories of a file output are
/// created first.
fn write_output(output: Option<&str>, content: &str) -> miette::Result<()> {
    match output {
        None | Some("-") => {
            // A reader that closes early (`protoschema shop.json | head`) is
            // not an error.
            if let Err(e) = io::stdout().write_all(content.as_bytes()) {
                if e.kind() == io::ErrorKind::BrokenPipe {
                    return Ok(());
                }
                return Err(ProtoError::Io {
                    path: None,
                    source: e,
                })
                .map_err(miette::Report::new)
                .wrap_err("write to stdout");
            }
            Ok(())
        }
        Some(path) => {
            let path = Path::new(path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .map_err(|e| ProtoError::Io {
                        path: Some(parent.to_path_buf()),
                        source: e,
                    })
                    .map_err(miette::Report::new)
                    .wrap_err("create output directory")?;
            }
            fs::write(path, content)
                .map_err(|e| ProtoError::Io {
                    path: Some(path.to_path_buf()),
                    source: e,
                })
                .map_err(miette::Report::new)
                .wrap_err("write output")
        }
    }
}
