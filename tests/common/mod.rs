// ==============================================================================
// Shared Test Helpers
// ==============================================================================
//
// Common utility functions used across multiple integration test files.
//
// Each test file that imports this module compiles its own copy, so not every
// function is used in every binary. Suppress the resulting dead_code warnings.
#![allow(dead_code)]
// Import this module in each test file with:
//
//     mod common;
//     use common::{block_names, compile_fixture, render_diagnostic};

use std::fs;
use std::path::{Path, PathBuf};

use miette::{GraphicalReportHandler, GraphicalTheme};
use protoschema::{
    LoadedCatalog, SchemaCompiler, SchemaConfig, SchemaOutput, load_catalog, resolve_roots,
};

pub const FIXTURE_DIR: &str = "tests/fixtures";

pub fn fixture(name: &str) -> PathBuf {
    Path::new(FIXTURE_DIR).join(name)
}

/// Read a golden `.proto` file. Line endings are normalized so that a
/// checkout with `\r\n` still compares equal.
pub fn golden(name: &str) -> String {
    let path = fixture(name);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read golden file {}: {e}", path.display()))
        .replace("\r\n", "\n")
}

/// Load a fixture catalog, panicking with the rendered report on failure.
pub fn load_fixture(name: &str) -> LoadedCatalog {
    load_catalog(fixture(name))
        .unwrap_or_else(|e| panic!("failed to load {name}:\n{}", render_diagnostic(&e)))
}

/// Configure a compiler the way the CLI does: roots and package from the
/// catalog, everything else defaulted.
pub fn config_for(loaded: &LoadedCatalog) -> SchemaConfig {
    let mut config = SchemaConfig::from_catalog(&loaded.catalog);
    if let Some(package) = &loaded.package {
        config.java_package(package.as_str());
    }
    config
}

/// Load a fixture and compile it from its own roots.
pub fn compile_fixture(name: &str) -> SchemaOutput {
    let loaded = load_fixture(name);
    let roots = resolve_roots(&loaded.catalog, &loaded.roots).expect("fixture roots resolve");
    SchemaCompiler::with_roots(&loaded.catalog, config_for(&loaded), roots)
        .expect("fixture has roots")
        .into_output()
}

/// Block names in document order, one per line.
pub fn block_names(output: &SchemaOutput) -> String {
    output
        .schema
        .block_names()
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a single diagnostic to a deterministic string.
/// Uses non-unicode theme at 80 columns.
pub fn render_diagnostic(report: &miette::Report) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::none()).with_width(80);
    let mut buf = String::new();
    handler
        .render_report(&mut buf, report.as_ref())
        .expect("render to String is infallible");
    buf
}
