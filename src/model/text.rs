// ==============================================================================
// IDL Text Serialization
// ==============================================================================
//
// A single stateless pass over a finished `ProtoFile`. Layout rules:
//
// - The fixed header block comes first and ends with a newline.
// - Every enum/message block is preceded by one blank line and closed with
//   `}` on its own line.
// - Block bodies are indented one tab per nesting level.
// - The document ends with one extra newline after the last block.

use std::fmt::Write;

use super::proto::{EnumDef, FieldDef, FieldKind, FileHeader, MessageDef, ProtoFile};

const INDENT: char = '\t';

/// Serialize a schema document to IDL text.
pub fn proto_to_text(file: &ProtoFile) -> String {
    let mut out = String::new();
    write_header(&mut out, &file.header);
    for def in &file.enums {
        write_enum(&mut out, def, 0);
    }
    for def in file.messages.iter().chain(&file.wrappers) {
        write_message(&mut out, def, 0);
    }
    out.push('\n');
    out
}

fn write_header(out: &mut String, header: &FileHeader) {
    out.push_str("syntax = \"proto3\";\n");
    out.push_str("import \"protogen/options.proto\";\n");
    out.push_str("import \"google/protobuf/wrappers.proto\";\n");
    writeln!(out, "option java_package = \"{}\";", header.java_package)
        .expect("write to String is infallible");
    out.push_str("option optimize_for = SPEED;\n");
    out.push_str("option (protogen.enable) = true;\n");
    out.push_str("option java_multiple_files = true;\n");
}

fn push_indent(out: &mut String, depth: usize) {
    out.extend(std::iter::repeat_n(INDENT, depth));
}

fn write_enum(out: &mut String, def: &EnumDef, depth: usize) {
    out.push('\n');
    push_indent(out, depth);
    writeln!(out, "enum {} {{", def.name).expect("write to String is infallible");
    for value in &def.values {
        push_indent(out, depth + 1);
        writeln!(out, "{} = {};", value.name, value.number)
            .expect("write to String is infallible");
    }
    push_indent(out, depth);
    out.push_str("}\n");
}

fn write_message(out: &mut String, def: &MessageDef, depth: usize) {
    out.push('\n');
    push_indent(out, depth);
    writeln!(out, "message {} {{", def.name).expect("write to String is infallible");
    for field in &def.fields {
        push_indent(out, depth + 1);
        write_field(out, field);
    }
    push_indent(out, depth);
    out.push_str("}\n");
}

fn write_field(out: &mut String, field: &FieldDef) {
    let FieldDef { name, number, kind } = field;
    let written = match kind {
        FieldKind::Singular(ty) => writeln!(out, "optional {ty} {name} = {number};"),
        FieldKind::Repeated(ty) => writeln!(out, "repeated {ty} {name} = {number};"),
        FieldKind::Map { key, value } => {
            writeln!(out, "map<{key}, {value}> {name} = {number};")
        }
    };
    written.expect("write to String is infallible");
}
