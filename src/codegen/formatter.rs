//! Emission of `_format`/`_print` renderers, following
//! `SPEC_FULL.md` §4.6: printf-run coalescing for struct fields,
//! annotation-prefix inheritance, and the `nothing`/`just `/
//! `SHALLOW_VARIANT_FORMAT` conventions.
use crate::codegen::pretty::PrettyWriter;
use crate::codegen::Names;
use crate::model::{BasicKind, Field, TypeKind, TypeNode, TypeRef};

/// Emit both `T_format` and `T_print` for a named type.
pub fn emit_formatters(w: &mut PrettyWriter, names: &Names, ty: &TypeNode, deep_default: bool) {
    let type_name = names.type_name(ty);
    let format_fn = names.fn_name(ty, "format");
    let print_fn = names.fn_name(ty, "print");

    w.writeln(format!(
        "static void {}({} v, GString *sink, gboolean annotate_types) {{",
        format_fn, type_name
    ));
    let mut body = w.new_block();
    emit_format_body(&mut body, names, ty, "v", "annotate_types", deep_default);
    w.append_block(body);
    w.writeln("}");
    w.eob();

    w.writeln(format!(
        "static gchar *{}({} v, gboolean annotate_types) {{",
        print_fn, type_name
    ));
    let mut body = w.new_block();
    body.writeln("GString *sink = g_string_new(NULL);");
    body.writeln(format!("{}(v, sink, annotate_types);", format_fn));
    body.writeln("return g_string_free(sink, FALSE);");
    w.append_block(body);
    w.writeln("}");
    w.eob();
}

/// Whether a basic kind is rendered via a single printf conversion
/// specifier, as opposed to needing bespoke logic (`boolean`'s
/// `true`/`false`, `double`'s dtoa, or a string-like kind's escaping
/// routine).
fn is_printf_coalescable(kind: BasicKind) -> bool {
    kind.row().printf_format.is_some()
}

fn emit_format_body(
    body: &mut PrettyWriter,
    names: &Names,
    ty: &TypeNode,
    value_expr: &str,
    annotate_expr: &str,
    deep_default: bool,
) {
    match &ty.kind {
        TypeKind::Basic(kind) => emit_basic_format(body, *kind, value_expr, annotate_expr),
        TypeKind::Variant => emit_variant_format(body, names, ty, value_expr, deep_default),
        TypeKind::Array(element) => {
            emit_array_format(body, names, ty, element, value_expr, annotate_expr)
        }
        TypeKind::Dict(key, value) => {
            emit_dict_format(body, names, ty, *key, value, value_expr, annotate_expr)
        }
        TypeKind::Maybe(inner) => emit_maybe_format(body, names, ty, inner, value_expr, annotate_expr),
        TypeKind::Struct(_) => emit_struct_format(body, names, ty, value_expr, annotate_expr),
    }
}

fn emit_basic_format(body: &mut PrettyWriter, kind: BasicKind, value_expr: &str, annotate_expr: &str) {
    let row = kind.row();
    if !row.annotation_prefix.is_empty() {
        body.writeln(format!(
            "if ({}) g_string_append(sink, \"{}\");",
            annotate_expr, row.annotation_prefix
        ));
    }
    match kind {
        BasicKind::Boolean => {
            body.writeln(format!(
                "g_string_append(sink, {} ? \"true\" : \"false\");",
                value_expr
            ));
        }
        BasicKind::Double => {
            body.writeln(format!(
                "format_double(sink, {}); /* dtoa, guarantees a '.' or 'e' */",
                value_expr
            ));
        }
        _ if kind.is_string_like() => {
            body.writeln(format!("format_escaped_string(sink, {});", value_expr));
        }
        _ => {
            body.writeln(format!(
                "g_string_append_printf(sink, \"{}\", {});",
                row.printf_format.unwrap(),
                value_expr
            ));
        }
    }
}

fn emit_variant_format(
    body: &mut PrettyWriter,
    names: &Names,
    ty: &TypeNode,
    value_expr: &str,
    deep_default: bool,
) {
    body.writeln("#if SHALLOW_VARIANT_FORMAT");
    body.writeln(format!(
        "g_string_append_printf(sink, \"<@%s>\", {}({}));",
        names.fn_name(ty, "get_type_signature"),
        value_expr
    ));
    body.writeln("#else");
    body.writeln(format!(
        "format_variant_deep(sink, {}, annotate_types);",
        value_expr
    ));
    body.writeln("#endif");
    // deep_default only determines the `#define` emitted once per file
    // (see codegen::generate); kept here so both code paths stay visibly
    // reachable regardless of which one compiles in.
    let _ = deep_default;
}

fn emit_array_format(
    body: &mut PrettyWriter,
    names: &Names,
    ty: &TypeNode,
    element: &TypeRef,
    value_expr: &str,
    annotate_expr: &str,
) {
    let len_fn = names.fn_name(ty, "get_length");
    let at_fn = names.fn_name(ty, "get_at");
    body.writeln(format!("size_t len = {}({});", len_fn, value_expr));
    body.writeln(format!("if (len == 0 && {}) {{", annotate_expr));
    let mut empty_body = body.new_block();
    empty_body.writeln(format!(
        "g_string_append_printf(sink, \"@%s []\", {});",
        names.typestring_const(ty)
    ));
    empty_body.writeln("return;");
    body.append_block(empty_body);
    body.writeln("}");
    body.writeln("g_string_append_c(sink, '[');");
    body.writeln("for (size_t i = 0; i < len; i++) {");
    let mut loop_body = body.new_block();
    loop_body.writeln("if (i > 0) g_string_append(sink, \", \");");
    loop_body.writeln(format!(
        "gboolean elem_annotate = (i == 0) ? {} : FALSE;",
        annotate_expr
    ));
    loop_body.writeln(format!(
        "{} elem = {}({}, i);",
        names.c_type(element),
        at_fn,
        value_expr
    ));
    emit_format_body(&mut loop_body, names, element, "elem", "elem_annotate", true);
    body.append_block(loop_body);
    body.writeln("}");
    body.writeln("g_string_append_c(sink, ']');");
}

fn emit_dict_format(
    body: &mut PrettyWriter,
    names: &Names,
    ty: &TypeNode,
    key: BasicKind,
    value: &TypeRef,
    value_expr: &str,
    annotate_expr: &str,
) {
    let len_fn = names.fn_name(ty, "get_length");
    body.writeln(format!("size_t len = {}({});", len_fn, value_expr));
    body.writeln(format!("if (len == 0 && {}) {{", annotate_expr));
    let mut empty_body = body.new_block();
    empty_body.writeln(format!(
        "g_string_append_printf(sink, \"@%s {{}}\", {});",
        names.typestring_const(ty)
    ));
    empty_body.writeln("return;");
    body.append_block(empty_body);
    body.writeln("}");
    body.writeln("g_string_append_c(sink, '{');");
    body.writeln("for (size_t i = 0; i < len; i++) {");
    let mut loop_body = body.new_block();
    loop_body.writeln("if (i > 0) g_string_append(sink, \", \");");
    loop_body.writeln(format!(
        "gboolean entry_annotate = (i == 0) ? {} : FALSE;",
        annotate_expr
    ));
    let entry_key_expr = format!("{}({}, i)", names.fn_name(ty, "entry_key"), value_expr);
    emit_basic_format(&mut loop_body, key, &entry_key_expr, "entry_annotate");
    loop_body.writeln("g_string_append(sink, \": \");");
    let value_c_type = names.c_type(value);
    loop_body.writeln(format!(
        "{} entry_value_view = {}({}, i);",
        value_c_type,
        names.fn_name(ty, "entry_value"),
        value_expr
    ));
    emit_format_body(
        &mut loop_body,
        names,
        value,
        "entry_value_view",
        "entry_annotate",
        true,
    );
    body.append_block(loop_body);
    body.writeln("}");
    body.writeln("g_string_append_c(sink, '}');");
}

fn emit_maybe_format(
    body: &mut PrettyWriter,
    names: &Names,
    ty: &TypeNode,
    inner: &TypeRef,
    value_expr: &str,
    annotate_expr: &str,
) {
    body.writeln(format!(
        "if (!{}({})) {{",
        names.fn_name(ty, "has_value"),
        value_expr
    ));
    let mut empty_body = body.new_block();
    empty_body.writeln("g_string_append(sink, \"nothing\");");
    empty_body.writeln("return;");
    body.append_block(empty_body);
    body.writeln("}");
    if matches!(inner.kind, TypeKind::Maybe(_)) {
        body.writeln("g_string_append(sink, \"just \");");
    }
    body.writeln(format!(
        "{} inner_value = {}({});",
        names.c_type(inner),
        names.fn_name(ty, "get_value"),
        value_expr
    ));
    emit_format_body(body, names, inner, "inner_value", annotate_expr, true);
}

fn emit_struct_format(
    body: &mut PrettyWriter,
    names: &Names,
    ty: &TypeNode,
    value_expr: &str,
    annotate_expr: &str,
) {
    let s = ty.as_struct().expect("emit_struct_format called on a non-struct");
    body.writeln("g_string_append_c(sink, '(');");
    let runs = group_into_runs(&s.fields);
    for (run_index, run) in runs.iter().enumerate() {
        if run_index > 0 {
            body.writeln("g_string_append(sink, \", \");");
        }
        let run_annotate = if run_index == 0 {
            annotate_expr.to_string()
        } else {
            "FALSE".to_string()
        };
        match run {
            Run::Printf(fields) => emit_printf_run(body, names, ty, fields, value_expr, &run_annotate),
            Run::Single(field) => {
                let getter = names.fn_name(ty, &format!("get_{}", field.name));
                let local = format!("{}_v", field.name);
                body.writeln(format!(
                    "{} {} = {}({});",
                    names.c_type(&field.ty),
                    local,
                    getter,
                    value_expr
                ));
                emit_format_body(body, names, &field.ty, &local, &run_annotate, true);
            }
        }
    }
    if s.fields.len() == 1 {
        body.writeln("g_string_append_c(sink, ',');");
    }
    body.writeln("g_string_append_c(sink, ')');");
}

enum Run<'a> {
    /// A maximal run of contiguous fields that are all basic kinds with a
    /// printf conversion, coalesced into one `g_string_append_printf` call
    /// (`SPEC_FULL.md` §4.6: "no two adjacent runs both contain only
    /// printf-able fields").
    Printf(Vec<&'a Field>),
    /// Any other field (bespoke basic kind or a composite), formatted on
    /// its own.
    Single(&'a Field),
}

fn field_is_printf_coalescable(field: &Field) -> bool {
    matches!(&field.ty.kind, TypeKind::Basic(kind) if is_printf_coalescable(*kind))
}

fn group_into_runs(fields: &[Field]) -> Vec<Run<'_>> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < fields.len() {
        if field_is_printf_coalescable(&fields[i]) {
            let mut run = Vec::new();
            while i < fields.len() && field_is_printf_coalescable(&fields[i]) {
                run.push(&fields[i]);
                i += 1;
            }
            runs.push(Run::Printf(run));
        } else {
            runs.push(Run::Single(&fields[i]));
            i += 1;
        }
    }
    runs
}

/// Emit one coalesced `g_string_append_printf` call covering every field
/// in `fields`, joined by `", "`. Only the first field's annotation
/// prefix, if any, is gated on `annotate_expr`; every other field in the
/// run is never annotated (matching the array/dict "index 0 only" rule
/// applied to struct-field runs).
fn emit_printf_run(
    body: &mut PrettyWriter,
    names: &Names,
    ty: &TypeNode,
    fields: &[&Field],
    value_expr: &str,
    annotate_expr: &str,
) {
    for field in fields {
        body.writeln(format!(
            "{} {}_v = {}({});",
            names.c_type(&field.ty),
            field.name,
            names.fn_name(ty, &format!("get_{}", field.name)),
            value_expr
        ));
    }

    let mut format_pieces = Vec::new();
    let mut args = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let kind = match &field.ty.kind {
            TypeKind::Basic(kind) => *kind,
            _ => unreachable!("a printf run only ever contains basic fields"),
        };
        let row = kind.row();
        if index == 0 && !row.annotation_prefix.is_empty() {
            format_pieces.push(format!("%s{}", row.printf_format.unwrap()));
            args.push(format!(
                "({} ? \"{}\" : \"\")",
                annotate_expr, row.annotation_prefix
            ));
        } else {
            format_pieces.push(row.printf_format.unwrap().to_string());
        }
        args.push(format!("{}_v", field.name));
    }
    body.writeln(format!(
        "g_string_append_printf(sink, \"{}\", {});",
        format_pieces.join(", "),
        args.join(", ")
    ));
}
