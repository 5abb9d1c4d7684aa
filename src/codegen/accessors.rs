//! Emission of the per-type view struct and its zero-copy accessors,
//! following the contracts in `SPEC_FULL.md` §4.5 verbatim.
use crate::codegen::pretty::PrettyWriter;
use crate::codegen::Names;
use crate::model::{BasicKind, TypeKind, TypeNode};

/// Emit the `{ const void *base; size_t size; }` view struct and the
/// generic wrappers (`_typestring`, `_from_gvariant`, `_dup_to_gvariant`,
/// `_from_variant`) shared by every named type, then dispatch to the
/// per-kind body.
pub fn emit_named_type(w: &mut PrettyWriter, names: &Names, ty: &TypeNode) {
    let type_name = names.type_name(ty);
    let typestring = ty.typestring();

    w.eob();
    w.writeln(format!("/* {} : {} */", type_name, typestring));
    w.writeln("typedef struct {");
    let mut body = w.new_block();
    body.writeln("const void *base;");
    body.writeln("size_t size;");
    w.append_block(body);
    w.writeln(format!("}} {};", type_name));
    w.eob();

    w.writeln(format!(
        "static const char {}[] = \"{}\";",
        names.typestring_const(ty),
        typestring
    ));
    w.eob();

    emit_view_of(w, names, ty);
    emit_from_gvariant(w, names, ty);
    emit_dup_to_gvariant(w, names, ty);
    emit_from_variant(w, names, ty);

    match &ty.kind {
        TypeKind::Array(element) => emit_array(w, names, ty, element),
        TypeKind::Dict(key, value) => emit_dict(w, names, ty, *key, value),
        TypeKind::Maybe(inner) => emit_maybe(w, names, ty, inner),
        TypeKind::Struct(_) => emit_struct(w, names, ty),
        TypeKind::Variant => emit_variant(w, names, ty),
        TypeKind::Basic(_) => {}
    }
}

/// Wrap a raw `(base, size)` byte range already known to hold a value of
/// this type, with no GVariant framing of its own to peel off. Used by
/// nested accessors (array elements, struct fields, maybe contents) that
/// locate a child value's bytes directly rather than through a `GVariant *`.
fn emit_view_of(w: &mut PrettyWriter, names: &Names, ty: &TypeNode) {
    let type_name = names.type_name(ty);
    let fn_name = names.fn_name(ty, "view_of");
    w.writeln(format!(
        "static inline {} {}(const void *base, size_t size) {{",
        type_name, fn_name
    ));
    let mut body = w.new_block();
    body.writeln(format!(
        "return ({}){{ .base = base, .size = size }};",
        type_name
    ));
    w.append_block(body);
    w.writeln("}");
    w.eob();
}

fn emit_from_gvariant(w: &mut PrettyWriter, names: &Names, ty: &TypeNode) {
    let type_name = names.type_name(ty);
    let fn_name = names.fn_name(ty, "from_gvariant");
    w.writeln(format!(
        "static inline {} {}(GVariant *v) {{",
        type_name, fn_name
    ));
    let mut body = w.new_block();
    body.writeln(format!(
        "g_assert(g_variant_is_of_type(v, G_VARIANT_TYPE({})));",
        names.typestring_const(ty)
    ));
    body.writeln("gsize size = 0;");
    body.writeln("const void *base = g_variant_get_fixed_array(v, &size, 1);");
    body.writeln(format!(
        "return ({}){{ .base = base, .size = size }};",
        type_name
    ));
    w.append_block(body);
    w.writeln("}");
    w.eob();
}

fn emit_dup_to_gvariant(w: &mut PrettyWriter, names: &Names, ty: &TypeNode) {
    let type_name = names.type_name(ty);
    let fn_name = names.fn_name(ty, "dup_to_gvariant");
    w.writeln(format!(
        "static inline GVariant *{}({} v) {{",
        fn_name, type_name
    ));
    let mut body = w.new_block();
    body.writeln(format!(
        "return g_variant_new_from_data(G_VARIANT_TYPE({}), v.base, v.size, TRUE, NULL, NULL);",
        names.typestring_const(ty)
    ));
    w.append_block(body);
    w.writeln("}");
    w.eob();
}

fn emit_from_variant(w: &mut PrettyWriter, names: &Names, ty: &TypeNode) {
    let type_name = names.type_name(ty);
    let fn_name = names.fn_name(ty, "from_variant");
    w.writeln(format!(
        "static inline {} {}(GVariant *variant) {{",
        type_name, fn_name
    ));
    let mut body = w.new_block();
    body.writeln("g_assert(g_variant_is_of_type(variant, G_VARIANT_TYPE(\"v\")));");
    body.writeln("GVariant *inner = g_variant_get_variant(variant);");
    body.writeln(format!("{} result = {}(inner);", type_name, names.fn_name(ty, "from_gvariant")));
    body.writeln("g_variant_unref(inner);");
    body.writeln("return result;");
    w.append_block(body);
    w.writeln("}");
    w.eob();
}

/// `w(S)`, emitted as a small runtime helper since the containing
/// buffer's size is only known when the view is constructed, not at
/// generation time.
fn emit_offset_slot_width_call(size_expr: &str) -> String {
    format!("gvariant_codegen_offset_width({})", size_expr)
}

fn emit_array(w: &mut PrettyWriter, names: &Names, ty: &TypeNode, element: &crate::model::TypeRef) {
    let type_name = names.type_name(ty);
    let element_name = names.c_type(element);

    // length(v)
    w.writeln(format!(
        "static inline size_t {}({} v) {{",
        names.fn_name(ty, "get_length"),
        type_name
    ));
    let mut body = w.new_block();
    if let Some(fixed) = element.fixed_size() {
        body.writeln(format!("return v.size / {};", fixed));
    } else {
        body.writeln("if (v.size == 0) return 0;");
        body.writeln(format!("size_t width = {};", emit_offset_slot_width_call("v.size")));
        body.writeln("size_t end0 = read_offset(v.base, v.size - width, width);");
        body.writeln("return (v.size - end0) / width;");
    }
    w.append_block(body);
    w.writeln("}");
    w.eob();

    // get_at(v, index)
    w.writeln(format!(
        "static inline {} {}({} v, size_t index) {{",
        element_name,
        names.fn_name(ty, "get_at"),
        type_name
    ));
    let mut body = w.new_block();
    if let Some(fixed) = element.fixed_size() {
        body.writeln(format!(
            "const void *element_base = (const char *)v.base + index * {};",
            fixed
        ));
        emit_leaf_read(&mut body, names, element, "element_base", &format!("{}", fixed));
    } else {
        body.writeln(format!("size_t width = {};", emit_offset_slot_width_call("v.size")));
        body.writeln(format!(
            "size_t len = {}(v);",
            names.fn_name(ty, "get_length")
        ));
        body.writeln("size_t end = read_offset(v.base, v.size - width * (index + 1), width);");
        body.writeln(
            "size_t start = (index == 0) ? 0 : align_up(read_offset(v.base, v.size - width * index, width), 1);",
        );
        body.writeln("(void)len;");
        body.writeln("const void *element_base = (const char *)v.base + start;");
        emit_leaf_read(&mut body, names, element, "element_base", "end - start");
    }
    w.append_block(body);
    w.writeln("}");
    w.eob();
}

fn emit_dict(
    w: &mut PrettyWriter,
    names: &Names,
    ty: &TypeNode,
    key: BasicKind,
    value: &crate::model::TypeRef,
) {
    use crate::model::{compute_field_locations, compute_fixed_size, FieldShape};

    let type_name = names.type_name(ty);
    let key_c_type = if key.is_string_like() { "const gchar *" } else { key.row().c_type };
    let value_name = names.c_type(value);

    let key_shape = FieldShape {
        alignment: key.alignment(),
        is_fixed: key.is_fixed(),
        fixed_size: key.fixed_size(),
    };
    let value_shape = FieldShape {
        alignment: value.alignment(),
        is_fixed: value.is_fixed(),
        fixed_size: value.fixed_size().unwrap_or(0),
    };
    let entry_alignment = key.alignment().max(value.alignment());
    let entry_layout = compute_field_locations(&[key_shape, value_shape]);
    let key_loc = entry_layout.locations[0];
    let value_loc = entry_layout.locations[1];
    let entry_fixed_size = if entry_layout.is_fixed {
        Some(compute_fixed_size(&[key_shape, value_shape], entry_alignment))
    } else {
        None
    };

    w.writeln(format!(
        "static inline size_t {}({} v) {{",
        names.fn_name(ty, "get_length"),
        type_name
    ));
    let mut body = w.new_block();
    if let Some(entry_size) = entry_fixed_size {
        body.writeln(format!("return v.size / {};", entry_size));
    } else {
        body.writeln("if (v.size == 0) return 0;");
        body.writeln(format!("size_t width = {};", emit_offset_slot_width_call("v.size")));
        body.writeln("size_t end0 = read_offset(v.base, v.size - width, width);");
        body.writeln("return (v.size - end0) / width;");
    }
    w.append_block(body);
    w.writeln("}");
    w.eob();

    // The entry at `index`'s own byte range, the same way an array locates
    // a variable-size element: fixed-size entries sit at a flat stride,
    // variable-size entries are framed by the dict's own offset table.
    let entry_range_fn = names.fn_name(ty, "entry_range");
    w.writeln(format!(
        "static inline void {}({} v, size_t index, const void **out_base, size_t *out_size) {{",
        entry_range_fn, type_name
    ));
    let mut body = w.new_block();
    if let Some(entry_size) = entry_fixed_size {
        body.writeln(format!("*out_base = (const char *)v.base + index * {};", entry_size));
        body.writeln(format!("*out_size = {};", entry_size));
    } else {
        body.writeln(format!("size_t width = {};", emit_offset_slot_width_call("v.size")));
        body.writeln("size_t end = read_offset(v.base, v.size - width * (index + 1), width);");
        body.writeln(
            "size_t start = (index == 0) ? 0 : align_up(read_offset(v.base, v.size - width * index, width), 1);",
        );
        body.writeln("*out_base = (const char *)v.base + start;");
        body.writeln("*out_size = end - start;");
    }
    w.append_block(body);
    w.writeln("}");
    w.eob();

    let entry_key_fn = names.fn_name(ty, "entry_key");
    w.writeln(format!(
        "static inline {} {}({} v, size_t index) {{",
        key_c_type, entry_key_fn, type_name
    ));
    let mut body = w.new_block();
    body.writeln("const void *entry_base; size_t entry_size;");
    body.writeln(format!("{}(v, index, &entry_base, &entry_size);", entry_range_fn));
    emit_field_read(&mut body, names, "entry_size", "entry_base", key_loc, &key_as_typeref(key), false, 0);
    w.append_block(body);
    w.writeln("}");
    w.eob();

    let entry_value_fn = names.fn_name(ty, "entry_value");
    w.writeln(format!(
        "static inline {} {}({} v, size_t index) {{",
        value_name, entry_value_fn, type_name
    ));
    let mut body = w.new_block();
    body.writeln("const void *entry_base; size_t entry_size;");
    body.writeln(format!("{}(v, index, &entry_base, &entry_size);", entry_range_fn));
    emit_field_read(
        &mut body,
        names,
        "entry_size",
        "entry_base",
        value_loc,
        value,
        true,
        entry_layout.framing_offset_count,
    );
    w.append_block(body);
    w.writeln("}");
    w.eob();

    w.writeln(format!(
        "static inline gboolean {}({} v, {} key, {} *out) {{",
        names.fn_name(ty, "lookup"),
        type_name,
        key_c_type,
        value_name
    ));
    let mut body = w.new_block();
    body.writeln(format!(
        "size_t len = {}(v);",
        names.fn_name(ty, "get_length")
    ));
    body.writeln("for (size_t i = 0; i < len; i++) {");
    let mut loop_body = body.new_block();
    if key.is_string_like() {
        loop_body.writeln(format!("if (strcmp({}(v, i), key) == 0) {{", entry_key_fn));
    } else {
        loop_body.writeln(format!("if ({}(v, i) == key) {{", entry_key_fn));
    }
    let mut match_body = loop_body.new_block();
    match_body.writeln(format!("*out = {}(v, i);", entry_value_fn));
    match_body.writeln("return TRUE;");
    loop_body.append_block(match_body);
    loop_body.writeln("}");
    body.append_block(loop_body);
    body.writeln("}");
    body.writeln("return FALSE;");
    w.append_block(body);
    w.writeln("}");
    w.eob();
}

/// A dict key is always a [`BasicKind`]; wrap it as a throwaway
/// [`crate::model::TypeRef`] so it can flow through [`emit_field_read`]
/// and [`emit_leaf_read`] alongside the value's real `TypeRef`.
fn key_as_typeref(key: BasicKind) -> crate::model::TypeRef {
    crate::model::TypeNode::basic(key)
}

fn emit_maybe(w: &mut PrettyWriter, names: &Names, ty: &TypeNode, inner: &crate::model::TypeRef) {
    let type_name = names.type_name(ty);
    let inner_name = names.c_type(inner);

    w.writeln(format!(
        "static inline gboolean {}({} v) {{",
        names.fn_name(ty, "has_value"),
        type_name
    ));
    let mut body = w.new_block();
    body.writeln("return v.size != 0;");
    w.append_block(body);
    w.writeln("}");
    w.eob();

    w.writeln(format!(
        "static inline {} {}({} v) {{",
        inner_name,
        names.fn_name(ty, "get_value"),
        type_name
    ));
    let mut body = w.new_block();
    body.writeln(format!(
        "g_assert({}(v));",
        names.fn_name(ty, "has_value")
    ));
    match &inner.kind {
        TypeKind::Basic(kind) => emit_maybe_basic_get_value(&mut body, *kind),
        _ if inner.is_fixed() => {
            body.writeln(format!(
                "return {}(v.base, v.size);",
                names.fn_name(inner, "view_of")
            ));
        }
        _ => {
            body.writeln(format!(
                "return {}(v.base, v.size - 1);",
                names.fn_name(inner, "view_of")
            ));
        }
    }
    w.append_block(body);
    w.writeln("}");
    w.eob();
}

/// The Basic-type dispatch for `Maybe::get_value`. Every basic kind is
/// handled on its own terms, including `double` — a variant that
/// forwards `double` into the `string` arm (or otherwise skips it) reads
/// back the wrong bytes as a pointer instead of eight bytes as a float.
fn emit_maybe_basic_get_value(body: &mut PrettyWriter, kind: BasicKind) {
    let row = kind.row();
    if kind.is_string_like() {
        body.writeln("return (const gchar *)v.base;");
    } else {
        body.writeln(format!("return *({} *)v.base;", row.c_type));
    }
}

fn emit_struct(w: &mut PrettyWriter, names: &Names, ty: &TypeNode) {
    let type_name = names.type_name(ty);
    let s = ty.as_struct().expect("emit_struct called on a non-struct");

    for field in &s.fields {
        let field_c_type = names.c_type(&field.ty);
        let fn_name = names.fn_name(ty, &format!("get_{}", field.name));
        w.writeln(format!(
            "static inline {} {}({} v) {{",
            field_c_type, fn_name, type_name
        ));
        let mut body = w.new_block();
        emit_struct_field_body(&mut body, names, s, field);
        w.append_block(body);
        w.writeln("}");
        w.eob();
    }
}

fn emit_struct_field_body(
    body: &mut PrettyWriter,
    names: &Names,
    s: &crate::model::StructType,
    field: &crate::model::Field,
) {
    let loc = field.location;
    body.writeln(format!(
        "/* location descriptor (i={}, a={}, b={}, c={}) */",
        loc.frame_index, loc.a, loc.b, loc.c
    ));
    emit_field_read(
        body,
        names,
        "v.size",
        "v.base",
        loc,
        &field.ty,
        field.is_last,
        s.framing_offset_count(),
    );
}

/// Read one struct-field-shaped value out of a container described by
/// `container_size_expr`/`container_base_expr` (either the enclosing
/// struct's own `v.size`/`v.base`, or a dict entry's synthesized byte
/// range), given that field's `(i, a, b, c)` descriptor.
///
/// `width` is computed at most once per call: needed both to read the
/// frame-start offset (when `loc.frame_index >= 0`) and to read the
/// field's own end (when `field_ty` is variable-sized) — declaring it
/// twice in the same C scope would be a redefinition.
fn emit_field_read(
    body: &mut PrettyWriter,
    names: &Names,
    container_size_expr: &str,
    container_base_expr: &str,
    loc: crate::model::FieldLocation,
    field_ty: &crate::model::TypeRef,
    is_last: bool,
    framing_offset_count: usize,
) {
    let needs_width = loc.frame_index >= 0 || !field_ty.is_fixed();
    if needs_width {
        body.writeln(format!(
            "size_t width = {};",
            emit_offset_slot_width_call(container_size_expr)
        ));
    }
    if loc.frame_index < 0 {
        body.writeln("size_t end_of_frame = 0;");
    } else {
        // Framing offset slot `i` lives at `size - width * (i + 1)`,
        // counting from the tail in the reverse-field-order the format
        // writes them in.
        body.writeln(format!(
            "size_t end_of_frame = read_offset({}, {} - width * ({} + 1), width);",
            container_base_expr, container_size_expr, loc.frame_index
        ));
    }
    body.writeln(format!(
        "size_t field_offset = ((end_of_frame + {} + {}) & ~(size_t){}) + {};",
        loc.a, loc.b, loc.b, loc.c
    ));
    body.writeln(format!(
        "const void *field_base = (const char *){} + field_offset;",
        container_base_expr
    ));

    if field_ty.is_fixed() {
        let fixed_size = field_ty.fixed_size().expect("is_fixed implies fixed_size is Some");
        emit_leaf_read(body, names, field_ty, "field_base", &fixed_size.to_string());
    } else {
        if is_last {
            body.writeln(format!(
                "size_t field_end = {} - width * {};",
                container_size_expr, framing_offset_count
            ));
        } else {
            body.writeln(format!(
                "size_t field_end = read_offset({}, {} - width * ({} + 2), width);",
                container_base_expr, container_size_expr, loc.frame_index
            ));
        }
        body.writeln("size_t field_size = field_end - field_offset;");
        emit_leaf_read(body, names, field_ty, "field_base", "field_size");
    }
}

/// Read/wrap the value at `base_expr` (with byte length `size_expr`,
/// meaningful only for non-fixed kinds) as the return value of a getter.
fn emit_leaf_read(
    body: &mut PrettyWriter,
    names: &Names,
    ty: &crate::model::TypeRef,
    base_expr: &str,
    size_expr: &str,
) {
    match &ty.kind {
        TypeKind::Basic(kind) if kind.is_string_like() => {
            body.writeln(format!("return (const gchar *){};", base_expr));
        }
        TypeKind::Basic(kind) => {
            body.writeln(format!("return *(const {} *){};", kind.row().c_type, base_expr));
        }
        _ => {
            body.writeln(format!(
                "return {}({}, {});",
                names.fn_name(ty, "view_of"),
                base_expr,
                size_expr
            ));
        }
    }
}

fn emit_variant(w: &mut PrettyWriter, names: &Names, ty: &TypeNode) {
    let type_name = names.type_name(ty);

    w.writeln(format!(
        "static inline const gchar *{}({} v) {{",
        names.fn_name(ty, "get_type_signature"),
        type_name
    ));
    let mut body = w.new_block();
    body.writeln("/* scan backwards for the zero byte separating child value from signature tail */");
    body.writeln("const char *bytes = (const char *)v.base;");
    body.writeln("size_t sep = v.size;");
    body.writeln("while (sep > 0 && bytes[sep - 1] != '\\0') sep--;");
    body.writeln("g_assert(sep > 0);");
    body.writeln("return bytes + sep;");
    w.append_block(body);
    w.writeln("}");
    w.eob();

    w.writeln(format!(
        "static inline GVariant *{}({} v) {{",
        names.fn_name(ty, "peek"),
        type_name
    ));
    let mut body = w.new_block();
    body.writeln("const char *bytes = (const char *)v.base;");
    body.writeln("size_t sep = v.size;");
    body.writeln("while (sep > 0 && bytes[sep - 1] != '\\0') sep--;");
    body.writeln("g_assert(sep > 0);");
    body.writeln(
        "return g_variant_new_from_data(G_VARIANT_TYPE(bytes + sep), v.base, sep - 1, TRUE, NULL, NULL);",
    );
    w.append_block(body);
    w.writeln("}");
    w.eob();
}
