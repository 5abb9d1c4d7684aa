//! End-to-end checks over the whole pipeline: schema text in, generated C
//! source out. These assert on the shape of the emitted C (type names,
//! function names, the presence of the right control structures) rather
//! than compiling it — pulled from the six worked examples.
use gvariant_codegen::codegen::{generate, Options};
use gvariant_codegen::compile_schema;

fn generate_schema(src: &str) -> String {
    let registry = compile_schema(src).expect("schema should resolve");
    generate(
        &registry,
        &Options {
            prefix: None,
            deep_variant_format: false,
        },
    )
}

#[test]
fn unit_struct_gets_a_fixed_one_byte_view_with_no_fields() {
    let out = generate_schema("type Foo {};\n");
    assert!(out.contains("/* Foo : () */"));
    assert!(out.contains("Foo_view_of(const void *base, size_t size)"));
    assert!(out.contains("Foo_from_gvariant(GVariant *v)"));
    // no per-field getters: there are no fields to emit one for
    assert!(!out.contains("Foo_get_"));
}

#[test]
fn pair_struct_emits_both_field_getters_with_fixed_offsets() {
    let out = generate_schema("type Pair { a: int32; b: byte; };\n");
    assert!(out.contains("/* Pair : (iy) */"));
    assert!(out.contains("static inline gint32 Pair_get_a(Pair v)"));
    assert!(out.contains("static inline guint8 Pair_get_b(Pair v)"));
    // both fields are fixed: no offset-table read for either
    assert!(!out.contains("read_offset(v.base, v.size"));
}

#[test]
fn names_array_emits_length_and_indexed_string_accessors() {
    let out = generate_schema("type Names []string;\n");
    assert!(out.contains("/* Names : as */"));
    assert!(out.contains("static inline size_t Names_get_length(Names v)"));
    assert!(out.contains("static inline const gchar * Names_get_at(Names v, size_t index)"));
}

#[test]
fn maybe_string_emits_has_value_and_get_value() {
    let out = generate_schema("type M ?string;\n");
    assert!(out.contains("/* M : ms */"));
    assert!(out.contains("static inline gboolean M_has_value(M v)"));
    assert!(out.contains("static inline const gchar * M_get_value(M v)"));
    assert!(out.contains("return (const gchar *)v.base;"));
}

#[test]
fn string_int32_dict_emits_lookup_and_entry_accessors() {
    let out = generate_schema("type D [string]int32;\n");
    assert!(out.contains("/* D : a{si} */"));
    assert!(out.contains("static inline gboolean D_lookup(D v, const gchar * key, gint32 *out)"));
    assert!(out.contains("D_entry_key"));
    assert!(out.contains("D_entry_value"));
    assert!(out.contains("strcmp(D_entry_key(v, i), key)"));
}

#[test]
fn mixed_struct_has_one_framing_offset_for_two_variable_fields() {
    let out = generate_schema("type Mixed { tag: byte; name: string; vals: []int32; };\n");
    assert!(out.contains("/* Mixed : (ysai) */"));
    assert!(out.contains("static inline guint8 Mixed_get_tag(Mixed v)"));
    assert!(out.contains("static inline const gchar * Mixed_get_name(Mixed v)"));
    // `vals` is an anonymous `[]int32` field with no enclosing name to
    // propagate from, so it's canonicalized to the shared `Arrayofint32`
    // view rather than a `Mixed__vals` one.
    assert!(out.contains("static inline Arrayofint32 Mixed_get_vals(Mixed v)"));
    // `name` is a variable field that isn't the struct's last field, so it
    // gets a framing-offset read (folding to slot 0); `vals`, the last
    // field, is recovered directly from the single framing-offset count
    // instead.
    assert!(out.contains("read_offset(v.base, v.size - width * (-1 + 2), width)"));
    assert!(out.contains("v.size - width * 1"));
}

#[test]
fn prefix_option_renames_both_types_and_functions() {
    let registry = compile_schema("type Pair { a: int32; b: byte; };\n").unwrap();
    let out = generate(
        &registry,
        &Options {
            prefix: Some("demo".to_string()),
            deep_variant_format: false,
        },
    );
    assert!(out.contains("/* DemoPair : (iy) */"));
    assert!(out.contains("demo_DemoPair_get_a"));
    assert!(out.contains("demo_DemoPair_get_b"));
}

#[test]
fn deep_variant_format_flips_the_compile_time_switch() {
    let registry = compile_schema("type V variant;\n").unwrap();
    let shallow = generate(
        &registry,
        &Options {
            prefix: None,
            deep_variant_format: false,
        },
    );
    let deep = generate(
        &registry,
        &Options {
            prefix: None,
            deep_variant_format: true,
        },
    );
    assert!(shallow.contains("#define SHALLOW_VARIANT_FORMAT 1"));
    assert!(deep.contains("#define SHALLOW_VARIANT_FORMAT 0"));
    // both branches are always emitted regardless of which one is selected
    assert!(shallow.contains("#else"));
    assert!(shallow.contains("format_variant_deep"));
}

#[test]
fn repeated_anonymous_array_shape_is_emitted_once() {
    let out = generate_schema("type Twins { left: []int32; right: []int32; };\n");
    // both fields share the canonicalized Arrayofint32 type: its view
    // struct typedef should appear exactly once, not once per field.
    let occurrences = out.matches("/* Arrayofint32 : ai */").count();
    assert_eq!(occurrences, 1);
    assert!(out.contains("static inline Arrayofint32 Twins_get_left(Twins v)"));
    assert!(out.contains("static inline Arrayofint32 Twins_get_right(Twins v)"));
}

#[test]
fn unresolved_forward_reference_is_reported_as_a_schema_error() {
    let err = compile_schema("type A B;\ntype B {};\n").unwrap_err();
    assert!(matches!(
        err,
        gvariant_codegen::SchemaError::UnknownNamedType { .. }
    ));
}

#[test]
fn duplicate_top_level_declaration_is_reported_as_a_schema_error() {
    let err = compile_schema("type A {};\ntype A {};\n").unwrap_err();
    assert!(matches!(
        err,
        gvariant_codegen::SchemaError::DuplicateType { .. }
    ));
}
