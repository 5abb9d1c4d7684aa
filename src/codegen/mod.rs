//! Orchestrates emission: walks a resolved [`crate::model::TypeRegistry`]
//! in dependency order and threads the `--prefix` naming convention through
//! the accessor and formatter emitters.
mod accessors;
mod formatter;
mod pretty;

use std::collections::HashSet;

use crate::model::{TypeKind, TypeNode, TypeRef, TypeRegistry};
use crate::codegen::pretty::PrettyWriter;

/// Knobs threaded through emission that come from the command line rather
/// than the schema itself.
pub struct Options {
    /// `--prefix`: capitalized and prepended to every emitted type name;
    /// lower-cased, `_`-suffixed, and prepended to every emitted function
    /// name. Absent means no prefix either way.
    pub prefix: Option<String>,
    /// `--deep-variant-format`: selects which of the two emitted
    /// `SHALLOW_VARIANT_FORMAT` code paths is compiled by default.
    pub deep_variant_format: bool,
}

/// Resolves the type-name and function-name prefix conventions
/// (`SPEC_FULL.md` §6.1) for a single generation run.
pub struct Names {
    type_prefix: String,
    fn_prefix: String,
}

impl Names {
    pub fn new(prefix: Option<&str>) -> Names {
        match prefix {
            Some(p) if !p.is_empty() => Names {
                type_prefix: capitalize(p),
                fn_prefix: format!("{}_", p.to_lowercase()),
            },
            _ => Names {
                type_prefix: String::new(),
                fn_prefix: String::new(),
            },
        }
    }

    /// The emitted `T` identifier (the view struct's typedef name).
    pub fn type_name(&self, ty: &TypeNode) -> String {
        let base = ty
            .typename()
            .expect("emit_named_type called on a type with no typename");
        format!("{}{}", self.type_prefix, base)
    }

    /// The C type used to hold a value of `ty`: its raw `c_type` for a
    /// basic kind, or its view-struct typedef name otherwise.
    pub fn c_type(&self, ty: &TypeNode) -> String {
        match &ty.kind {
            TypeKind::Basic(kind) => kind.row().c_type.to_string(),
            _ => self.type_name(ty),
        }
    }

    /// An emitted function name, e.g. `T_get_FIELD` with the configured
    /// prefix applied.
    pub fn fn_name(&self, ty: &TypeNode, suffix: &str) -> String {
        format!("{}{}_{}", self.fn_prefix, self.type_name(ty), suffix)
    }

    /// The name of the `static const char[]` holding `ty`'s typestring.
    pub fn typestring_const(&self, ty: &TypeNode) -> String {
        format!("{}_typestring", self.type_name(ty))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Every type that must get its own emitted view struct and accessors:
/// every node reachable from a top-level declaration that carries a
/// typename (top-level declarations themselves, struct fields named
/// `S__f`, array elements named `A__element`, canonicalized anonymous
/// composites, ...), deduplicated by node identity and ordered so a
/// child is always emitted before anything that references it.
fn collect_named_types(registry: &TypeRegistry) -> Vec<TypeRef> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (_, ty) in registry.declarations() {
        walk(ty, &mut seen, &mut out);
    }
    out
}

fn walk(ty: &TypeRef, seen: &mut HashSet<*const TypeNode>, out: &mut Vec<TypeRef>) {
    let ptr = std::rc::Rc::as_ptr(ty);
    if seen.contains(&ptr) {
        return;
    }
    match &ty.kind {
        // A basic kind never gets its own view struct: every accessor
        // that touches one reads or returns its raw C type directly.
        TypeKind::Basic(_) => return,
        TypeKind::Variant => {}
        TypeKind::Array(element) => walk(element, seen, out),
        TypeKind::Dict(_, value) => walk(value, seen, out),
        TypeKind::Maybe(inner) => walk(inner, seen, out),
        TypeKind::Struct(s) => {
            for field in &s.fields {
                walk(&field.ty, seen, out);
            }
        }
    }
    if ty.typename().is_some() && seen.insert(ptr) {
        out.push(ty.clone());
    }
}

const PRELUDE: &str = r#"#include <assert.h>
#include <glib.h>
#include <stdbool.h>
#include <stdint.h>
#include <stdio.h>
#include <string.h>

/* gvariant-codegen: generated accessors. Do not edit by hand. */

static inline size_t gvariant_codegen_offset_width(size_t container_size) {
    if (container_size == 0) return 1;
    if (container_size <= 0xFF) return 1;
    if (container_size <= 0xFFFF) return 2;
    if (container_size <= 0xFFFFFFFFu) return 4;
    return 8;
}

static inline size_t read_offset(const void *base, size_t byte_offset, size_t width) {
    const unsigned char *p = (const unsigned char *)base + byte_offset;
    size_t value = 0;
    for (size_t i = 0; i < width; i++) {
        value |= ((size_t)p[i]) << (8 * i);
    }
    return value;
}

static inline size_t align_up(size_t value, size_t alignment) {
    return (value + alignment - 1) & ~(alignment - 1);
}
"#;

/// Emit a complete C source file for every named type reachable from
/// `registry`'s top-level declarations, in dependency order.
pub fn generate(registry: &TypeRegistry, options: &Options) -> String {
    let names = Names::new(options.prefix.as_deref());
    let mut w = PrettyWriter::new();
    w.writeln_block(PRELUDE);
    w.eob();
    w.writeln(format!(
        "#define SHALLOW_VARIANT_FORMAT {}",
        if options.deep_variant_format { 0 } else { 1 }
    ));
    w.eob();

    for ty in collect_named_types(registry) {
        accessors::emit_named_type(&mut w, &names, &ty);
        formatter::emit_formatters(&mut w, &names, &ty, options.deep_variant_format);
    }

    w.finish()
}
